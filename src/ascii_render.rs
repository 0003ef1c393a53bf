use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

use crate::ascii_frame::CharFrame;
use crate::geometry::DisplayGeometry;
use crate::palette::GlyphPalette;

const BT709_R_WEIGHT: u32 = 2126;
const BT709_G_WEIGHT: u32 = 7152;
const BT709_B_WEIGHT: u32 = 722;
const BT709_WEIGHT_SUM: u32 = 10_000;
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0001_0000_01b3;

/// How the luma field is resampled to the display grid. One filter is used
/// for every frame of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResampleFilter {
    /// Linear (triangle) filter, blending the source block under each cell.
    #[default]
    Area,
    /// Source pixel under each cell center.
    Nearest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterOptions {
    pub palette: GlyphPalette,
    pub filter: ResampleFilter,
}

fn bt709_luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let weighted = BT709_R_WEIGHT * u32::from(r)
        + BT709_G_WEIGHT * u32::from(g)
        + BT709_B_WEIGHT * u32::from(b);
    ((weighted + (BT709_WEIGHT_SUM / 2)) / BT709_WEIGHT_SUM) as u8
}

/// BT.709 luma of every pixel, alpha ignored.
pub fn luma_image(frame: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b, _] = frame.get_pixel(x, y).0;
        Luma([bt709_luma_u8(r, g, b)])
    })
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            Self::Area => FilterType::Triangle,
            Self::Nearest => FilterType::Nearest,
        }
    }
}

pub fn resample_luma(
    luma: &GrayImage,
    columns: u32,
    rows: u32,
    filter: ResampleFilter,
) -> GrayImage {
    imageops::resize(luma, columns, rows, filter.filter_type())
}

/// Renders one composited frame as glyphs for the given geometry.
pub fn rasterize(
    frame: &RgbaImage,
    geometry: &DisplayGeometry,
    options: RasterOptions,
) -> CharFrame {
    let columns = geometry.columns as usize;
    let pad_rows = geometry.top_pad_rows as usize;
    if geometry.columns == 0 || geometry.rows == 0 || frame.width() == 0 || frame.height() == 0 {
        return CharFrame::blank(columns, pad_rows + geometry.rows as usize);
    }

    let grid = resample_luma(
        &luma_image(frame),
        geometry.columns,
        geometry.rows,
        options.filter,
    );
    let lines = grid
        .rows()
        .map(|cells| {
            cells
                .map(|cell| options.palette.glyph_for_luma(cell.0[0]))
                .collect::<String>()
        })
        .collect();

    CharFrame::with_top_padding(pad_rows, lines, columns)
}

/// Renders every frame under one geometry, producing a complete cache.
pub fn rasterize_all(
    frames: &[RgbaImage],
    geometry: &DisplayGeometry,
    options: RasterOptions,
) -> Vec<CharFrame> {
    frames
        .iter()
        .map(|frame| rasterize(frame, geometry, options))
        .collect()
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn frame_hash(frame: &CharFrame) -> u64 {
    fnv1a64(frame.to_text().as_bytes())
}

pub fn sequence_hash(frames: &[CharFrame]) -> u64 {
    let mut sequence_bytes = Vec::with_capacity(frames.len() * 8);
    for frame in frames {
        sequence_bytes.extend_from_slice(&frame_hash(frame).to_le_bytes());
    }
    fnv1a64(&sequence_bytes)
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    use super::{
        bt709_luma_u8, frame_hash, luma_image, rasterize, rasterize_all, resample_luma,
        sequence_hash, RasterOptions, ResampleFilter,
    };
    use crate::geometry::DisplayGeometry;
    use crate::palette::GlyphPalette;

    fn geometry(columns: u32, rows: u32, top_pad_rows: u32) -> DisplayGeometry {
        DisplayGeometry {
            rows,
            columns,
            top_pad_rows,
        }
    }

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 37 + y * 91) % 256) as u8;
            Rgba([v, v.wrapping_mul(3), 255 - v, 255])
        })
    }

    #[test]
    fn luma_weights_hit_both_ends() {
        assert_eq!(bt709_luma_u8(0, 0, 0), 0);
        assert_eq!(bt709_luma_u8(255, 255, 255), 255);
        assert_eq!(bt709_luma_u8(0, 255, 0), 182);
    }

    #[test]
    fn black_and_white_frames_map_to_ramp_ends() {
        let black = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let white = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let options = RasterOptions {
            palette: GlyphPalette::Ramp16,
            filter: ResampleFilter::Area,
        };
        let frames = rasterize_all(&[black, white], &geometry(4, 4, 0), options);

        let glyphs = GlyphPalette::Ramp16.glyphs();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].glyphs().eq(std::iter::repeat(glyphs[0]).take(16)));
        assert!(frames[1].glyphs().eq(std::iter::repeat(glyphs[15]).take(16)));
    }

    #[test]
    fn rasterize_is_deterministic() {
        let frame = gradient(37, 23);
        let geometry = geometry(19, 7, 3);
        for filter in [ResampleFilter::Area, ResampleFilter::Nearest] {
            let options = RasterOptions {
                palette: GlyphPalette::Ramp16,
                filter,
            };
            let first = rasterize(&frame, &geometry, options);
            let second = rasterize(&frame, &geometry, options);
            assert_eq!(first, second);
            assert_eq!(first.to_text().as_bytes(), second.to_text().as_bytes());
            assert_eq!(frame_hash(&first), frame_hash(&second));
        }
    }

    #[test]
    fn output_rows_have_exact_width_and_padding() {
        let frame = gradient(10, 10);
        let rendered = rasterize(&frame, &geometry(13, 5, 4), RasterOptions::default());
        assert_eq!(rendered.height(), 9);
        assert_eq!(rendered.width(), 13);
        for (index, line) in rendered.lines().iter().enumerate() {
            assert_eq!(line.chars().count(), 13, "row {index} width");
            if index < 4 {
                assert!(line.chars().all(|c| c == ' '), "pad row {index} must be blank");
            }
        }
    }

    fn field(width: u32, values: &[u8]) -> GrayImage {
        GrayImage::from_raw(width, values.len() as u32 / width, values.to_vec())
            .expect("field dimensions")
    }

    #[test]
    fn luma_image_keeps_frame_dimensions() {
        let luma = luma_image(&gradient(7, 3));
        assert_eq!(luma.dimensions(), (7, 3));
        let white = luma_image(&RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 0])));
        assert!(white.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn uniform_fields_stay_uniform_under_both_filters() {
        let flat = GrayImage::from_pixel(9, 5, Luma([200]));
        for filter in [ResampleFilter::Area, ResampleFilter::Nearest] {
            for (columns, rows) in [(3, 2), (1, 1), (20, 11)] {
                let grid = resample_luma(&flat, columns, rows, filter);
                assert_eq!(grid.dimensions(), (columns, rows));
                assert!(grid.pixels().all(|p| p.0[0] == 200), "{filter:?} {columns}x{rows}");
            }
        }
    }

    #[test]
    fn area_filter_blends_a_step_edge() {
        let luma = field(4, &[0, 0, 200, 200, 0, 0, 200, 200]);
        let grid = resample_luma(&luma, 1, 1, ResampleFilter::Area);
        let value = grid.get_pixel(0, 0).0[0];
        assert!(value > 0 && value < 200, "blended value {value}");

        let grid = resample_luma(&luma, 2, 1, ResampleFilter::Area);
        assert!(grid.get_pixel(0, 0).0[0] < grid.get_pixel(1, 0).0[0]);
    }

    #[test]
    fn nearest_filter_only_emits_source_values() {
        let source = [10, 20, 30, 40, 50, 60];
        let luma = field(6, &source);
        for columns in [2, 4, 8, 12] {
            let grid = resample_luma(&luma, columns, 1, ResampleFilter::Nearest);
            assert!(grid.pixels().all(|p| source.contains(&p.0[0])), "{columns} columns");
        }
    }

    #[test]
    fn nearest_upsampling_repeats_source_pixels() {
        let luma = field(2, &[0, 255]);
        let grid = resample_luma(&luma, 4, 1, ResampleFilter::Nearest);
        assert_eq!(grid.into_raw(), vec![0, 0, 255, 255]);
    }

    #[test]
    fn equal_size_resample_is_identity() {
        let luma = luma_image(&gradient(6, 4));
        for filter in [ResampleFilter::Area, ResampleFilter::Nearest] {
            assert_eq!(resample_luma(&luma, 6, 4, filter), luma);
        }
    }

    #[test]
    fn zero_width_grid_renders_blank_rows() {
        let rendered = rasterize(&gradient(4, 4), &geometry(0, 3, 1), RasterOptions::default());
        assert_eq!(rendered.height(), 4);
        assert_eq!(rendered.width(), 0);
        assert!(rendered.lines().iter().all(String::is_empty));
    }

    #[test]
    fn sequence_hash_changes_with_frame_order() {
        let options = RasterOptions::default();
        let g = geometry(4, 2, 0);
        let a = rasterize(&RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])), &g, options);
        let b = rasterize(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])), &g, options);
        assert_ne!(
            sequence_hash(&[a.clone(), b.clone()]),
            sequence_hash(&[b, a])
        );
    }
}
