use gic::ascii_render::{rasterize_all, sequence_hash, RasterOptions, ResampleFilter};
use gic::compositor::{CompositedAnimation, DisposalMode};
use gic::decoding::decode_animation;
use gic::geometry::{plan_display_geometry, DisplayGeometry, GeometryOptions, TerminalSize};
use gic::palette::GlyphPalette;

/// Each entry is `(left, top, width, height, rgba, delay_centis)`.
fn encode_gif(canvas: (u16, u16), frames: &[(u16, u16, u16, u16, [u8; 4], u16)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder =
            gif::Encoder::new(&mut bytes, canvas.0, canvas.1, &[]).expect("gif encoder");
        for &(left, top, width, height, color, delay) in frames {
            let mut pixels = color.repeat(usize::from(width) * usize::from(height));
            let mut frame = gif::Frame::from_rgba_speed(width, height, &mut pixels, 10);
            frame.left = left;
            frame.top = top;
            frame.delay = delay;
            encoder.write_frame(&frame).expect("gif frame");
        }
    }
    bytes
}

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[test]
fn black_then_white_full_animation_renders_ramp_ends() {
    let bytes = encode_gif((4, 4), &[(0, 0, 4, 4, BLACK, 10), (0, 0, 4, 4, WHITE, 20)]);
    let animation =
        CompositedAnimation::assemble(decode_animation(&bytes).expect("gif should decode"))
            .expect("animation should assemble");

    assert_eq!(animation.mode(), DisposalMode::Full);
    assert_eq!(animation.frame_count(), 2);
    assert_eq!(animation.durations_ms(), &[100, 200]);

    let geometry = DisplayGeometry {
        rows: 4,
        columns: 4,
        top_pad_rows: 0,
    };
    let palette = GlyphPalette::from_size(16).expect("16 glyphs are supported");
    let frames = rasterize_all(
        animation.frames(),
        &geometry,
        RasterOptions {
            palette,
            filter: ResampleFilter::Nearest,
        },
    );

    let glyphs = palette.glyphs();
    assert_eq!(frames[0].glyphs().collect::<Vec<_>>(), vec![glyphs[0]; 16]);
    assert_eq!(frames[1].glyphs().collect::<Vec<_>>(), vec![glyphs[15]; 16]);
}

#[test]
fn partial_animation_accumulates_updates() {
    let bytes = encode_gif(
        (4, 4),
        &[
            (0, 0, 4, 4, BLACK, 5),
            (0, 0, 2, 2, WHITE, 5),
            (2, 2, 2, 2, WHITE, 5),
        ],
    );
    let animation =
        CompositedAnimation::assemble(decode_animation(&bytes).expect("gif should decode"))
            .expect("animation should assemble");
    assert_eq!(animation.mode(), DisposalMode::Partial);
    assert_eq!(animation.frame_count(), 3);
    assert_eq!(animation.durations_ms().len(), 3);

    let geometry = DisplayGeometry {
        rows: 4,
        columns: 4,
        top_pad_rows: 0,
    };
    let frames = rasterize_all(animation.frames(), &geometry, RasterOptions::default());
    assert_eq!(frames[1].lines(), &["MM  ", "MM  ", "    ", "    "]);
    assert_eq!(frames[2].lines(), &["MM  ", "MM  ", "  MM", "  MM"]);
}

#[test]
fn cache_for_one_terminal_size_is_stable_across_runs() {
    let bytes = encode_gif(
        (40, 30),
        &[
            (0, 0, 40, 30, [30, 60, 90, 255], 4),
            (5, 5, 20, 10, [250, 200, 10, 255], 4),
            (10, 12, 25, 15, [120, 255, 120, 255], 4),
        ],
    );

    let hash_for = |terminal: TerminalSize| {
        let animation =
            CompositedAnimation::assemble(decode_animation(&bytes).expect("gif should decode"))
                .expect("animation should assemble");
        let (width, height) = animation.canvas_size();
        let geometry =
            plan_display_geometry(width, height, terminal, GeometryOptions::default())
                .expect("geometry should plan");
        sequence_hash(&rasterize_all(
            animation.frames(),
            &geometry,
            RasterOptions::default(),
        ))
    };

    let small = TerminalSize::new(20, 60);
    let large = TerminalSize::new(50, 200);
    assert_eq!(hash_for(small), hash_for(small));
    assert_eq!(hash_for(large), hash_for(large));
    assert_ne!(hash_for(small), hash_for(large));
}
