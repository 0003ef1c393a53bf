use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;

use crate::error_codes::CodedError;

pub const DEFAULT_BLOCK_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TerminalSize {
    pub rows: u16,
    pub columns: u16,
}

pub fn block_ratio_is_valid(block_ratio: f64) -> bool {
    block_ratio.is_finite() && block_ratio > 0.0
}

pub fn invalid_block_ratio(block_ratio: f64) -> CodedError {
    CodedError::usage(
        "INVALID_BLOCK_RATIO",
        format!("--block-ratio must be a positive number, got {block_ratio}"),
    )
    .with_details(json!({ "provided": block_ratio }))
}

impl TerminalSize {
    pub fn new(rows: u16, columns: u16) -> Self {
        Self { rows, columns }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryOptions {
    /// Height / width of one terminal cell.
    pub block_ratio: f64,
    /// Leave the last terminal row free for the cursor.
    pub reserve_bottom_row: bool,
    /// Fill the rows above the image with blank lines.
    pub top_padding: bool,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            block_ratio: DEFAULT_BLOCK_RATIO,
            reserve_bottom_row: true,
            top_padding: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayGeometry {
    pub rows: u32,
    pub columns: u32,
    pub top_pad_rows: u32,
}

impl DisplayGeometry {
    pub fn total_rows(&self) -> u32 {
        self.top_pad_rows + self.rows
    }
}

/// Fits an image into the terminal, correcting for non-square cells.
///
/// The image is first scaled down to the usable row count; if that overflows
/// the column budget it is scaled to the column count instead, and if the rows
/// then overflow again both axes are shrunk uniformly. Scale factors are
/// applied as `value * target / source` so exact fits stay exact before
/// flooring.
pub fn plan_display_geometry(
    image_width: u32,
    image_height: u32,
    terminal: TerminalSize,
    options: GeometryOptions,
) -> Result<DisplayGeometry> {
    if !block_ratio_is_valid(options.block_ratio) {
        return Err(anyhow!(invalid_block_ratio(options.block_ratio)));
    }
    if image_width == 0 || image_height == 0 {
        return Err(anyhow!(CodedError::geometry(
            "EMPTY_IMAGE",
            format!("image size {image_width}x{image_height} has no pixels"),
        )));
    }

    let reserved = u32::from(options.reserve_bottom_row);
    let usable_rows = u32::from(terminal.rows).saturating_sub(reserved);
    let term_cols = u32::from(terminal.columns);
    if usable_rows == 0 || term_cols == 0 {
        return Err(anyhow!(CodedError::geometry(
            "TERMINAL_TOO_SMALL",
            format!(
                "terminal {}x{} leaves no room to draw",
                terminal.columns, terminal.rows
            ),
        )
        .with_details(json!({ "terminal": terminal }))));
    }

    let image_h = f64::from(image_height);
    let scaled_w = f64::from(image_width) * options.block_ratio;
    let usable = f64::from(usable_rows);
    let cols_cap = f64::from(term_cols);

    // height first
    let (mut rows, mut cols) = if image_h > usable {
        (usable, scaled_w * usable / image_h)
    } else {
        (image_h, scaled_w)
    };

    if cols > cols_cap {
        // width first
        (rows, cols) = if scaled_w > cols_cap {
            (image_h * cols_cap / scaled_w, cols_cap)
        } else {
            (image_h, scaled_w)
        };

        if rows > usable {
            cols = cols * usable / rows;
            rows = usable;
        }
    }

    let rows = (rows.floor() as u32).max(1);
    let columns = (cols.floor() as u32).max(1);
    if rows > usable_rows || columns > term_cols {
        return Err(anyhow!(CodedError::geometry(
            "GEOMETRY_INVARIANT",
            format!(
                "planned {columns}x{rows} exceeds usable terminal area {term_cols}x{usable_rows}"
            ),
        )
        .with_details(json!({
            "image": [image_width, image_height],
            "terminal": terminal,
            "planned": [columns, rows],
        }))));
    }

    let top_pad_rows = if options.top_padding {
        usable_rows - rows
    } else {
        0
    };

    Ok(DisplayGeometry {
        rows,
        columns,
        top_pad_rows,
    })
}
