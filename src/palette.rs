use anyhow::{anyhow, Result};
use serde_json::json;

use crate::error_codes::CodedError;

pub const DEFAULT_PALETTE_SIZE: usize = 16;
pub const SUPPORTED_PALETTE_SIZES: [usize; 2] = [10, 16];

const GLYPHS_10: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const GLYPHS_16: [char; 16] = [
    ' ', ':', '-', '?', 'l', 'J', 'å', 'k', '9', '8', 'Ä', 'Ü', 'Ö', 'N', 'W', 'M',
];

/// Glyph ramps ordered from darkest to brightest, keyed by their length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlyphPalette {
    Ramp10,
    #[default]
    Ramp16,
}

impl GlyphPalette {
    pub fn from_size(size: usize) -> Result<Self> {
        match size {
            10 => Ok(Self::Ramp10),
            16 => Ok(Self::Ramp16),
            _ => Err(anyhow!(CodedError::unsupported_palette_size(format!(
                "palette size {size} is not supported (supported: {})",
                supported_sizes_label()
            ))
            .with_details(json!({
                "provided": size,
                "allowed": SUPPORTED_PALETTE_SIZES,
            })))),
        }
    }

    pub fn glyphs(self) -> &'static [char] {
        match self {
            Self::Ramp10 => &GLYPHS_10,
            Self::Ramp16 => &GLYPHS_16,
        }
    }

    pub fn len(self) -> usize {
        self.glyphs().len()
    }

    /// `floor(luma / (256 / len))`, written without the fractional divisor.
    pub fn level_for_luma(self, luma: u8) -> usize {
        let len = self.len();
        ((usize::from(luma) * len) / 256).min(len - 1)
    }

    pub fn glyph_for_luma(self, luma: u8) -> char {
        self.glyphs()[self.level_for_luma(luma)]
    }
}

fn supported_sizes_label() -> String {
    SUPPORTED_PALETTE_SIZES
        .iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
