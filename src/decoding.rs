use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::ImageFormat;
use serde_json::json;

use crate::error_codes::CodedError;

/// GIF delays are stored in hundredths of a second.
const GIF_DELAY_UNIT_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalHint {
    Unspecified,
    Keep,
    Background,
    Previous,
}

impl From<gif::DisposalMethod> for DisposalHint {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Any => Self::Unspecified,
            gif::DisposalMethod::Keep => Self::Keep,
            gif::DisposalMethod::Background => Self::Background,
            gif::DisposalMethod::Previous => Self::Previous,
        }
    }
}

/// One decoded sub-frame. `rgba` holds `width * height` RGBA8 pixels for
/// the region starting at (`left`, `top`) on the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub disposal: DisposalHint,
    pub rgba: Vec<u8>,
}

impl RawFrame {
    pub fn covers_canvas(&self, canvas_width: u32, canvas_height: u32) -> bool {
        self.left == 0
            && self.top == 0
            && self.width == canvas_width
            && self.height == canvas_height
    }
}

#[derive(Debug, Clone)]
pub struct DecodedAnimation {
    pub format: ImageFormat,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub frames: Vec<RawFrame>,
    pub durations_ms: Vec<u64>,
}

pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat> {
    image::guess_format(bytes).map_err(|_| {
        anyhow!(CodedError::format(
            "UNKNOWN_FORMAT",
            "input file is not a recognized image format, not gif",
        ))
    })
}

pub fn load_animation(path: &Path) -> Result<DecodedAnimation> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    log::debug!("file {} loaded ({} bytes)", path.display(), bytes.len());
    decode_animation(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

pub fn decode_animation(bytes: &[u8]) -> Result<DecodedAnimation> {
    let format = sniff_format(bytes)?;
    if format != ImageFormat::Gif {
        log::debug!("file format is {format:?}");
        return Err(anyhow!(CodedError::format(
            "NOT_A_GIF",
            format!("input file is {} format, not gif", format_label(format)),
        )
        .with_details(json!({ "format": format_label(format) }))));
    }

    let frames = GifFrames::new(bytes)?;
    let (canvas_width, canvas_height) = frames.canvas_size();
    log::debug!("image size {canvas_width} * {canvas_height}");

    let mut raw_frames = Vec::new();
    let mut durations_ms = Vec::new();
    for next in frames {
        let (frame, duration_ms) = next?;
        raw_frames.push(frame);
        durations_ms.push(duration_ms);
    }
    log::debug!(
        "{} frames and {} durations decoded",
        raw_frames.len(),
        durations_ms.len()
    );

    Ok(DecodedAnimation {
        format,
        canvas_width,
        canvas_height,
        frames: raw_frames,
        durations_ms,
    })
}

/// Finite stream of GIF sub-frames paired with their display duration.
/// Yields `None` once the trailer is reached; a read failure is yielded once
/// and ends the stream.
pub struct GifFrames<R: Read> {
    decoder: gif::Decoder<R>,
    index: usize,
    exhausted: bool,
}

impl<R: Read> GifFrames<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let decoder = options.read_info(reader).map_err(|error| {
            anyhow!(CodedError::decode(
                "FRAME_DECODE_FAILED",
                format!("failed to read gif header: {error}"),
            ))
        })?;
        Ok(Self {
            decoder,
            index: 0,
            exhausted: false,
        })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (
            u32::from(self.decoder.width()),
            u32::from(self.decoder.height()),
        )
    }

    fn read_next(&mut self) -> Result<Option<(RawFrame, u64)>> {
        let index = self.index;
        let frame = self.decoder.read_next_frame().map_err(|error| {
            anyhow!(CodedError::decode(
                "FRAME_DECODE_FAILED",
                format!("failed to decode frame {index}: {error}"),
            )
            .with_details(json!({ "frame_index": index })))
        })?;
        let Some(frame) = frame else {
            return Ok(None);
        };

        let raw = RawFrame {
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            disposal: frame.dispose.into(),
            rgba: frame.buffer.to_vec(),
        };
        let duration_ms = u64::from(frame.delay) * GIF_DELAY_UNIT_MS;
        self.index += 1;
        Ok(Some((raw, duration_ms)))
    }
}

impl<R: Read> Iterator for GifFrames<R> {
    type Item = Result<(RawFrame, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(error) => {
                self.exhausted = true;
                Some(Err(error))
            }
        }
    }
}

fn format_label(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_else(|| format!("{format:?}").to_ascii_uppercase())
}
