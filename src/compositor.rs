//! Frame assembly: turns decoded sub-frames into full-canvas frames.
//!
//! The whole animation is classified once. When every sub-frame covers the
//! canvas (`Full`) each frame is composited onto a fresh transparent canvas;
//! otherwise (`Partial`) each frame is composited onto a copy of the previous
//! result, so pixels outside the updated region carry forward.

use anyhow::{anyhow, Result};
use image::{imageops, ImageFormat, RgbaImage};
use serde_json::json;

use crate::decoding::{DecodedAnimation, DisposalHint, RawFrame};
use crate::error_codes::CodedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMode {
    Full,
    Partial,
}

impl DisposalMode {
    pub fn classify(frames: &[RawFrame], canvas_width: u32, canvas_height: u32) -> Self {
        if frames
            .iter()
            .all(|frame| frame.covers_canvas(canvas_width, canvas_height))
        {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// Composited frames and their durations, aligned by index.
#[derive(Debug, Clone)]
pub struct CompositedAnimation {
    canvas_width: u32,
    canvas_height: u32,
    mode: DisposalMode,
    frames: Vec<RgbaImage>,
    durations_ms: Vec<u64>,
}

impl CompositedAnimation {
    pub fn assemble(decoded: DecodedAnimation) -> Result<Self> {
        let DecodedAnimation {
            format,
            canvas_width,
            canvas_height,
            frames: raw_frames,
            mut durations_ms,
        } = decoded;

        if format != ImageFormat::Gif {
            return Err(anyhow!(CodedError::format(
                "NOT_A_GIF",
                format!("cannot assemble {format:?} frames, not gif"),
            )));
        }

        let mode = DisposalMode::classify(&raw_frames, canvas_width, canvas_height);
        log::debug!("disposal hints {:?}", distinct_hints(&raw_frames));
        let frames = assemble_frames(&raw_frames, canvas_width, canvas_height, mode)?;
        durations_ms.resize(frames.len(), 0);
        log::debug!(
            "{} frames composited in {:?} mode on a {}x{} canvas",
            frames.len(),
            mode,
            canvas_width,
            canvas_height
        );

        Ok(Self {
            canvas_width,
            canvas_height,
            mode,
            frames,
            durations_ms,
        })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn mode(&self) -> DisposalMode {
        self.mode
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn durations_ms(&self) -> &[u64] {
        &self.durations_ms
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn distinct_hints(raw_frames: &[RawFrame]) -> Vec<DisposalHint> {
    let mut hints = Vec::new();
    for frame in raw_frames {
        if !hints.contains(&frame.disposal) {
            hints.push(frame.disposal);
        }
    }
    hints
}

/// Composites `raw_frames` under an already classified `mode`.
pub fn assemble_frames(
    raw_frames: &[RawFrame],
    canvas_width: u32,
    canvas_height: u32,
    mode: DisposalMode,
) -> Result<Vec<RgbaImage>> {
    if raw_frames.is_empty() {
        return Err(anyhow!(CodedError::format(
            "EMPTY_ANIMATION",
            "animation contains no frames",
        )));
    }

    let mut composited = Vec::with_capacity(raw_frames.len());
    let mut last: Option<RgbaImage> = None;

    for (index, raw) in raw_frames.iter().enumerate() {
        let region = region_image(raw, index)?;
        let mut canvas = match (mode, last.take()) {
            (DisposalMode::Partial, Some(previous)) => previous,
            _ => RgbaImage::new(canvas_width, canvas_height),
        };
        imageops::overlay(&mut canvas, &region, i64::from(raw.left), i64::from(raw.top));
        composited.push(canvas.clone());
        last = Some(canvas);
    }

    Ok(composited)
}

fn region_image(raw: &RawFrame, index: usize) -> Result<RgbaImage> {
    let expected = (raw.width as usize)
        .checked_mul(raw.height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| anyhow!("frame {index}: region size overflow"))?;
    let actual = raw.rgba.len();

    RgbaImage::from_raw(raw.width, raw.height, raw.rgba.clone())
        .filter(|_| actual == expected)
        .ok_or_else(|| {
            anyhow!(CodedError::decode(
                "FRAME_BUFFER_MISMATCH",
                format!(
                    "frame {index}: pixel data has {actual} bytes, region {}x{} needs {expected}",
                    raw.width, raw.height
                ),
            )
            .with_details(json!({
                "frame_index": index,
                "expected_bytes": expected,
                "actual_bytes": actual,
            })))
        })
}
