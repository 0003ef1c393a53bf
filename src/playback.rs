//! Resize-aware playback loop.
//!
//! The scheduler owns the glyph cache for the current geometry. Before each
//! frame it polls the terminal size; a changed size sends it back through
//! `Rendering`, which rebuilds the whole cache and resumes at the frame that
//! was about to be printed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::ascii_frame::CharFrame;
use crate::ascii_render::{rasterize_all, sequence_hash, RasterOptions};
use crate::compositor::CompositedAnimation;
use crate::geometry::{plan_display_geometry, DisplayGeometry, GeometryOptions, TerminalSize};

pub trait TerminalIo {
    fn size(&mut self) -> Result<TerminalSize>;
    fn print_frame(&mut self, frame: &CharFrame) -> Result<()>;
}

pub trait FrameClock {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadClock;

impl FrameClock for ThreadClock {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackOptions {
    pub geometry: GeometryOptions,
    pub raster: RasterOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Rendering,
    Playing,
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    pub resume_index: usize,
    /// Size the current geometry was planned for.
    pub last_terminal_size: Option<TerminalSize>,
    /// Size observed by the probe that triggered `Rendering`.
    pub pending_size: Option<TerminalSize>,
    pub geometry: Option<DisplayGeometry>,
    pub cache: Vec<CharFrame>,
}

impl PlaybackState {
    fn idle() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            resume_index: 0,
            last_terminal_size: None,
            pending_size: None,
            geometry: None,
            cache: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub rebuilds: u64,
    pub frames_printed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    SizeProbed(TerminalSize),
    Rebuilt(DisplayGeometry),
    ResizeDetected { index: usize, size: TerminalSize },
    Printed { index: usize },
}

pub struct PlaybackScheduler<'a> {
    animation: &'a CompositedAnimation,
    options: PlaybackOptions,
    state: PlaybackState,
    stats: PlaybackStats,
}

impl<'a> PlaybackScheduler<'a> {
    pub fn new(animation: &'a CompositedAnimation, options: PlaybackOptions) -> Self {
        Self {
            animation,
            options,
            state: PlaybackState::idle(),
            stats: PlaybackStats::default(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    /// Steps until `cancel` is raised. The flag is checked between steps, so
    /// a pending sleep always completes first.
    pub fn run(
        &mut self,
        terminal: &mut dyn TerminalIo,
        clock: &mut dyn FrameClock,
        cancel: &AtomicBool,
    ) -> Result<PlaybackStats> {
        while !cancel.load(Ordering::SeqCst) {
            self.step(terminal, clock)?;
        }
        log::debug!(
            "playback stopped after {} frames and {} rebuilds",
            self.stats.frames_printed,
            self.stats.rebuilds
        );
        Ok(self.stats)
    }

    /// Performs exactly one state transition.
    pub fn step(
        &mut self,
        terminal: &mut dyn TerminalIo,
        clock: &mut dyn FrameClock,
    ) -> Result<StepOutcome> {
        match self.state.phase {
            PlaybackPhase::Idle => {
                let size = terminal.size()?;
                self.state.pending_size = Some(size);
                self.state.resume_index = 0;
                self.state.phase = PlaybackPhase::Rendering;
                Ok(StepOutcome::SizeProbed(size))
            }
            PlaybackPhase::Rendering => {
                let size = match self.state.pending_size.take() {
                    Some(size) => size,
                    None => terminal.size()?,
                };
                let geometry = self.rebuild(size)?;
                self.state.phase = PlaybackPhase::Playing;
                Ok(StepOutcome::Rebuilt(geometry))
            }
            PlaybackPhase::Playing => self.play_one(terminal, clock),
        }
    }

    fn play_one(
        &mut self,
        terminal: &mut dyn TerminalIo,
        clock: &mut dyn FrameClock,
    ) -> Result<StepOutcome> {
        let frame_count = self.state.cache.len();
        if self.state.resume_index >= frame_count {
            self.state.resume_index = 0;
        }
        let index = self.state.resume_index;

        let size = terminal.size()?;
        if self.state.last_terminal_size != Some(size) {
            log::debug!(
                "terminal resized to {}x{} before frame {index}",
                size.columns,
                size.rows
            );
            self.state.pending_size = Some(size);
            self.state.phase = PlaybackPhase::Rendering;
            return Ok(StepOutcome::ResizeDetected { index, size });
        }

        terminal.print_frame(&self.state.cache[index])?;
        self.stats.frames_printed += 1;
        clock.sleep(frame_delay(self.animation.durations_ms(), index));
        self.state.resume_index = if index + 1 >= frame_count { 0 } else { index + 1 };
        Ok(StepOutcome::Printed { index })
    }

    fn rebuild(&mut self, size: TerminalSize) -> Result<DisplayGeometry> {
        let (width, height) = self.animation.canvas_size();
        let geometry = plan_display_geometry(width, height, size, self.options.geometry)?;
        log::debug!(
            "display size {} * {} ({} top rows) for terminal {}x{}",
            geometry.columns,
            geometry.rows,
            geometry.top_pad_rows,
            size.columns,
            size.rows
        );

        let cache = rasterize_all(self.animation.frames(), &geometry, self.options.raster);
        log::debug!(
            "{} char frames prepared (sequence hash {:016x})",
            cache.len(),
            sequence_hash(&cache)
        );

        self.state.cache = cache;
        self.state.geometry = Some(geometry);
        self.state.last_terminal_size = Some(size);
        self.stats.rebuilds += 1;
        Ok(geometry)
    }
}

pub fn frame_delay(durations_ms: &[u64], index: usize) -> Duration {
    Duration::from_millis(durations_ms.get(index).copied().unwrap_or(0))
}
