pub mod ascii_frame;
pub mod ascii_render;
pub mod compositor;
pub mod decoding;
pub mod error_codes;
pub mod geometry;
pub mod palette;
pub mod playback;
pub mod terminal;
