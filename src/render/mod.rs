//! Render module - Color resolution and per-frame compositing.

mod color;
mod frame;

pub use color::{Rgba, resolve_color};
pub use frame::{FrameBuffer, RenderStats, render, render_with_stats};
