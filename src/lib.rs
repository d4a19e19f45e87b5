//! HMICB - Pixel-animation scripts to compact frame containers.
//!
//! This crate turns an HMIC script (a header block plus frame-ranged color
//! blocks listing pixels) into a sequence of RGBA frames, and packs them
//! into the HMICB container: a fixed header, a frame index, and per-frame
//! payloads stored either in full or as deltas against the previous frame.
//! The container can additionally be LZ4 compressed into an `.hmicb7`.
//!
//! # Architecture
//!
//! - `script`: Lexing of blocks, header and commands
//! - `render`: Color resolution, alpha compositing and frame rendering
//! - `schema`: Animation settings and encoder configuration
//! - `animation`: Delta encoding, container layout, playback, compression
//! - `convert`: The end-to-end pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use hmicb::{AnimationPlayer, EncoderConfig, convert_script};
//!
//! let script = "info { DISPLAY=2x2\nF=2 }\nF1-2 { #FF0000 { P=1x1,2x2 } }";
//! let conversion = convert_script(script, &EncoderConfig::default())?;
//! println!("{}", conversion.encode_stats);
//!
//! // Play it back
//! let player = AnimationPlayer::from_bytes(&conversion.container)?;
//! for frame in player.frames() {
//!     let frame = frame?;
//!     println!("{} painted cells", frame.painted_cells());
//! }
//! # Ok::<(), hmicb::Error>(())
//! ```

pub mod animation;
pub mod convert;
mod error;
pub mod render;
pub mod schema;
pub mod script;

// Re-export commonly used types
pub use animation::{AnimationPlayer, Container, ContainerHeader, deserialize, serialize};
pub use convert::{Conversion, convert_script, decode_script_input};
pub use error::{Error, Result};
pub use render::{FrameBuffer, Rgba, render};
pub use schema::{AnimationSettings, EncoderConfig, OutputFormat};
pub use script::{Script, parse};
