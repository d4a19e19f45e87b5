//! Frame encoding, the HMICB container and its compressed form.
//!
//! # File Format
//!
//! The `.hmicb` container stores every rendered frame, either in full or
//! as a delta against the previous frame:
//!
//! ```text
//! Header (32 bytes):
//!   Magic: "HMICB" (5 bytes)
//!   Version: u8
//!   Width: u16
//!   Height: u16
//!   Fps: u16
//!   Frame count: u32
//!   Loop: u8
//!   Flags: u8 (bit 0: delta encoding)
//!   Reserved: 14 bytes
//!
//! Frame index table (frame_count * 9 bytes):
//!   Offset: u32 (absolute)
//!   Size: u32
//!   Kind: u8 (0 = full, 1 = delta)
//!
//! Frame data (variable):
//!   Full:  width * height * 4 bytes (r g b a, row-major)
//!   Delta: change count u32, then count * (x u16, y u16, r g b a)
//! ```
//!
//! All integers are little-endian. The `.hmicb7` form is the container
//! compressed as a single LZ4 block behind an 8-byte original-size prefix.

mod compress;
mod delta;
mod format;
mod player;
mod writer;

pub use compress::{
    CompressionError, Compressor, Lz4Compressor, SIZE_PREFIX_LEN, unwrap_compressed,
    wrap_compressed,
};
pub use delta::{
    DELTA_RECORD_SIZE, FrameRecord, KeyframePolicy, apply_delta, decode_full,
    delta_change_count, encode_delta, encode_frame, encode_frames,
};
pub use format::{
    CONTAINER_MAGIC, CONTAINER_VERSION, ContainerError, ContainerFlags, ContainerHeader,
    FrameIndex, FrameKind,
};
pub use player::{AnimationPlayer, Container, FrameIterator, deserialize};
pub use writer::{ContainerWriter, EncodeStats, serialize};
