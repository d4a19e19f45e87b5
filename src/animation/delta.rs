//! Keyframe/delta encoding of rendered frames.
//!
//! A delta payload is a little-endian `u32` change count followed by one
//! 8-byte record per changed cell, in row-major order:
//!
//! ```text
//! x: u16 | y: u16 | r | g | b | a
//! ```

use super::format::{ContainerError, FrameKind};
use crate::render::{FrameBuffer, Rgba};

/// Size of one changed-cell record in a delta payload.
pub const DELTA_RECORD_SIZE: usize = 8;

/// Decides which frames are stored in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyframePolicy {
    interval: u32,
}

impl Default for KeyframePolicy {
    fn default() -> Self {
        Self { interval: 10 }
    }
}

impl KeyframePolicy {
    /// An interval of 0 is treated as 1 (every frame full).
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[inline]
    pub fn is_keyframe(&self, frame_index: usize) -> bool {
        frame_index % self.interval as usize == 0
    }
}

/// One encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub kind: FrameKind,
    pub payload: Vec<u8>,
}

/// Encode `current` as a full snapshot or as a delta against `previous`.
///
/// Keyframes, and any frame without a predecessor, are stored in full.
pub fn encode_frame(
    previous: Option<&FrameBuffer>,
    current: &FrameBuffer,
    frame_index: usize,
    policy: KeyframePolicy,
) -> FrameRecord {
    match previous {
        Some(previous) if !policy.is_keyframe(frame_index) => FrameRecord {
            kind: FrameKind::Delta,
            payload: encode_delta(previous, current),
        },
        _ => FrameRecord {
            kind: FrameKind::Full,
            payload: current.as_bytes().to_vec(),
        },
    }
}

/// Encode every frame of a sequence in order.
pub fn encode_frames(frames: &[FrameBuffer], policy: KeyframePolicy) -> Vec<FrameRecord> {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| encode_frame(i.checked_sub(1).map(|p| &frames[p]), frame, i, policy))
        .collect()
}

/// Changed cells of `current` relative to `previous`.
pub fn encode_delta(previous: &FrameBuffer, current: &FrameBuffer) -> Vec<u8> {
    debug_assert_eq!(previous.width(), current.width());
    debug_assert_eq!(previous.height(), current.height());

    let width = current.width() as usize;
    let changed: Vec<(usize, Rgba)> = previous
        .cells()
        .iter()
        .zip(current.cells())
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(i, (_, after))| (i, *after))
        .collect();

    let mut payload = Vec::with_capacity(4 + changed.len() * DELTA_RECORD_SIZE);
    payload.extend_from_slice(&(changed.len() as u32).to_le_bytes());
    for (i, cell) in changed {
        payload.extend_from_slice(&((i % width) as u16).to_le_bytes());
        payload.extend_from_slice(&((i / width) as u16).to_le_bytes());
        payload.extend_from_slice(bytemuck::bytes_of(&cell));
    }
    payload
}

/// Number of changed cells recorded in a delta payload.
pub fn delta_change_count(payload: &[u8]) -> Option<u32> {
    let count: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(count))
}

/// Decode a full payload into a frame.
pub fn decode_full(
    payload: &[u8],
    width: u32,
    height: u32,
    frame: usize,
) -> Result<FrameBuffer, ContainerError> {
    let expected = width as usize * height as usize * 4;
    if payload.len() != expected {
        return Err(ContainerError::MalformedPayload {
            frame,
            reason: format!("full frame is {} bytes, expected {}", payload.len(), expected),
        });
    }
    let cells: Vec<Rgba> = bytemuck::cast_slice(payload).to_vec();
    FrameBuffer::from_cells(width, height, cells).ok_or_else(|| ContainerError::MalformedPayload {
        frame,
        reason: "cell count mismatch".to_string(),
    })
}

/// Apply a delta payload on top of the previous frame, in place.
pub fn apply_delta(
    buffer: &mut FrameBuffer,
    payload: &[u8],
    frame: usize,
) -> Result<(), ContainerError> {
    let malformed = |reason: String| ContainerError::MalformedPayload { frame, reason };

    let count = delta_change_count(payload)
        .ok_or_else(|| malformed("delta payload shorter than its count".to_string()))?;
    let records = &payload[4..];
    if records.len() != count as usize * DELTA_RECORD_SIZE {
        return Err(malformed(format!(
            "{} changes need {} bytes, found {}",
            count,
            count as usize * DELTA_RECORD_SIZE,
            records.len()
        )));
    }

    let (width, height) = (buffer.width(), buffer.height());
    let cells = buffer.cells_mut();
    for record in records.chunks_exact(DELTA_RECORD_SIZE) {
        let x = u32::from(u16::from_le_bytes([record[0], record[1]]));
        let y = u32::from(u16::from_le_bytes([record[2], record[3]]));
        if x >= width || y >= height {
            return Err(malformed(format!("cell ({x}, {y}) outside {width}x{height}")));
        }
        cells[y as usize * width as usize + x as usize] =
            Rgba::new(record[4], record[5], record[6], record[7]);
    }
    Ok(())
}
