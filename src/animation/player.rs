//! Container reader and frame player.

use std::io::Cursor;

use super::delta::{FrameRecord, apply_delta, decode_full};
use super::format::{ContainerError, ContainerHeader, FrameIndex, FrameKind};
use crate::render::FrameBuffer;

/// A decoded container: header plus the raw, still-encoded frame payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub header: ContainerHeader,
    pub records: Vec<FrameRecord>,
}

/// Split container bytes into header and per-frame payloads.
///
/// Index offsets are trusted as written; each payload is only checked to
/// lie inside `bytes`. Payloads are not decoded.
pub fn deserialize(bytes: &[u8]) -> Result<Container, ContainerError> {
    let mut reader = Cursor::new(bytes);
    let header = ContainerHeader::read_from(&mut reader)?;

    let mut frame_indices = Vec::with_capacity(header.frame_count.min(1 << 20) as usize);
    for _ in 0..header.frame_count {
        frame_indices.push(FrameIndex::read_from(&mut reader)?);
    }

    let records = frame_indices
        .iter()
        .enumerate()
        .map(|(frame, index)| {
            let range = index.range();
            let payload = bytes
                .get(range.clone())
                .ok_or(ContainerError::Truncated {
                    frame,
                    end: range.end,
                    len: bytes.len(),
                })?;
            Ok(FrameRecord {
                kind: index.kind,
                payload: payload.to_vec(),
            })
        })
        .collect::<Result<Vec<_>, ContainerError>>()?;

    log::debug!(
        "read container: {}x{} @ {} fps, {} frames",
        header.width,
        header.height,
        header.fps,
        header.frame_count
    );

    Ok(Container { header, records })
}

/// Reconstructs frames from a decoded container.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::from_bytes(&bytes)?;
/// println!("Animation has {} frames", player.frame_count());
///
/// // Read specific frame
/// let frame = player.read_frame(12)?;
///
/// // Or iterate through all frames
/// for frame_result in player.frames() {
///     let frame = frame_result?;
///     // Use frame...
/// }
/// ```
pub struct AnimationPlayer {
    container: Container,
}

impl AnimationPlayer {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    /// Decode container bytes for playback.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        deserialize(bytes).map(Self::new)
    }

    /// Get container header.
    pub fn header(&self) -> &ContainerHeader {
        &self.container.header
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> usize {
        self.container.records.len()
    }

    /// Get canvas dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (
            u32::from(self.container.header.width),
            u32::from(self.container.header.height),
        )
    }

    pub fn fps(&self) -> u16 {
        self.container.header.fps
    }

    pub fn looping(&self) -> bool {
        self.container.header.looping
    }

    /// Get the encoded frame records.
    pub fn records(&self) -> &[FrameRecord] {
        &self.container.records
    }

    /// Nearest frame at or before `frame_index` stored in full.
    fn keyframe_before(&self, frame_index: usize) -> Result<usize, ContainerError> {
        self.container.records[..=frame_index]
            .iter()
            .rposition(|r| r.kind == FrameKind::Full)
            .ok_or(ContainerError::MissingKeyframe(frame_index))
    }

    /// Decode record `frame_index` on top of `previous`.
    fn decode_into(
        &self,
        previous: Option<FrameBuffer>,
        frame_index: usize,
    ) -> Result<FrameBuffer, ContainerError> {
        let (width, height) = self.dimensions();
        let record = &self.container.records[frame_index];
        match record.kind {
            FrameKind::Full => decode_full(&record.payload, width, height, frame_index),
            FrameKind::Delta => {
                let mut buffer = previous.ok_or(ContainerError::MissingKeyframe(frame_index))?;
                apply_delta(&mut buffer, &record.payload, frame_index)?;
                Ok(buffer)
            }
        }
    }

    /// Read a specific frame by index.
    ///
    /// Walks forward from the nearest preceding keyframe.
    pub fn read_frame(&self, frame_index: usize) -> Result<FrameBuffer, ContainerError> {
        if frame_index >= self.frame_count() {
            return Err(ContainerError::FrameOutOfRange {
                frame: frame_index,
                count: self.frame_count(),
            });
        }

        let keyframe = self.keyframe_before(frame_index)?;
        let mut frame = None;
        for i in keyframe..=frame_index {
            frame = Some(self.decode_into(frame, i)?);
        }
        frame.ok_or(ContainerError::MissingKeyframe(frame_index))
    }

    /// Create an iterator over all frames.
    pub fn frames(&self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
            previous: None,
        }
    }
}

/// Iterator over reconstructed frames, applying each delta once.
pub struct FrameIterator<'a> {
    player: &'a AnimationPlayer,
    current: usize,
    previous: Option<FrameBuffer>,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Result<FrameBuffer, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }

        let result = self.player.decode_into(self.previous.take(), self.current);
        if let Ok(frame) = &result {
            self.previous = Some(frame.clone());
        }
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.player.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIterator<'a> {}
