//! Container writer with index backpatching.

use std::io::{Cursor, Seek, SeekFrom, Write};

use super::delta::{FrameRecord, KeyframePolicy, encode_frame};
use super::format::{ContainerError, ContainerHeader, FrameIndex, FrameKind};
use crate::render::FrameBuffer;

/// Writes a container frame by frame.
///
/// The index table is reserved with zeros when the writer is created, frame
/// payloads are appended in order, and `finalize` seeks back to fill in the
/// real offsets.
///
/// Usage:
/// ```ignore
/// let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), header, policy)?;
/// for frame in &frames {
///     writer.record_frame(frame)?;
/// }
/// let (cursor, stats) = writer.finalize()?;
/// ```
pub struct ContainerWriter<W: Write + Seek> {
    writer: W,
    header: ContainerHeader,
    policy: KeyframePolicy,
    /// Stream position of the container's first byte.
    start: u64,
    index_pos: u64,
    frame_indices: Vec<FrameIndex>,
    /// Last frame handed to `record_frame`, for delta encoding.
    previous: Option<FrameBuffer>,
    stats: EncodeStats,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Write the header and a zeroed index table for `header.frame_count`
    /// frames.
    pub fn new(
        mut writer: W,
        header: ContainerHeader,
        policy: KeyframePolicy,
    ) -> Result<Self, ContainerError> {
        let start = writer.stream_position()?;
        header.write_to(&mut writer)?;

        let index_pos = writer.stream_position()?;
        let placeholder = FrameIndex::default();
        for _ in 0..header.frame_count {
            placeholder.write_to(&mut writer)?;
        }

        let expected = start + header.data_start();
        let actual = writer.stream_position()?;
        if actual != expected {
            return Err(ContainerError::IndexMismatch { expected, actual });
        }
        log::trace!("frame data starts at byte {actual}");

        Ok(Self {
            writer,
            header,
            policy,
            start,
            index_pos,
            frame_indices: Vec::with_capacity(header.frame_count as usize),
            previous: None,
            stats: EncodeStats::default(),
        })
    }

    /// Delta-encode and append the next rendered frame.
    pub fn record_frame(&mut self, frame: &FrameBuffer) -> Result<FrameKind, ContainerError> {
        let record = encode_frame(
            self.previous.as_ref(),
            frame,
            self.frame_indices.len(),
            self.policy,
        );
        self.stats.raw_bytes += frame.as_bytes().len() as u64;
        self.write_record(&record)?;
        self.previous = Some(frame.clone());
        Ok(record.kind)
    }

    /// Append an already encoded frame. The first frame must be `Full`.
    pub fn write_record(&mut self, record: &FrameRecord) -> Result<(), ContainerError> {
        let frame = self.frame_indices.len();
        if frame >= self.header.frame_count as usize {
            return Err(ContainerError::FrameCountMismatch {
                expected: self.header.frame_count as usize,
                actual: frame + 1,
            });
        }
        if frame == 0 && record.kind == FrameKind::Delta {
            return Err(ContainerError::MissingKeyframe(0));
        }

        let offset = self.writer.stream_position()? - self.start;
        let end = offset + record.payload.len() as u64;
        if end > u64::from(u32::MAX) {
            return Err(ContainerError::TooLarge);
        }

        self.writer.write_all(&record.payload)?;
        self.frame_indices.push(FrameIndex {
            offset: offset as u32,
            size: record.payload.len() as u32,
            kind: record.kind,
        });

        self.stats.encoded_bytes += record.payload.len() as u64;
        if record.kind == FrameKind::Full {
            self.stats.keyframes += 1;
        }
        log::trace!(
            "frame {frame}: {:?} at byte {offset}, {} bytes",
            record.kind,
            record.payload.len()
        );
        Ok(())
    }

    /// Backpatch the index table and return the underlying writer.
    pub fn finalize(mut self) -> Result<(W, EncodeStats), ContainerError> {
        if self.frame_indices.len() != self.header.frame_count as usize {
            return Err(ContainerError::FrameCountMismatch {
                expected: self.header.frame_count as usize,
                actual: self.frame_indices.len(),
            });
        }

        let end = self.writer.stream_position()?;

        // Seek back and rewrite the index
        self.writer.seek(SeekFrom::Start(self.index_pos))?;
        for index in &self.frame_indices {
            index.write_to(&mut self.writer)?;
        }
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        self.stats.frame_count = self.frame_indices.len() as u64;
        self.stats.total_bytes = end - self.start;
        log::debug!("container written: {}", self.stats);

        Ok((self.writer, self.stats))
    }

    /// Get number of frames written so far.
    pub fn frames_written(&self) -> usize {
        self.frame_indices.len()
    }
}

/// Serialize a header and pre-encoded frames into container bytes.
pub fn serialize(
    header: ContainerHeader,
    records: &[FrameRecord],
) -> Result<Vec<u8>, ContainerError> {
    let mut writer = ContainerWriter::new(
        Cursor::new(Vec::new()),
        header,
        KeyframePolicy::default(),
    )?;
    for record in records {
        writer.write_record(record)?;
    }
    let (cursor, _) = writer.finalize()?;
    Ok(cursor.into_inner())
}

/// Statistics from an encoding session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Total frames written.
    pub frame_count: u64,
    /// Frames stored in full.
    pub keyframes: u64,
    /// Size the frames would take if all were stored in full. Only counted
    /// for frames passed through `record_frame`.
    pub raw_bytes: u64,
    /// Bytes of frame payload actually written.
    pub encoded_bytes: u64,
    /// Total container size in bytes.
    pub total_bytes: u64,
}

impl EncodeStats {
    /// Percentage of raw frame bytes saved by delta encoding.
    pub fn saved_percent(&self) -> f64 {
        if self.raw_bytes == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.encoded_bytes as f64 / self.raw_bytes as f64)
    }
}

impl std::fmt::Display for EncodeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames ({} keyframes), {} -> {} frame bytes ({:.1}% saved), {} bytes total",
            self.frame_count,
            self.keyframes,
            self.raw_bytes,
            self.encoded_bytes,
            self.saved_percent(),
            self.total_bytes
        )
    }
}
