//! Binary layout definitions for HMICB containers.

use std::io::{self, Read, Write};

/// Magic bytes identifying an HMICB container.
pub const CONTAINER_MAGIC: &[u8; 5] = b"HMICB";

/// Current format version.
pub const CONTAINER_VERSION: u8 = 1;

/// How a frame payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FrameKind {
    /// Raw `r g b a` bytes for every cell, row-major.
    #[default]
    Full = 0,
    /// Changed cells relative to the previous frame.
    Delta = 1,
}

impl FrameKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(FrameKind::Full),
            1 => Some(FrameKind::Delta),
            _ => None,
        }
    }
}

/// Container header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerFlags {
    /// If true, frames between keyframes store deltas.
    pub delta_encoding: bool,
}

impl ContainerFlags {
    pub fn to_u8(self) -> u8 {
        u8::from(self.delta_encoding)
    }

    /// Unknown bits are ignored.
    pub fn from_u8(v: u8) -> Self {
        Self {
            delta_encoding: v & 1 != 0,
        }
    }
}

/// Fixed-size header at the start of every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub width: u16,
    pub height: u16,
    pub fps: u16,
    pub frame_count: u32,
    pub looping: bool,
    pub flags: ContainerFlags,
}

impl ContainerHeader {
    /// Size of header in bytes.
    /// Magic(5) + Version(1) + Width(2) + Height(2) + Fps(2) + FrameCount(4) +
    /// Loop(1) + Flags(1) + Reserved(14) = 32
    pub const SIZE: usize = 32;

    /// Size of one full frame in bytes.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Byte offset at which frame payloads begin.
    pub fn data_start(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.frame_count) * FrameIndex::SIZE as u64
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(CONTAINER_MAGIC)?;
        w.write_all(&[CONTAINER_VERSION])?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.fps.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&[u8::from(self.looping), self.flags.to_u8()])?;
        // Reserved bytes
        w.write_all(&[0u8; 14])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, ContainerError> {
        let mut magic = [0u8; 5];
        r.read_exact(&mut magic)?;
        if &magic != CONTAINER_MAGIC {
            return Err(ContainerError::BadMagic);
        }

        let mut buf1 = [0u8; 1];
        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf1)?;
        if buf1[0] != CONTAINER_VERSION {
            return Err(ContainerError::UnsupportedVersion(buf1[0]));
        }

        r.read_exact(&mut buf2)?;
        let width = u16::from_le_bytes(buf2);

        r.read_exact(&mut buf2)?;
        let height = u16::from_le_bytes(buf2);

        r.read_exact(&mut buf2)?;
        let fps = u16::from_le_bytes(buf2);

        r.read_exact(&mut buf4)?;
        let frame_count = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf1)?;
        let looping = buf1[0] != 0;

        r.read_exact(&mut buf1)?;
        let flags = ContainerFlags::from_u8(buf1[0]);

        // Skip reserved bytes
        let mut reserved = [0u8; 14];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            width,
            height,
            fps,
            frame_count,
            looping,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset from start of container.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
    pub kind: FrameKind,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 9;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        w.write_all(&[self.kind as u8])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, ContainerError> {
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf4)?;
        let offset = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let size = u32::from_le_bytes(buf4);

        let mut kind = [0u8; 1];
        r.read_exact(&mut kind)?;
        let kind = FrameKind::from_u8(kind[0]).ok_or(ContainerError::UnknownFrameKind(kind[0]))?;

        Ok(Self { offset, size, kind })
    }

    /// Byte range of the payload within the container.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start.saturating_add(self.size as usize)
    }
}

/// Container encoding and decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid HMICB magic bytes")]
    BadMagic,
    #[error("Unsupported HMICB version: {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown frame kind: {0}")]
    UnknownFrameKind(u8),
    #[error("Frame data starts at byte {actual}, index table expects {expected}")]
    IndexMismatch { expected: u64, actual: u64 },
    #[error("Header declares {expected} frames but {actual} were written")]
    FrameCountMismatch { expected: usize, actual: usize },
    #[error("Container exceeds 4 GiB of addressable frame data")]
    TooLarge,
    #[error("Frame {frame} points outside the container ({end} > {len})")]
    Truncated { frame: usize, end: usize, len: usize },
    #[error("Frame {frame} payload is malformed: {reason}")]
    MalformedPayload { frame: usize, reason: String },
    #[error("Frame {frame} out of range ({count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },
    #[error("Frame {0} is a delta with no preceding keyframe")]
    MissingKeyframe(usize),
    #[error("Canvas {width}x{height} does not fit the 16-bit header fields")]
    DimensionsTooLarge { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> ContainerHeader {
        ContainerHeader {
            width: 640,
            height: 480,
            fps: 30,
            frame_count: 1000,
            looping: true,
            flags: ContainerFlags {
                delta_encoding: true,
            },
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), ContainerHeader::SIZE);

        let mut cursor = Cursor::new(&buf);
        let decoded = ContainerHeader::read_from(&mut cursor).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_byte_layout() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();

        assert_eq!(&buf[0..5], b"HMICB");
        assert_eq!(buf[5], 1);
        assert_eq!(&buf[6..8], &640u16.to_le_bytes());
        assert_eq!(&buf[8..10], &480u16.to_le_bytes());
        assert_eq!(&buf[10..12], &30u16.to_le_bytes());
        assert_eq!(&buf[12..16], &1000u32.to_le_bytes());
        assert_eq!(buf[16], 1);
        assert_eq!(buf[17], 1);
        assert!(buf[18..32].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_header_rejects_bad_magic_and_version() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();

        let mut bad_magic = buf.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            ContainerHeader::read_from(&mut Cursor::new(&bad_magic)),
            Err(ContainerError::BadMagic)
        ));

        let mut bad_version = buf;
        bad_version[5] = 9;
        assert!(matches!(
            ContainerHeader::read_from(&mut Cursor::new(&bad_version)),
            Err(ContainerError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_header_truncated() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf.truncate(20);
        assert!(matches!(
            ContainerHeader::read_from(&mut Cursor::new(&buf)),
            Err(ContainerError::Io(_))
        ));
    }

    #[test]
    fn test_frame_index_roundtrip() {
        let index = FrameIndex {
            offset: 12345678,
            size: 8192,
            kind: FrameKind::Delta,
        };

        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FrameIndex::SIZE);

        let mut cursor = Cursor::new(&buf);
        let decoded = FrameIndex::read_from(&mut cursor).unwrap();
        assert_eq!(decoded, index);
        assert_eq!(decoded.range(), 12345678..12345678 + 8192);
    }

    #[test]
    fn test_frame_index_unknown_kind() {
        let buf = [0, 0, 0, 0, 0, 0, 0, 0, 7];
        assert!(matches!(
            FrameIndex::read_from(&mut Cursor::new(&buf)),
            Err(ContainerError::UnknownFrameKind(7))
        ));
    }

    #[test]
    fn test_flags_ignore_unknown_bits() {
        assert!(ContainerFlags::from_u8(0b1000_0001).delta_encoding);
        assert!(!ContainerFlags::from_u8(0b1000_0000).delta_encoding);
    }

    #[test]
    fn test_data_start() {
        let header = ContainerHeader {
            frame_count: 3,
            ..sample_header()
        };
        assert_eq!(header.data_start(), 32 + 27);
    }
}
