//! End-to-end conversion: script text to container (and compressed) bytes.
//!
//! Everything here is in-memory; reading inputs and writing artifacts is
//! left to the caller.

use std::io::Cursor;

use crate::animation::{
    Compressor, ContainerError, ContainerFlags, ContainerHeader, ContainerWriter, EncodeStats,
    KeyframePolicy, Lz4Compressor, unwrap_compressed, wrap_compressed,
};
use crate::error::{Error, Result};
use crate::render::{RenderStats, render_with_stats};
use crate::schema::{AnimationSettings, EncoderConfig};
use crate::script::Script;

/// Output of a conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub settings: AnimationSettings,
    /// Number of drawable commands in the script.
    pub command_count: usize,
    pub render_stats: RenderStats,
    pub encode_stats: EncodeStats,
    /// The uncompressed container.
    pub container: Vec<u8>,
    /// The compressed artifact, if the output format asks for one.
    pub compressed: Option<Vec<u8>>,
}

/// Build the container header for `settings`.
pub fn container_header(
    settings: &AnimationSettings,
    policy: KeyframePolicy,
) -> std::result::Result<ContainerHeader, ContainerError> {
    let too_large = || ContainerError::DimensionsTooLarge {
        width: settings.width,
        height: settings.height,
    };
    Ok(ContainerHeader {
        width: u16::try_from(settings.width).map_err(|_| too_large())?,
        height: u16::try_from(settings.height).map_err(|_| too_large())?,
        fps: settings.fps,
        frame_count: settings.frame_count,
        looping: settings.looping,
        flags: ContainerFlags {
            delta_encoding: policy.interval() > 1,
        },
    })
}

/// Convert script text with LZ4 compression.
pub fn convert_script(text: &str, config: &EncoderConfig) -> Result<Conversion> {
    convert_script_with(text, config, &Lz4Compressor)
}

/// Convert script text using `compressor` for the compressed artifact.
pub fn convert_script_with<C: Compressor>(
    text: &str,
    config: &EncoderConfig,
    compressor: &C,
) -> Result<Conversion> {
    config.validate()?;

    let script = Script::parse(text);
    if script.commands.is_empty() {
        return Err(Error::EmptyScript);
    }

    let settings = AnimationSettings::from_header(&script.header)?;
    settings.validate()?;
    log::debug!(
        "animation {}x{} @ {} fps, {} frames, loop={}, {} commands / {} pixels",
        settings.width,
        settings.height,
        settings.fps,
        settings.frame_count,
        settings.looping,
        script.commands.len(),
        script.pixel_count()
    );

    let (frames, render_stats) = render_with_stats(
        &script.commands,
        settings.width,
        settings.height,
        settings.frame_count,
    )?;
    if render_stats.pixels_drawn == 0 {
        log::warn!("no pixel landed on the canvas; every frame is blank");
    }

    let policy = KeyframePolicy::new(config.keyframe_interval);
    let header = container_header(&settings, policy)?;
    let mut writer = ContainerWriter::new(Cursor::new(Vec::new()), header, policy)?;
    for frame in &frames {
        writer.record_frame(frame)?;
    }
    let (cursor, encode_stats) = writer.finalize()?;
    let container = cursor.into_inner();

    let compressed = if config.output.wants_compressed() {
        Some(wrap_compressed(compressor, &container)?)
    } else {
        None
    };

    Ok(Conversion {
        settings,
        command_count: script.commands.len(),
        render_stats,
        encode_stats,
        container,
        compressed,
    })
}

/// Script text from raw input bytes, unwrapping the compressed framing
/// first when `compressed` is set. Invalid UTF-8 is replaced.
pub fn decode_script_input(bytes: &[u8], compressed: bool) -> Result<String> {
    let text = if compressed {
        let raw = unwrap_compressed(&Lz4Compressor, bytes)?;
        String::from_utf8_lossy(&raw).into_owned()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };
    Ok(text)
}
