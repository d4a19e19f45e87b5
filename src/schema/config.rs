//! Configuration types for encoding and for the animation itself.

use serde::{Deserialize, Serialize};

use crate::script::HeaderMap;

/// Largest accepted canvas width or height.
pub const MAX_DIMENSION: u32 = 10_000;

/// Default keyframe interval: every 10th frame is stored in full.
fn default_keyframe_interval() -> u32 {
    10
}

/// Which artifacts the encoder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Uncompressed container only (`.hmicb`).
    Container,
    /// LZ4-compressed container only (`.hmicb7`).
    Compressed,
    /// Both artifacts.
    #[default]
    Both,
}

impl OutputFormat {
    pub fn wants_container(self) -> bool {
        matches!(self, OutputFormat::Container | OutputFormat::Both)
    }

    pub fn wants_compressed(self) -> bool {
        matches!(self, OutputFormat::Compressed | OutputFormat::Both)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "container" | "hmicb" => Ok(OutputFormat::Container),
            "2" | "compressed" | "hmicb7" => Ok(OutputFormat::Compressed),
            "3" | "both" => Ok(OutputFormat::Both),
            _ => Err(ConfigError::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Store every Nth frame in full; frames in between are deltas.
    #[serde(default = "default_keyframe_interval")]
    pub keyframe_interval: u32,
    /// Artifacts to produce.
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            keyframe_interval: default_keyframe_interval(),
            output: OutputFormat::default(),
        }
    }
}

impl EncoderConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyframe_interval == 0 {
            return Err(ConfigError::InvalidKeyframeInterval);
        }
        Ok(())
    }
}

/// Animation properties taken from the script header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSettings {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Playback rate.
    pub fps: u16,
    /// Number of frames to render.
    pub frame_count: u32,
    /// Whether playback loops.
    pub looping: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            fps: 2,
            frame_count: 1,
            looping: true,
        }
    }
}

/// Leading optionally-signed integer of `s`, ignoring trailing text.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_start = usize::from(s.starts_with(['+', '-']));
    let digits = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..digits_start + digits].parse().ok()
}

/// Parse `WxH` (either `x` or `X`).
fn parse_display(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let w = leading_int(w)?;
    let h = leading_int(h)?;
    Some((
        u32::try_from(w).ok()?,
        u32::try_from(h).ok()?,
    ))
}

fn header_int<T: TryFrom<i64>>(header: &HeaderMap, key: &str) -> Result<Option<T>, ConfigError> {
    let Some(value) = header.get(key) else {
        return Ok(None);
    };
    leading_int(value)
        .and_then(|v| T::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidHeaderValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl AnimationSettings {
    /// Read `DISPLAY`, `FPS`, `F` and `LOOP` from a script header, keeping
    /// defaults for missing keys.
    pub fn from_header(header: &HeaderMap) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(display) = header.get("DISPLAY") {
            match parse_display(display) {
                Some((width, height)) => {
                    settings.width = width;
                    settings.height = height;
                }
                None => log::warn!(
                    "could not parse DISPLAY={display}, keeping {}x{}",
                    settings.width,
                    settings.height
                ),
            }
        }
        if let Some(fps) = header_int(header, "FPS")? {
            settings.fps = fps;
        }
        if let Some(frames) = header_int(header, "F")? {
            settings.frame_count = frames;
        }
        if let Some(looping) = header.get("LOOP") {
            settings.looping = matches!(looping, "Y" | "y" | "1");
        }

        Ok(settings)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)
    }
}

/// Canvas dimensions must each lie in `1..=MAX_DIMENSION`.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), ConfigError> {
    let valid = 1..=MAX_DIMENSION;
    if !valid.contains(&width) || !valid.contains(&height) {
        return Err(ConfigError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Canvas {width}x{height} is outside 1..=10000 in some dimension")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Keyframe interval must be at least 1")]
    InvalidKeyframeInterval,
    #[error("Header value {key}={value} is not a valid integer")]
    InvalidHeaderValue { key: String, value: String },
    #[error("Unknown output format: {0}")]
    InvalidOutputFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_header_body;

    #[test]
    fn test_settings_from_header() {
        let header = parse_header_body("DISPLAY=64X32\nFPS=24\nF=120\nLOOP=n\nTITLE=demo");
        let settings = AnimationSettings::from_header(&header).unwrap();
        assert_eq!(
            settings,
            AnimationSettings {
                width: 64,
                height: 32,
                fps: 24,
                frame_count: 120,
                looping: false,
            }
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings = AnimationSettings::from_header(&HeaderMap::new()).unwrap();
        assert_eq!(settings, AnimationSettings::default());
        assert!(settings.looping);
    }

    #[test]
    fn test_bad_display_keeps_defaults() {
        let header = parse_header_body("DISPLAY=wide");
        let settings = AnimationSettings::from_header(&header).unwrap();
        assert_eq!((settings.width, settings.height), (5, 5));
    }

    #[test]
    fn test_integer_prefix_accepted() {
        let header = parse_header_body("FPS=12fps\nF= 3 frames");
        let settings = AnimationSettings::from_header(&header).unwrap();
        assert_eq!(settings.fps, 12);
        assert_eq!(settings.frame_count, 3);
    }

    #[test]
    fn test_bad_integers_are_errors() {
        for body in ["FPS=fast", "F=-1", "FPS=70000"] {
            let header = parse_header_body(body);
            assert!(
                matches!(
                    AnimationSettings::from_header(&header),
                    Err(ConfigError::InvalidHeaderValue { .. })
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn test_loop_tokens() {
        for (token, expected) in [("Y", true), ("y", true), ("1", true), ("yes", false), ("0", false)] {
            let header = parse_header_body(&format!("LOOP={token}"));
            assert_eq!(AnimationSettings::from_header(&header).unwrap().looping, expected);
        }
    }

    #[test]
    fn test_dimension_guardrail() {
        assert!(validate_dimensions(1, 1).is_ok());
        assert!(validate_dimensions(10_000, 10_000).is_ok());
        assert!(validate_dimensions(0, 5).is_err());
        assert!(validate_dimensions(5, 10_001).is_err());
    }

    #[test]
    fn test_encoder_config_json() {
        let config: EncoderConfig = serde_json::from_str(r#"{"output": "compressed"}"#).unwrap();
        assert_eq!(config.keyframe_interval, 10);
        assert_eq!(config.output, OutputFormat::Compressed);
        config.validate().unwrap();

        let config = EncoderConfig {
            keyframe_interval: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidKeyframeInterval)));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("3".parse::<OutputFormat>().unwrap(), OutputFormat::Both);
        assert_eq!("HMICB".parse::<OutputFormat>().unwrap(), OutputFormat::Container);
        assert!("zip".parse::<OutputFormat>().is_err());
        assert!(OutputFormat::Both.wants_container() && OutputFormat::Both.wants_compressed());
        assert!(!OutputFormat::Compressed.wants_container());
    }
}
