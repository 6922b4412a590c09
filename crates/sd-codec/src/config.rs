use serde::{Deserialize, Serialize};

/// Payload encoding inside a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Compact bincode encoding.
    #[default]
    Bincode,
    /// Human-readable JSON, for debugging transports.
    Json,
}

impl PayloadFormat {
    /// Wire tag stored in the frame header.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Bincode => 0x01,
            Self::Json => 0x02,
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Bincode),
            0x02 => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for envelope encoding and application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Encoding used when writing frames.
    pub format: PayloadFormat,
    /// Check the pre-image and post-image digests when applying an envelope.
    pub verify_digests: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Bincode,
            verify_digests: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = CodecConfig::default();
        assert_eq!(c.format, PayloadFormat::Bincode);
        assert!(c.verify_digests);
    }

    #[test]
    fn format_tags_roundtrip() {
        for format in [PayloadFormat::Bincode, PayloadFormat::Json] {
            assert_eq!(PayloadFormat::from_tag(format.tag()), Some(format));
        }
        assert_eq!(PayloadFormat::from_tag(0x7f), None);
    }
}
