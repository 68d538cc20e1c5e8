use crate::foundation::error::{AugmentError, AugmentResult};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Encoded image (or video) bytes together with their MIME type.
///
/// Bytes are shared, so cloning a payload is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    /// MIME type of `bytes`, e.g. `image/png`.
    pub mime_type: String,
    /// Encoded file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl ImagePayload {
    /// Wrap encoded bytes.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Return `true` when the payload is JPEG encoded.
    pub fn is_jpeg(&self) -> bool {
        self.mime_type.contains("jpeg") || self.mime_type.contains("jpg")
    }

    /// File extension used when writing this payload to disk.
    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            _ if self.is_jpeg() => "jpeg",
            _ => "bin",
        }
    }
}

/// Immutable uploaded source image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    /// Identifier of the image, normally its original file name.
    pub name: String,
    /// Original encoded bytes.
    pub image: ImagePayload,
}

impl SourceImage {
    /// Create a source image from encoded bytes.
    pub fn new(name: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    /// Read an image file, deriving the MIME type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> AugmentResult<Self> {
        let path = path.as_ref();
        let format = image::ImageFormat::from_path(path).map_err(|e| {
            AugmentError::validation(format!("unsupported image '{}': {e}", path.display()))
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            AugmentError::validation(format!("read image '{}': {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, ImagePayload::new(format.to_mime_type(), bytes)))
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// Axis-aligned box in COCO order: `[x_min, y_min, width, height]`, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BoundingBox(pub [f64; 4]);

/// Stable identifier assigned to a result when it is appended to the store.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ResultId(pub u64);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sea state bucket used for scenery prompts and classification, 1 (calm) to 4 (rough).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SeaState {
    /// Mirror-flat water.
    Calm = 1,
    /// Small waves with some foam crests.
    Slight = 2,
    /// Moderate, choppy waves.
    Moderate = 3,
    /// Large waves under a stormy sky.
    Rough = 4,
}

impl SeaState {
    /// All presets in ascending order.
    pub const ALL: [SeaState; 4] = [Self::Calm, Self::Slight, Self::Moderate, Self::Rough];

    /// Map a numeric level onto a preset.
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.level() == level)
    }

    /// Numeric level (1..=4).
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Short human label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "State 1 (calm)",
            Self::Slight => "State 2 (slight)",
            Self::Moderate => "State 3 (moderate)",
            Self::Rough => "State 4 (rough)",
        }
    }

    /// Scenery instruction sent to the edit service.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Calm => {
                "Change the scenery to a completely calm, mirror-like sea with no waves (Sea State 1)."
            }
            Self::Slight => {
                "Change the scenery to a sea with small waves and a few foam crests (Sea State 2)."
            }
            Self::Moderate => {
                "Change the scenery to a choppy sea with moderate waves (Sea State 3)."
            }
            Self::Rough => {
                "Change the scenery to a rough sea with large waves, a stormy sky and heavy spray (Sea State 4)."
            }
        }
    }
}

impl TryFrom<u8> for SeaState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_level(value).ok_or_else(|| format!("sea state must be 1..=4, got {value}"))
    }
}

impl From<SeaState> for u8 {
    fn from(value: SeaState) -> Self {
        value.level()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
