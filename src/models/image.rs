use crate::error::{GenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// An image held as a `data:<mime>;base64,<data>` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

/// Base64 payload plus mime type, as the provider sends and receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    /// Wraps an already encoded data URL. The string is kept as-is.
    pub fn new(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, data))
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &STANDARD.encode(bytes))
    }

    pub fn from_inline(inline: &InlineData) -> Self {
        let mime_type = if inline.mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            inline.mime_type.as_str()
        };
        Self::from_base64(mime_type, &inline.data)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mime type from the header, `image/png` when the header carries none.
    pub fn mime_type(&self) -> &str {
        let header = self.0.split(',').next().unwrap_or_default();
        header
            .split_once(':')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Everything after the first comma.
    pub fn base64_data(&self) -> &str {
        self.0.split_once(',').map(|(_, data)| data).unwrap_or_default()
    }

    pub fn to_inline(&self) -> InlineData {
        InlineData {
            mime_type: self.mime_type().to_string(),
            data: self.base64_data().to_string(),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.base64_data())
            .map_err(|e| GenError::SerializationError(format!("invalid base64 image: {}", e)))
    }

    /// File extension matching the mime type, for saving results.
    pub fn extension(&self) -> &'static str {
        match self.mime_type() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EncodedImage {
    fn from(s: String) -> Self {
        Self(s)
    }
}
