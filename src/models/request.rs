use crate::{
    error::{GenError, Result},
    models::{BackgroundSlot, CharacterSlot},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelName {
    /// Reference-conditioned model: one image per call, uses character images.
    #[serde(rename = "gemini-2.5-flash-image")]
    GeminiFlashImage,
    /// Prompt-only model: returns all requested images from one call.
    #[serde(rename = "imagen-4.0-generate-001")]
    Imagen4,
}

impl ModelName {
    pub fn id(&self) -> &'static str {
        match self {
            ModelName::GeminiFlashImage => "gemini-2.5-flash-image",
            ModelName::Imagen4 => "imagen-4.0-generate-001",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelName::GeminiFlashImage => "Gemini Flash Image",
            ModelName::Imagen4 => "Imagen 4",
        }
    }

    pub fn uses_references(&self) -> bool {
        matches!(self, ModelName::GeminiFlashImage)
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            (
                ModelName::GeminiFlashImage.id(),
                ModelName::GeminiFlashImage.display_name(),
                "keeps characters consistent",
            ),
            (
                ModelName::Imagen4.id(),
                ModelName::Imagen4.display_name(),
                "highest quality, prompt only",
            ),
        ]
    }
}

impl Default for ModelName {
    fn default() -> Self {
        ModelName::GeminiFlashImage
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelName {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini-2.5-flash-image" => Ok(ModelName::GeminiFlashImage),
            "imagen-4.0-generate-001" => Ok(ModelName::Imagen4),
            other => Err(GenError::ValidationError(format!(
                "Unsupported model: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ImageCount {
    One,
    Two,
    Four,
}

impl ImageCount {
    pub fn get(&self) -> u32 {
        match self {
            ImageCount::One => 1,
            ImageCount::Two => 2,
            ImageCount::Four => 4,
        }
    }
}

impl Default for ImageCount {
    fn default() -> Self {
        ImageCount::Four
    }
}

impl TryFrom<u32> for ImageCount {
    type Error = GenError;

    fn try_from(n: u32) -> Result<Self> {
        match n {
            1 => Ok(ImageCount::One),
            2 => Ok(ImageCount::Two),
            4 => Ok(ImageCount::Four),
            other => Err(GenError::ValidationError(format!(
                "Number of images must be 1, 2 or 4 (got {})",
                other
            ))),
        }
    }
}

impl From<ImageCount> for u32 {
    fn from(count: ImageCount) -> Self {
        count.get()
    }
}

impl fmt::Display for ImageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "3:4")]
    Vertical,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Widescreen,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Vertical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Vertical => "3:4",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Square
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| GenError::ValidationError(format!("Unsupported aspect ratio: {}", s)))
    }
}

/// Immutable snapshot of everything one generation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Selected slots that carry an image, in slot order.
    pub characters: Vec<CharacterSlot>,
    pub background: BackgroundSlot,
    pub model: ModelName,
    pub number_of_images: ImageCount,
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: ModelName) -> Self {
        Self {
            prompt: prompt.into(),
            characters: Vec::new(),
            background: BackgroundSlot::default(),
            model,
            number_of_images: ImageCount::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn with_characters(mut self, characters: Vec<CharacterSlot>) -> Self {
        self.characters = characters;
        self
    }

    pub fn with_background(mut self, background: BackgroundSlot) -> Self {
        self.background = background;
        self
    }

    pub fn with_count(mut self, count: ImageCount) -> Self {
        self.number_of_images = count;
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Characters that qualify as references: selected and carrying an image.
    pub fn qualifying_characters(&self) -> impl Iterator<Item = &CharacterSlot> {
        self.characters.iter().filter(|slot| slot.is_included())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_count_accepts_only_documented_values() {
        assert_eq!(ImageCount::try_from(2).unwrap(), ImageCount::Two);
        assert!(ImageCount::try_from(3).unwrap_err().is_validation());
        assert!(ImageCount::try_from(0).is_err());
    }

    #[test]
    fn aspect_ratio_parses_the_five_values() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>().unwrap(), ratio);
        }
        assert!("21:9".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn supported_models_list_every_variant() {
        let ids: Vec<&str> = ModelName::supported_models()
            .into_iter()
            .map(|(id, _, _)| id)
            .collect();
        assert_eq!(ids, vec!["gemini-2.5-flash-image", "imagen-4.0-generate-001"]);
        for id in ids {
            assert!(id.parse::<ModelName>().is_ok());
        }
    }

    #[test]
    fn model_round_trips_through_its_id() {
        assert_eq!(
            "imagen-4.0-generate-001".parse::<ModelName>().unwrap(),
            ModelName::Imagen4
        );
        assert_eq!(ModelName::default(), ModelName::GeminiFlashImage);
        assert_eq!(
            serde_json::to_string(&ModelName::GeminiFlashImage).unwrap(),
            "\"gemini-2.5-flash-image\""
        );
    }
}
