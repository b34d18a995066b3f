use crate::{
    error::{GenError, Result},
    models::{AspectRatio, EncodedImage, GenerationRequest, ImageCount, ModelName},
};
use serde::{Deserialize, Serialize};

pub const MAX_CHARACTERS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSlot {
    pub id: u32,
    pub label: String,
    image: Option<EncodedImage>,
    selected: bool,
}

impl CharacterSlot {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            image: None,
            selected: false,
        }
    }

    /// Attaching an image always selects the slot.
    pub fn attach_image(self, image: EncodedImage) -> Self {
        Self {
            image: Some(image),
            selected: true,
            ..self
        }
    }

    /// Clearing the image always deselects the slot.
    pub fn clear_image(self) -> Self {
        Self {
            image: None,
            selected: false,
            ..self
        }
    }

    /// Flips selection. A slot without an image stays deselected.
    pub fn toggle_selected(self) -> Self {
        let selected = self.image.is_some() && !self.selected;
        Self { selected, ..self }
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_included(&self) -> bool {
        self.selected && self.image.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundSlot {
    pub image: Option<EncodedImage>,
    pub apply: bool,
}

impl BackgroundSlot {
    pub fn new(image: Option<EncodedImage>, apply: bool) -> Self {
        Self { image, apply }
    }

    /// The image to use, if the flag is set and an image is present.
    pub fn active_image(&self) -> Option<&EncodedImage> {
        if self.apply {
            self.image.as_ref()
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_image().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationResult {
    Images(Vec<EncodedImage>),
    Error(String),
}

impl GenerationResult {
    pub fn images(&self) -> &[EncodedImage] {
        match self {
            GenerationResult::Images(images) => images,
            GenerationResult::Error(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationResult::Images(_) => None,
            GenerationResult::Error(message) => Some(message),
        }
    }
}

impl From<Result<Vec<EncodedImage>>> for GenerationResult {
    fn from(outcome: Result<Vec<EncodedImage>>) -> Self {
        match outcome {
            Ok(images) => GenerationResult::Images(images),
            Err(e) => GenerationResult::Error(e.user_message()),
        }
    }
}

/// Top-level owner of the input model and the last result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    characters: Vec<CharacterSlot>,
    pub background: BackgroundSlot,
    pub prompt: String,
    pub model: ModelName,
    pub number_of_images: ImageCount,
    pub aspect_ratio: AspectRatio,
    result: Option<GenerationResult>,
}

impl Default for SessionState {
    fn default() -> Self {
        let characters = (1..=MAX_CHARACTERS as u32)
            .map(|id| CharacterSlot::new(id, format!("Character {}", id)))
            .collect();

        Self {
            characters,
            background: BackgroundSlot::default(),
            prompt: String::new(),
            model: ModelName::default(),
            number_of_images: ImageCount::default(),
            aspect_ratio: AspectRatio::default(),
            result: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn characters(&self) -> &[CharacterSlot] {
        &self.characters
    }

    pub fn attach_character_image(&mut self, id: u32, image: EncodedImage) -> Result<()> {
        self.update_slot(id, |slot| slot.attach_image(image))
    }

    pub fn clear_character_image(&mut self, id: u32) -> Result<()> {
        self.update_slot(id, CharacterSlot::clear_image)
    }

    pub fn toggle_character(&mut self, id: u32) -> Result<()> {
        self.update_slot(id, CharacterSlot::toggle_selected)
    }

    pub fn set_background_image(&mut self, image: Option<EncodedImage>) {
        self.background.image = image;
    }

    pub fn toggle_background(&mut self) {
        self.background.apply = !self.background.apply;
    }

    fn update_slot(&mut self, id: u32, f: impl FnOnce(CharacterSlot) -> CharacterSlot) -> Result<()> {
        let index = self
            .characters
            .iter()
            .position(|slot| slot.id == id)
            .ok_or_else(|| GenError::ValidationError(format!("No character slot {}", id)))?;
        let slot = self.characters.remove(index);
        self.characters.insert(index, f(slot));
        Ok(())
    }

    /// Captures the current inputs; only selected, imaged slots are carried.
    pub fn snapshot(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            characters: self
                .characters
                .iter()
                .filter(|slot| slot.is_included())
                .cloned()
                .collect(),
            background: self.background.clone(),
            model: self.model,
            number_of_images: self.number_of_images,
            aspect_ratio: self.aspect_ratio,
        }
    }

    pub fn begin(&mut self) {
        self.result = None;
    }

    pub fn record(&mut self, outcome: Result<Vec<EncodedImage>>) -> &GenerationResult {
        self.result.insert(GenerationResult::from(outcome))
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }
}
