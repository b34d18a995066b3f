//! Turns a [`GenerationRequest`] snapshot into the payload for its model.
//!
//! Composition is pure: the same snapshot always yields the same payload.

use crate::{
    error::{GenError, Result},
    models::{
        Content, GenerateContentRequest, GenerationConfig, GenerationRequest, ModelName,
        OutputOptions, Part, PredictInstance, PredictParameters, PredictRequest,
        DEFAULT_MIME_TYPE,
    },
};

pub const QUALITY_PREFIX: &str = "4K, high-resolution, masterpiece quality, ";

pub const BACKGROUND_INSTRUCTION: &str = "Important: Use the provided background image as the exact setting for the scene. Place the characters within this background. Do not alter the background itself.";

pub const NO_CHARACTER_MESSAGE: &str =
    "Please upload and select at least one character for the Gemini model.";
pub const NO_PROMPT_MESSAGE: &str = "Please enter a prompt describing the scene.";

/// Payload for one model, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedRequest {
    /// One `:predict` call that returns every requested image.
    Imagen(PredictRequest),
    /// One `:generateContent` payload, sent once per requested image.
    Content(GenerateContentRequest),
}

impl ComposedRequest {
    pub fn model(&self) -> ModelName {
        match self {
            ComposedRequest::Imagen(_) => ModelName::Imagen4,
            ComposedRequest::Content(_) => ModelName::GeminiFlashImage,
        }
    }
}

/// Clause appended to the reference-conditioned prompt. Unknown ratios get the square clause.
pub fn aspect_ratio_clause(ratio: &str) -> &'static str {
    match ratio {
        "16:9" => " The image must have a widescreen, cinematic 16:9 aspect ratio.",
        "9:16" => {
            " The image must have a vertical, portrait 9:16 aspect ratio, suitable for phone screens."
        }
        "4:3" => " The image must have a landscape 4:3 aspect ratio.",
        "3:4" => " The image must have a vertical 3:4 aspect ratio.",
        _ => " The image must have a square 1:1 aspect ratio.",
    }
}

pub fn compose(request: &GenerationRequest) -> Result<ComposedRequest> {
    validate(request)?;

    let composed = match request.model {
        ModelName::Imagen4 => ComposedRequest::Imagen(compose_imagen(request)),
        ModelName::GeminiFlashImage => ComposedRequest::Content(compose_content(request)),
    };
    Ok(composed)
}

/// Rejects inputs that must never reach the network.
pub fn validate(request: &GenerationRequest) -> Result<()> {
    if request.model.uses_references() && request.qualifying_characters().next().is_none() {
        return Err(GenError::ValidationError(NO_CHARACTER_MESSAGE.into()));
    }
    if request.prompt.trim().is_empty() {
        return Err(GenError::ValidationError(NO_PROMPT_MESSAGE.into()));
    }
    Ok(())
}

fn compose_imagen(request: &GenerationRequest) -> PredictRequest {
    PredictRequest {
        instances: vec![PredictInstance {
            prompt: format!("{}{}", QUALITY_PREFIX, request.prompt),
        }],
        parameters: PredictParameters {
            sample_count: request.number_of_images.get(),
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            output_options: OutputOptions {
                mime_type: DEFAULT_MIME_TYPE.to_string(),
            },
        },
    }
}

fn compose_content(request: &GenerationRequest) -> GenerateContentRequest {
    let background = request.background.active_image();
    let instruction = format!(
        "Create a 4K, high-resolution, masterpiece-quality image based on the following description: \"{}\".{}\nUse the provided reference images for the characters.",
        request.prompt,
        aspect_ratio_clause(request.aspect_ratio.as_str())
    );

    let mut parts = Vec::with_capacity(request.characters.len() + 3);
    if background.is_some() {
        parts.push(Part::text(BACKGROUND_INSTRUCTION));
    }
    parts.push(Part::text(instruction));
    parts.extend(
        request
            .qualifying_characters()
            .filter_map(|slot| slot.image())
            .map(|image| Part::inline(image.to_inline())),
    );
    if let Some(image) = background {
        parts.push(Part::inline(image.to_inline()));
    }

    GenerateContentRequest {
        contents: vec![Content { role: None, parts }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        },
    }
}
