//! Character-consistent image generation on top of the Google Generative Language API.
//!
//! Build a [`GenerationRequest`] (or keep a [`SessionState`] and snapshot it), then
//! hand it to [`GeminiClient::generate`]. The prompt-only model returns every image
//! from one call; the reference-conditioned model fans out one call per image and
//! fails the whole batch if any call fails.

pub mod config;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod logger;
pub mod models;

pub use config::GeminiConfig;
pub use error::{GenError, Result};
pub use gemini::{GeminiClient, ImageClient, ImageProvider};
pub use generation::{aspect_ratio_clause, compose, BatchOutcome, ComposedRequest, FanOutExecutor};
pub use models::{
    AspectRatio, BackgroundSlot, CharacterSlot, EncodedImage, GenerationRequest,
    GenerationResult, ImageCount, ModelName, SessionState,
};
