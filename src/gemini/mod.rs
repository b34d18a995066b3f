pub mod image_client;
#[cfg(test)]
pub(crate) mod mock;
pub mod traits;

use crate::{
    config::GeminiConfig,
    error::Result,
    generation::{compose, FanOutExecutor, GenerationPhase, Invocation},
    logger,
    models::{
        AspectRatio, BackgroundSlot, CharacterSlot, EncodedImage, GenerationRequest,
        GenerationResult, ImageCount, ModelName, SessionState,
    },
};
use reqwest::Client;
use std::sync::Arc;

pub use image_client::ImageClient;
pub use traits::ImageProvider;

/// Entry point: composes, dispatches and aggregates one generation at a time.
#[derive(Clone)]
pub struct GeminiClient {
    provider: Arc<dyn ImageProvider>,
    executor: FanOutExecutor,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let image_client = ImageClient::new(Client::new(), config.clone())?;
        Ok(Self::with_provider(Arc::new(image_client), &config))
    }

    /// Reads `API_KEY` and friends from the environment. Fails without a key.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn with_provider(provider: Arc<dyn ImageProvider>, config: &GeminiConfig) -> Self {
        Self {
            provider,
            executor: FanOutExecutor::new(config.max_concurrency),
        }
    }

    /// Produces the requested number of images, or one error for the whole call.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<EncodedImage>> {
        let mut invocation = Invocation::new();
        let _timer = logger::timer(&format!("generation {}", invocation.id()));
        log::info!(
            "[{}] {} x{} at {} with {} reference(s)",
            invocation.id(),
            request.model.display_name(),
            request.number_of_images,
            request.aspect_ratio,
            request.qualifying_characters().count()
        );

        invocation.advance(GenerationPhase::Composing);
        let composed = match compose(request) {
            Ok(composed) => composed,
            Err(e) => {
                log::warn!("[{}] rejected before dispatch: {}", invocation.id(), e);
                invocation.advance(GenerationPhase::Failed);
                return Err(e);
            }
        };

        let outcome = self
            .executor
            .execute(
                self.provider.as_ref(),
                &composed,
                request.number_of_images,
                &mut invocation,
            )
            .await;

        match &outcome {
            Ok(images) => {
                invocation.advance(GenerationPhase::Succeeded);
                log::info!("[{}] received {} image(s)", invocation.id(), images.len());
            }
            Err(e) => {
                invocation.advance(GenerationPhase::Failed);
                log::error!("[{}] {}", invocation.id(), e);
            }
        }
        outcome
    }

    /// Positional form of [`GeminiClient::generate`] taking raw count and ratio values.
    pub async fn generate_images(
        &self,
        prompt: &str,
        characters: &[CharacterSlot],
        background: &BackgroundSlot,
        model: ModelName,
        number_of_images: u32,
        aspect_ratio: &str,
    ) -> Result<Vec<EncodedImage>> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            characters: characters.to_vec(),
            background: background.clone(),
            model,
            number_of_images: ImageCount::try_from(number_of_images)?,
            aspect_ratio: aspect_ratio.parse::<AspectRatio>()?,
        };
        self.generate(&request).await
    }

    /// Snapshots the session, generates, and stores the result back into it.
    pub async fn generate_session<'s>(
        &self,
        session: &'s mut SessionState,
    ) -> &'s GenerationResult {
        let request = session.snapshot();
        session.begin();
        let outcome = self.generate(&request).await;
        session.record(outcome)
    }
}
