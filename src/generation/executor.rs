//! Dispatches composed payloads and reduces the answers to one outcome.

use crate::{
    error::{GenError, Result},
    gemini::ImageProvider,
    generation::{composer::ComposedRequest, GenerationPhase, Invocation},
    models::{
        EncodedImage, GenerateContentRequest, ImageCount, ModelName, PredictRequest,
        DEFAULT_MIME_TYPE,
    },
};
use futures::future::join_all;
use tokio::sync::Semaphore;

/// Per-call results of one fan-out, in dispatch order.
#[derive(Debug)]
pub struct BatchOutcome {
    results: Vec<Result<EncodedImage>>,
}

impl BatchOutcome {
    pub fn new(results: Vec<Result<EncodedImage>>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[Result<EncodedImage>] {
        &self.results
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    /// All images, or [`GenError::BatchFailed`] if any call failed.
    pub fn into_images(self) -> Result<Vec<EncodedImage>> {
        if self.failures() > 0 {
            return Err(GenError::BatchFailed);
        }
        self.results.into_iter().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanOutExecutor {
    max_concurrency: Option<usize>,
}

impl FanOutExecutor {
    pub fn new(max_concurrency: Option<usize>) -> Self {
        Self {
            max_concurrency: max_concurrency
                .filter(|n| *n > 0)
                .map(|n| n.min(Semaphore::MAX_PERMITS)),
        }
    }

    pub async fn execute(
        &self,
        provider: &dyn ImageProvider,
        composed: &ComposedRequest,
        count: ImageCount,
        invocation: &mut Invocation,
    ) -> Result<Vec<EncodedImage>> {
        match composed {
            ComposedRequest::Imagen(body) => self.run_single(provider, body, invocation).await,
            ComposedRequest::Content(body) => {
                let outcome = self.run_batch(provider, body, count, invocation).await;
                for (index, result) in outcome.results().iter().enumerate() {
                    if let Err(e) = result {
                        log::error!(
                            "[{}] generation {} failed: {}",
                            invocation.id(),
                            index + 1,
                            e
                        );
                    }
                }
                outcome.into_images()
            }
        }
    }

    async fn run_single(
        &self,
        provider: &dyn ImageProvider,
        body: &PredictRequest,
        invocation: &mut Invocation,
    ) -> Result<Vec<EncodedImage>> {
        let model = ModelName::Imagen4;
        invocation.advance(GenerationPhase::Dispatching);

        let response = provider.predict(model, body).await.map_err(|e| {
            log::error!(
                "[{}] error generating images with {}: {}",
                invocation.id(),
                model.display_name(),
                e
            );
            GenError::ModelFailed(model)
        })?;

        let requested = body.parameters.sample_count as usize;
        let images: Vec<EncodedImage> = response
            .predictions
            .iter()
            .map_while(|prediction| {
                let data = prediction.bytes_base64_encoded.as_deref()?;
                let mime_type = prediction.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
                Some(EncodedImage::from_base64(mime_type, data))
            })
            .collect();

        if images.len() != response.predictions.len() {
            log::error!(
                "[{}] {} returned a prediction without image bytes",
                invocation.id(),
                model.display_name()
            );
            return Err(GenError::ModelFailed(model));
        }
        if images.len() != requested {
            log::error!(
                "[{}] {} returned {} of {} requested images",
                invocation.id(),
                model.display_name(),
                images.len(),
                requested
            );
            return Err(GenError::ModelFailed(model));
        }
        Ok(images)
    }

    /// Sends `count` identical calls at once and waits for all of them.
    pub async fn run_batch(
        &self,
        provider: &dyn ImageProvider,
        body: &GenerateContentRequest,
        count: ImageCount,
        invocation: &mut Invocation,
    ) -> BatchOutcome {
        // A ceiling at or above the batch size never blocks a call.
        let semaphore = self
            .max_concurrency
            .filter(|limit| *limit < count.get() as usize)
            .map(Semaphore::new);
        let limiter = semaphore.as_ref();
        invocation.advance(GenerationPhase::Dispatching);

        let calls = (0..count.get()).map(|_| single_image(provider, body, limiter));
        let pending = join_all(calls);
        invocation.advance(GenerationPhase::AwaitingAll);

        BatchOutcome::new(pending.await)
    }
}

async fn single_image(
    provider: &dyn ImageProvider,
    body: &GenerateContentRequest,
    limiter: Option<&Semaphore>,
) -> Result<EncodedImage> {
    let _permit = match limiter {
        Some(semaphore) => Some(
            semaphore
                .acquire()
                .await
                .map_err(|e| GenError::InternalError(e.to_string()))?,
        ),
        None => None,
    };

    let response = provider
        .generate_content(ModelName::GeminiFlashImage, body)
        .await?;
    response
        .first_inline_image()
        .map(EncodedImage::from_inline)
        .ok_or(GenError::NoImageReturned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gemini::mock::ScriptedProvider,
        generation::composer::compose,
        models::{CharacterSlot, GenerationRequest},
    };

    fn content_request(count: ImageCount) -> (ComposedRequest, ImageCount) {
        let request = GenerationRequest::new("two friends talking", ModelName::GeminiFlashImage)
            .with_characters(vec![CharacterSlot::new(1, "Character 1")
                .attach_image(EncodedImage::from_base64("image/png", "img1"))])
            .with_count(count);
        (compose(&request).unwrap(), count)
    }

    #[tokio::test]
    async fn batch_dispatches_exactly_n_calls() {
        let provider = ScriptedProvider::new();
        let (composed, count) = content_request(ImageCount::Four);
        let mut invocation = Invocation::new();

        let images = FanOutExecutor::default()
            .execute(&provider, &composed, count, &mut invocation)
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        assert_eq!(provider.content_calls(), 4);
        assert_eq!(provider.predict_calls(), 0);
        assert_eq!(provider.max_in_flight(), 4);
        assert!(images.iter().all(|i| i.as_str().starts_with("data:image/png;base64,")));
    }

    #[tokio::test]
    async fn one_failed_call_fails_the_batch() {
        let provider = ScriptedProvider::new().failing_call(2);
        let (composed, count) = content_request(ImageCount::Four);

        let err = FanOutExecutor::default()
            .execute(&provider, &composed, count, &mut Invocation::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenError::BatchFailed));
        assert_eq!(provider.content_calls(), 4);
    }

    #[tokio::test]
    async fn missing_image_part_is_a_failure() {
        let provider = ScriptedProvider::new().imageless_call(1);
        let (composed, count) = content_request(ImageCount::Two);
        let body = match &composed {
            ComposedRequest::Content(body) => body,
            _ => unreachable!(),
        };

        let outcome = FanOutExecutor::default()
            .run_batch(&provider, body, count, &mut Invocation::new())
            .await;

        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.failures(), 1);
        assert!(outcome
            .results()
            .iter()
            .any(|r| matches!(r, Err(GenError::NoImageReturned))));
        assert!(matches!(outcome.into_images(), Err(GenError::BatchFailed)));
    }

    #[tokio::test]
    async fn ceiling_bounds_in_flight_calls() {
        let provider = ScriptedProvider::new();
        let (composed, count) = content_request(ImageCount::Four);

        let images = FanOutExecutor::new(Some(2))
            .execute(&provider, &composed, count, &mut Invocation::new())
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        assert_eq!(provider.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn imagen_uses_one_call_for_all_images() {
        let provider = ScriptedProvider::new();
        let request = GenerationRequest::new("a knight on a hill", ModelName::Imagen4)
            .with_count(ImageCount::Two);
        let composed = compose(&request).unwrap();

        let images = FanOutExecutor::default()
            .execute(&provider, &composed, ImageCount::Two, &mut Invocation::new())
            .await
            .unwrap();

        assert_eq!(provider.predict_calls(), 1);
        assert_eq!(provider.content_calls(), 0);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type(), "image/png");
    }

    #[tokio::test]
    async fn imagen_failure_names_the_model() {
        let provider = ScriptedProvider::new().failing_call(1);
        let request = GenerationRequest::new("a knight", ModelName::Imagen4);
        let composed = compose(&request).unwrap();

        let err = FanOutExecutor::default()
            .execute(&provider, &composed, ImageCount::One, &mut Invocation::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Image generation with Imagen 4 failed.");
    }

    #[tokio::test]
    async fn imagen_short_batch_is_a_failure() {
        let provider = ScriptedProvider::new().with_predictions(vec![Some("one"), None]);
        let request = GenerationRequest::new("a knight on a hill", ModelName::Imagen4)
            .with_count(ImageCount::Four);
        let composed = compose(&request).unwrap();

        let err = FanOutExecutor::default()
            .execute(&provider, &composed, ImageCount::Four, &mut Invocation::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenError::ModelFailed(ModelName::Imagen4)));
    }

    #[tokio::test]
    async fn imagen_with_fewer_predictions_than_requested_fails() {
        let provider = ScriptedProvider::new().with_predictions(vec![Some("one")]);
        let request = GenerationRequest::new("a knight on a hill", ModelName::Imagen4)
            .with_count(ImageCount::Two);
        let composed = compose(&request).unwrap();

        let result = FanOutExecutor::default()
            .execute(&provider, &composed, ImageCount::Two, &mut Invocation::new())
            .await;

        assert!(matches!(result, Err(GenError::ModelFailed(_))));
    }

    #[tokio::test]
    async fn oversized_ceiling_is_clamped() {
        let provider = ScriptedProvider::new();
        let (composed, count) = content_request(ImageCount::Four);
        let executor = FanOutExecutor::new(Some(usize::MAX));
        assert_eq!(executor.max_concurrency, Some(Semaphore::MAX_PERMITS));

        let images = executor
            .execute(&provider, &composed, count, &mut Invocation::new())
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        assert_eq!(provider.max_in_flight(), 4);
    }
}
