use crate::{
    error::Result,
    models::{
        GenerateContentRequest, GenerateContentResponse, ModelName, PredictRequest,
        PredictResponse,
    },
};
use async_trait::async_trait;

/// Outbound calls to the image-generation service.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Prompt-only generation; one call returns every requested image.
    async fn predict(&self, model: ModelName, body: &PredictRequest) -> Result<PredictResponse>;

    /// Multimodal generation; one call returns at most one image.
    async fn generate_content(
        &self,
        model: ModelName,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
