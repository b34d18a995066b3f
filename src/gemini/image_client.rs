use crate::{
    config::GeminiConfig,
    error::{GenError, Result},
    gemini::traits::ImageProvider,
    models::{
        GenerateContentRequest, GenerateContentResponse, ModelName, PredictRequest,
        PredictResponse,
    },
};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde::{de::DeserializeOwned, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP implementation of [`ImageProvider`] against the Generative Language API.
#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    config: GeminiConfig,
}

impl ImageClient {
    pub fn new(client: Client, config: GeminiConfig) -> Result<Self> {
        config.require_api_key()?;
        Ok(Self { client, config })
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let api_key = self.config.require_api_key()?;
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            api_key
                .parse()
                .map_err(|_| GenError::ConfigError("API key is not a valid header value".into()))?,
        );
        Ok(headers)
    }

    async fn post<B, R>(&self, model: ModelName, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(model.id(), method);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| GenError::RequestError(format!("{} request failed: {}", model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("{} returned HTTP {}: {}", model, status, error_text);
            return Err(GenError::ResponseError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GenError::ResponseError(format!("{} response parse error: {}", model, e)))
    }
}

#[async_trait]
impl ImageProvider for ImageClient {
    async fn predict(&self, model: ModelName, body: &PredictRequest) -> Result<PredictResponse> {
        log::info!(
            "Generating {} image(s) with model: {}",
            body.parameters.sample_count,
            model
        );
        self.post(model, "predict", body).await
    }

    async fn generate_content(
        &self,
        model: ModelName,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        log::info!("Generating image with model: {}", model);
        self.post(model, "generateContent", body).await
    }
}
