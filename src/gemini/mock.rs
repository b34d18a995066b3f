//! Scripted in-memory provider for tests.

use crate::{
    error::{GenError, Result},
    gemini::ImageProvider,
    models::{
        Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData,
        ModelName, Part, PredictRequest, PredictResponse, Prediction,
    },
};
use async_trait::async_trait;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// Counts calls, tracks concurrency and fails chosen calls (1-based, in start order).
#[derive(Default)]
pub struct ScriptedProvider {
    started: AtomicUsize,
    predict_calls: AtomicUsize,
    content_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failing: Vec<usize>,
    imageless: Vec<usize>,
    predictions: Option<Vec<Option<String>>>,
    last_predict: Mutex<Option<PredictRequest>>,
    content_bodies: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_call(mut self, n: usize) -> Self {
        self.failing.push(n);
        self
    }

    pub fn imageless_call(mut self, n: usize) -> Self {
        self.imageless.push(n);
        self
    }

    /// Fixed `:predict` answer; `None` entries carry no image bytes.
    pub fn with_predictions(mut self, predictions: Vec<Option<&str>>) -> Self {
        self.predictions = Some(
            predictions
                .into_iter()
                .map(|p| p.map(str::to_string))
                .collect(),
        );
        self
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_predict(&self) -> Option<PredictRequest> {
        self.last_predict.lock().unwrap().clone()
    }

    /// Every `:generateContent` body received, in call order.
    pub fn content_bodies(&self) -> Vec<GenerateContentRequest> {
        self.content_bodies.lock().unwrap().clone()
    }

    /// Simulates network latency so concurrent calls overlap.
    async fn enter(&self) -> usize {
        let call = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        call
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn predict(&self, _model: ModelName, body: &PredictRequest) -> Result<PredictResponse> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_predict.lock().unwrap() = Some(body.clone());
        let call = self.enter().await;
        if self.failing.contains(&call) {
            return Err(GenError::ResponseError("HTTP 500: scripted".into()));
        }

        let scripted = self.predictions.clone().unwrap_or_else(|| {
            (0..body.parameters.sample_count)
                .map(|i| Some(format!("imagen{}", i)))
                .collect()
        });
        let predictions = scripted
            .into_iter()
            .map(|bytes| Prediction {
                bytes_base64_encoded: bytes,
                mime_type: Some(body.parameters.output_options.mime_type.clone()),
            })
            .collect();
        Ok(PredictResponse { predictions })
    }

    async fn generate_content(
        &self,
        _model: ModelName,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.content_bodies.lock().unwrap().push(body.clone());
        let call = self.enter().await;
        if self.failing.contains(&call) {
            return Err(GenError::RequestError("scripted network failure".into()));
        }

        let mut parts = vec![Part::text("Here is your image.")];
        if !self.imageless.contains(&call) {
            parts.push(Part::inline(InlineData {
                mime_type: "image/png".into(),
                data: format!("gemini{}", call),
            }));
        }
        Ok(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content { role: None, parts }),
            }],
        })
    }
}
