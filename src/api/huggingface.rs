use crate::api::SentimentClassifier;
use crate::error::PipelineError;
use crate::models::SentimentRecord;
use crate::nlp::LabelMap;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co";
const SERVICE: &str = "huggingface";

/// Text-classification model served by the Hugging Face inference API.
///
/// The access token is handed in at construction; nothing is read from the
/// environment here.
#[derive(Clone)]
pub struct HuggingFaceClient {
    client: Client,
    token: String,
    model: String,
    base_url: String,
    labels: LabelMap,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    parameters: InferenceParameters,
    options: InferenceOptions,
}

/// Cut posts longer than the model's input window instead of failing the batch
#[derive(Debug, Serialize)]
struct InferenceParameters {
    truncation: bool,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

/// Batched calls return one list of label scores per input. Some models
/// return only the top label per input instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    PerInput(Vec<Vec<Prediction>>),
    TopOnly(Vec<Prediction>),
}

impl HuggingFaceClient {
    pub fn new(token: String, model: String, labels: LabelMap) -> Result<Self> {
        Self::with_base_url(token, model, labels, HF_INFERENCE_BASE.to_string())
    }

    pub fn with_base_url(
        token: String,
        model: String,
        labels: LabelMap,
        base_url: String,
    ) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "a Hugging Face token is required to access the model".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            token,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            labels,
        })
    }

    fn to_records(&self, response: InferenceResponse) -> Result<Vec<SentimentRecord>> {
        let top: Vec<Prediction> = match response {
            InferenceResponse::PerInput(per_input) => per_input
                .into_iter()
                .filter_map(|scores| {
                    scores
                        .into_iter()
                        .max_by(|a, b| a.score.total_cmp(&b.score))
                })
                .collect(),
            InferenceResponse::TopOnly(top) => top,
        };

        top.into_iter()
            .map(|p| {
                if !(0.0..=1.0).contains(&p.score) {
                    return Err(PipelineError::external(
                        SERVICE,
                        format!("bad score {} for label {}", p.score, p.label),
                    ));
                }
                Ok(SentimentRecord::new(self.labels.resolve(&p.label), p.score))
            })
            .collect()
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClient {
    async fn classify(&self, texts: &[String]) -> Result<Vec<SentimentRecord>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = InferenceRequest {
            inputs: texts,
            parameters: InferenceParameters { truncation: true },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        tracing::debug!(model = %self.model, count = texts.len(), "Classifying texts");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::external(
                SERVICE,
                format!("inference failed ({}): {}", status, error_text),
            ));
        }

        let parsed: InferenceResponse = response.json().await.map_err(|e| {
            PipelineError::external(SERVICE, format!("bad inference response: {}", e))
        })?;

        let records = self.to_records(parsed)?;
        if records.len() != texts.len() {
            return Err(PipelineError::external(
                SERVICE,
                format!(
                    "expected {} predictions, got {}",
                    texts.len(),
                    records.len()
                ),
            ));
        }

        Ok(records)
    }
}
