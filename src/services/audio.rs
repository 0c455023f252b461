use async_trait::async_trait;

use crate::error::AppError;

/// Produces the streamable mp3 rendition of an uploaded snippet. The actual
/// transcoding runs in an external service; this side only moves bytes.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn transcode_to_mp3(&self, audio: &[u8]) -> Result<Vec<u8>, AppError>;
}

/// Returns the analysis blob (beat timing and friends) for an uploaded
/// snippet, computed by an external analysis API.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, audio: &[u8]) -> Result<serde_json::Value, AppError>;
}

pub struct HttpTranscoder {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTranscoder {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl AudioTranscoder for HttpTranscoder {
    async fn transcode_to_mp3(&self, audio: &[u8]) -> Result<Vec<u8>, AppError> {
        let resp = self
            .http
            .post(format!("{}/transcode", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Transcoder request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Gateway(format!(
                "Transcoder returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AppError::Gateway(format!("Transcoder body read failed: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

pub struct HttpAnalysisProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn analyze(&self, audio: &[u8]) -> Result<serde_json::Value, AppError> {
        let resp = self
            .http
            .post(format!("{}/analyze", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Analysis request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Gateway(format!(
                "Analysis provider returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| AppError::Gateway(format!("Analysis body parse failed: {}", e)))
    }
}
