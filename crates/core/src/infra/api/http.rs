use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::{ApiError, FirApi, GenerationPayload, AUDIO_FIELD, EVIDENCE_FIELD};
use crate::domain::settings::ClientSettings;
use crate::domain::types::Attachment;
use crate::domain::wire::{
    AnalyzeRequest, AnalyzeResponse, FirResponse, GenerateFirRequest, HealthResponse,
    TranscribeResponse,
};

/// reqwest を使用したFIRサービスクライアント
pub struct HttpFirApi {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpFirApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            health_timeout: settings.health_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn file_part(file: Attachment) -> Result<Part, ApiError> {
        let Attachment {
            file_name,
            mime_type,
            bytes,
        } = file;
        let part = Part::bytes(bytes).file_name(file_name);
        if mime_type.is_empty() {
            return Ok(part);
        }
        part.mime_str(&mime_type)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid MIME type {mime_type}: {e}")))
    }

    fn multipart_form(fields: &GenerateFirRequest, files: Vec<Attachment>) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for (name, value) in fields.scalar_fields() {
            form = form.text(name, value);
        }
        for file in files {
            form = form.part(EVIDENCE_FIELD, Self::file_part(file)?);
        }
        Ok(form)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        request.send().await.map_err(map_transport_error)
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Unreachable(format!("HTTP request failed: {e}"))
    }
}

/// エラー本文から message を拾うための最小形
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// ステータスを確認してJSON本文をデコードする。
/// 非2xxの場合は本文の `error` を可能なら拾う。
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(format!("Response parse error: {e}")))
}

#[async_trait]
impl FirApi for HttpFirApi {
    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let request = self
            .client
            .get(self.url("health"))
            .timeout(self.health_timeout);
        let response = self.send(request).await?;
        decode(response).await
    }

    async fn analyze_realtime(&self, text: &str) -> Result<AnalyzeResponse, ApiError> {
        let body = AnalyzeRequest {
            text: text.to_string(),
        };
        let response = self
            .send(self.client.post(self.url("analyze_realtime")).json(&body))
            .await?;
        decode(response).await
    }

    async fn generate_fir(&self, payload: GenerationPayload) -> Result<FirResponse, ApiError> {
        let endpoint = self.url("generate_fir");
        let request = match payload {
            GenerationPayload::Json(fields) => self.client.post(endpoint).json(&fields),
            GenerationPayload::Multipart { fields, files } => {
                let form = Self::multipart_form(&fields, files)?;
                self.client.post(endpoint).multipart(form)
            }
        };

        let response = self.send(request).await?;
        let status = response.status();
        match decode::<FirResponse>(response).await {
            // success=false の本文は上位で扱う
            Ok(body) => Ok(body),
            Err(ApiError::Malformed(detail)) => {
                log::warn!("generate_fir returned an unreadable body (HTTP {status}): {detail}");
                Err(ApiError::Malformed(detail))
            }
            Err(e) => Err(e),
        }
    }

    async fn transcribe_audio(&self, audio: Attachment) -> Result<TranscribeResponse, ApiError> {
        log::info!(
            "Sending audio for transcription: {} ({} bytes)",
            audio.file_name,
            audio.len()
        );
        let form = Form::new().part(AUDIO_FIELD, Self::file_part(audio)?);
        let response = self
            .send(self.client.post(self.url("transcribe_audio")).multipart(form))
            .await?;
        decode(response).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
