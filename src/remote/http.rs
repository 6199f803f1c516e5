//! HTTP client for the archive backend.
//!
//! Thin reqwest wrapper: multipart intake upload, JSON process/confirm/
//! reject/list calls, and mapping of HTTP failures into [`RemoteError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{ArtifactKind, Interpretation};

use super::{
    parse_duplicate_detail, ArchiveApi, ConfirmRequest, ProcessOutcome, RemoteError, RemoteNote,
    UploadRequest, DEFAULT_TIMEOUT,
};

/// Archive HTTP client
pub struct HttpArchiveClient {
    base_url: String,
    client: reqwest::Client,
}

/// Error envelope the archive uses for non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    note_id: i64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    transcription: TranscriptionBody,
    #[serde(default)]
    interpretation: Option<Interpretation>,
}

#[derive(Debug, Deserialize)]
struct NoteBody {
    id: i64,
    status: String,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    detected_language: Option<String>,
    #[serde(default)]
    interpretation: Option<Interpretation>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    notes: Vec<NoteBody>,
}

impl HttpArchiveClient {
    /// Create a client with the default 30s request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Turn a non-2xx response into the matching error. A 409 carries the
    /// duplicate triplet in its detail message.
    async fn check(&self, response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        if status == StatusCode::CONFLICT {
            return match parse_duplicate_detail(&message) {
                Some(key) => Err(RemoteError::Conflict(key)),
                None => Err(RemoteError::Malformed(format!(
                    "409 without a parseable duplicate key: {message}"
                ))),
            };
        }

        Err(RemoteError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ArchiveApi for HttpArchiveClient {
    async fn upload(&self, req: &UploadRequest, media: Vec<u8>) -> Result<i64, RemoteError> {
        let (path, mime) = match req.kind {
            ArtifactKind::AudioNote => ("notes/upload-audio", "audio/mp4"),
            ArtifactKind::Image => ("media/upload-image", "image/jpeg"),
        };

        let file_part = Part::bytes(media)
            .file_name(req.file_name.clone())
            .mime_str(mime)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("sito", req.site.clone())
            .text("idempotency_key", req.idempotency_key.clone());

        if let Some(ref by) = req.recorded_by {
            form = form.text("recorded_by", by.clone());
        }
        if let Some(lat) = req.gps_lat {
            form = form.text("gps_lat", lat.to_string());
        }
        if let Some(lon) = req.gps_lon {
            form = form.text("gps_lon", lon.to_string());
        }

        let response = self
            .client
            .post(self.api_url(path))
            .multipart(form)
            .send()
            .await?;
        let response = self.check(response).await?;

        let body: UploadResponse = response.json().await?;
        debug!(note_id = body.note_id, file = %req.file_name, "intake upload accepted");
        Ok(body.note_id)
    }

    async fn process(
        &self,
        note_id: i64,
        force_reprocess: bool,
    ) -> Result<ProcessOutcome, RemoteError> {
        let mut request = self
            .client
            .post(self.api_url(&format!("notes/{}/process", note_id)));
        if force_reprocess {
            request = request.query(&[("force_reprocess", "true")]);
        }

        let response = self.check(request.send().await?).await?;
        let body: ProcessResponse = response.json().await?;

        Ok(ProcessOutcome {
            transcription: body.transcription.text,
            detected_language: body.transcription.language,
            interpretation: body.interpretation,
        })
    }

    async fn confirm(&self, note_id: i64, req: &ConfirmRequest) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.api_url(&format!("notes/{}/confirm", note_id)))
            .json(req)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn reject(&self, note_id: i64) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.api_url(&format!("notes/{}/reject", note_id)))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn list_notes(&self) -> Result<Vec<RemoteNote>, RemoteError> {
        let response = self.client.get(self.api_url("notes")).send().await?;
        let response = self.check(response).await?;
        let body: ListResponse = response.json().await?;

        Ok(body
            .notes
            .into_iter()
            .map(|n| RemoteNote {
                note_id: n.id,
                status: n.status,
                transcription: n.transcription,
                detected_language: n.detected_language,
                interpretation: n.interpretation,
            })
            .collect())
    }
}
