use super::{ColorizeFuture, ColorizedPayload, Colorizer};
use crate::error::SubmissionError;
use crate::model::{RunConfig, SourceFile, UPLOAD_FIELD};
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

/// Longest service error detail kept for the failure notice.
const MAX_DETAIL_CHARS: usize = 300;

/// Submits images as a multipart upload and reads the image back as raw bytes.
#[derive(Clone)]
pub struct HttpColorizer {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl HttpColorizer {
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&cfg.endpoint)
            .with_context(|| format!("invalid endpoint URL: {}", cfg.endpoint))?;
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;
        Ok(Self { http, endpoint })
    }
}

impl Colorizer for HttpColorizer {
    fn colorize(&self, file: &SourceFile) -> ColorizeFuture {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let name = file.name.clone();
        let media_type = file.media_type.clone();
        let body = file.bytes.clone();

        Box::pin(async move {
            let part = Part::bytes(body.to_vec()).file_name(name.clone());
            // An unparsable declared type falls back to reqwest's default.
            let part = match part.mime_str(&media_type) {
                Ok(p) => p,
                Err(_) => Part::bytes(body.to_vec()).file_name(name),
            };
            let form = Form::new().part(UPLOAD_FIELD, part);

            tracing::debug!(%endpoint, bytes = body.len(), "submitting image");
            let resp = http.post(endpoint).multipart(form).send().await?;
            let status = resp.status();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(essence);

            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(SubmissionError::Status {
                    status: status.as_u16(),
                    detail: error_detail(&text),
                });
            }

            let bytes = resp.bytes().await?;
            // The service reports inference exceptions as a 200 with a JSON body.
            if content_type.as_deref() == Some("application/json") {
                return Err(SubmissionError::Service(error_detail(
                    &String::from_utf8_lossy(&bytes),
                )));
            }
            if let Some(ct) = content_type.as_deref().filter(|ct| !is_image_body(ct)) {
                return Err(SubmissionError::Service(format!(
                    "unexpected content type {ct}: {}",
                    error_detail(&String::from_utf8_lossy(&bytes))
                )));
            }
            if bytes.is_empty() {
                return Err(SubmissionError::EmptyPayload);
            }

            Ok(ColorizedPayload {
                bytes,
                media_type: content_type.unwrap_or_else(|| "image/png".to_string()),
            })
        })
    }
}

/// Successful bodies must be image data; an untyped octet stream is taken as one.
fn is_image_body(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/octet-stream"
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Pull a human-readable message out of an error body.
fn error_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "detail", "message"].iter().find_map(|k| {
                v.get(*k).map(|d| match d.as_str() {
                    Some(s) => s.to_string(),
                    None => d.to_string(),
                })
            })
        });
    let detail = from_json.unwrap_or_else(|| body.trim().to_string());
    if detail.is_empty() {
        return "no details".to_string();
    }
    if detail.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{cut}…")
    } else {
        detail
    }
}
