//! Thin HTTP client for the TTS API.

use anyhow::{Context, Result, bail};
use reqwest::multipart::Form;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Client bound to one server base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let response = check(response).await?;
        response.json().await.context("response was not JSON")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        audio_bytes(check(response).await?).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .form(fields)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        audio_bytes(check(response).await?).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Vec<u8>> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        audio_bytes(check(response).await?).await
    }
}

async fn audio_bytes(response: Response) -> Result<Vec<u8>> {
    let bytes = response.bytes().await.context("failed to read audio body")?;
    Ok(bytes.to_vec())
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{}", error_message(status, &body))
}

/// Prefer the server's `detail` field over the raw body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .map(|d| d.as_str().map(str::to_string).unwrap_or_else(|| d.to_string()))
        })
        .unwrap_or_else(|| body.trim().to_string());
    format!("server returned {status}: {detail}")
}
