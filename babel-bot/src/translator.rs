//! Translation gateway.
//!
//! The core only sees text in and text out; every provider failure collapses into
//! [`TranslateError::Unavailable`].

use crate::language::LanguagePair;
use async_trait::async_trait;
use babel_common::config::TranslatorConfig;
use babel_common::util::sanitize_for_log;
use std::time::Duration;

/// Translation failure. The cause is for logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("translation unavailable: {0}")]
    Unavailable(String),
}

/// Remote translation provider.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<String, TranslateError>;
}

/// Google Translate client using the public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    endpoint: String,
    max_chars: usize,
    client: reqwest::Client,
}

impl GoogleTranslator {
    /// Create a client from configuration.
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslateError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_chars: config.max_chars,
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/translate_a/single", self.endpoint)
    }
}

/// Extract the translation from the provider's nested array response.
///
/// The body looks like `[[["hola ","hello ",...],["mundo","world",...]],null,"en",...]`;
/// the translation is the concatenation of each segment's first element.
fn parse_response(body: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| TranslateError::Unavailable("unexpected response shape".into()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(serde_json::Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslateError::Unavailable("empty translation".into()));
    }
    Ok(translated)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chars = text.chars().count();
        if chars > self.max_chars {
            return Err(TranslateError::Unavailable(format!(
                "text has {chars} characters, limit is {}",
                self.max_chars
            )));
        }

        let resp = self
            .client
            .get(self.url())
            .query(&[
                ("client", "gtx"),
                ("sl", pair.source().code()),
                ("tl", pair.target().code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Unavailable(sanitize_for_log(&e.to_string())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranslateError::Unavailable(format!(
                "provider returned {status}: {}",
                babel_common::util::truncate_with_ellipsis(&body, 200)
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Unavailable(format!("malformed response: {e}")))?;

        let translated = parse_response(&body)?;
        tracing::debug!(
            pair = %pair,
            input_chars = chars,
            output_chars = translated.chars().count(),
            "Translation completed"
        );
        Ok(translated)
    }
}
