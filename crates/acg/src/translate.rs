//! Machine translation for the parts of a word no dictionary translated.

use crate::http::{HttpClient, RequestError, RequestSpec, DEFAULT_HEADERS};
use acg_core::LanguagePair;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Invalid translation request: {0}")]
    InvalidRequest(String),
    #[error("Unexpected translation response: {0}")]
    Malformed(String),
}

/// Translates text from the source to the target language of a pair.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<String, TranslateError>;
}

/// Translates through the public Google Translate endpoint.
#[derive(Debug, Clone)]
pub struct Translator {
    client: HttpClient,
}

impl Translator {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn request(text: &str, pair: LanguagePair) -> Result<RequestSpec, TranslateError> {
        let url = Url::parse_with_params(
            TRANSLATE_URL,
            [
                ("client", "gtx"),
                ("sl", pair.from.code()),
                ("tl", pair.to.code()),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|err| TranslateError::InvalidRequest(err.to_string()))?;
        Ok(RequestSpec::new(url, DEFAULT_HEADERS))
    }
}

#[async_trait]
impl Translate for Translator {
    async fn translate(&self, text: &str, pair: LanguagePair) -> Result<String, TranslateError> {
        let spec = Self::request(text, pair)?;
        let response: Value = self.client.get_json(&spec).await?;
        parse_translation(&response)
    }
}

/// Joins the translated segments of a response shaped like
/// `[[["translation", "original", ...], ...], ...]`.
fn parse_translation(response: &Value) -> Result<String, TranslateError> {
    let segments = response
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("no translated segments".to_string()))?;
    let translation = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect::<String>();
    let translation = translation.trim();
    if translation.is_empty() {
        return Err(TranslateError::Malformed("empty translation".to_string()));
    }
    Ok(translation.to_string())
}
