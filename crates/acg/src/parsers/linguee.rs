//! Linguee, a bilingual dictionary.
//! Provides translations, the word type, the gender and a pronunciation.

use super::{element_text, selector, Parser, ParserError, Query};
use crate::http::{HttpClient, RawResponse, RequestSpec, DEFAULT_HEADERS, LINGUEE_HEADERS};
use acg_core::{text::clean_scraped, Language, LanguagePair, ParserResult, Source};
use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;
use serde::Deserialize;

const API_URL: &str = "https://linguee-api.herokuapp.com/api";
const AUDIO_URL: &str = "https://www.linguee.de/mp3";

#[derive(Debug)]
pub struct Linguee {
    query: Option<Query>,
    api_url: String,
}

impl Default for Linguee {
    fn default() -> Self {
        Self {
            query: None,
            api_url: API_URL.to_string(),
        }
    }
}

impl Linguee {
    /// Uses another deployment of the Linguee API.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            query: None,
            api_url: api_url.into(),
        }
    }
}

/// The accent whose recordings are preferred for each language.
fn preferred_accent(language: Language) -> &'static str {
    match language {
        Language::Pt => "Brazilian Portuguese",
        Language::En => "American English",
        Language::De => "German",
        Language::Es => "Spanish from Spain",
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    exact_matches: Option<Vec<ApiMatch>>,
}

#[derive(Debug, Deserialize)]
struct ApiMatch {
    #[serde(default)]
    word_type: Option<ApiWordType>,
    #[serde(default)]
    audio_links: Vec<ApiAudioLink>,
    #[serde(default)]
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
struct ApiWordType {
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAudioLink {
    url_part: String,
    lang: String,
}

#[derive(Debug, Deserialize)]
struct ApiTranslation {
    text: String,
}

#[async_trait]
impl Parser for Linguee {
    fn source(&self) -> Source {
        Source::Linguee
    }

    fn supports(&self, pair: LanguagePair) -> bool {
        pair.from != pair.to
    }

    fn configure(&mut self, query: Query) {
        self.query = Some(query);
    }

    fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    fn request(&self) -> Result<RequestSpec, ParserError> {
        let query = self
            .query
            .as_ref()
            .ok_or(ParserError::NotSetUp(Source::Linguee))?;
        let url = Url::parse_with_params(
            &self.api_url,
            [
                ("q", query.phrase.as_str()),
                ("src", query.pair.from.code()),
                ("dst", query.pair.to.code()),
            ],
        )
        .map_err(|err| ParserError::Parse(Source::Linguee, err.to_string()))?;
        Ok(RequestSpec::new(url, DEFAULT_HEADERS))
    }

    fn parse_response(&self, raw: &RawResponse) -> Result<ParserResult, ParserError> {
        let query = self
            .query
            .as_ref()
            .ok_or(ParserError::NotSetUp(Source::Linguee))?;
        let response: ApiResponse = serde_json::from_str(&raw.body)
            .map_err(|err| ParserError::Parse(Source::Linguee, err.to_string()))?;
        let matches = response.exact_matches.unwrap_or_default();
        // the first match decides the word type and gender
        let Some(first) = matches.first() else {
            return Err(ParserError::NoMatch(Source::Linguee));
        };

        let word_type = first
            .word_type
            .as_ref()
            .and_then(|wt| wt.pos.clone())
            .map(|pos| clean_scraped(&pos))
            .unwrap_or_default();
        let gender = if word_type == "noun" {
            first
                .word_type
                .as_ref()
                .and_then(|wt| wt.gender.as_deref())
                .and_then(|g| g.trim().chars().next())
                .map(String::from)
        } else {
            None
        };

        let links = matches.iter().flat_map(|m| &m.audio_links);
        let accent = preferred_accent(query.pair.from);
        let audio_id = links
            .clone()
            .find(|link| link.lang == accent)
            .or_else(|| {
                let name = query.pair.from.name();
                links
                    .clone()
                    .find(|link| link.lang.to_lowercase().contains(name))
            })
            .map(|link| link.url_part.clone());
        let audio_url = audio_id.map(|id| format!("{AUDIO_URL}/{id}.mp3"));

        let translations = matches
            .iter()
            .flat_map(|m| &m.translations)
            .map(|t| clean_scraped(&t.text))
            .filter(|t| !t.is_empty())
            .collect();

        Ok(ParserResult {
            word_type: Some(word_type).filter(|wt| !wt.is_empty()),
            gender,
            translations,
            audio_url,
            ..Default::default()
        })
    }
}

/// Fetches the corrections Linguee suggests for a misspelt term.
pub async fn did_you_mean(
    client: &HttpClient,
    term: &str,
    pair: LanguagePair,
) -> Result<Vec<String>, ParserError> {
    let url = Url::parse_with_params(
        &format!(
            "https://www.linguee.com/{}-{}/search",
            pair.from.name(),
            pair.to.name()
        ),
        [("source", pair.from.name()), ("query", term.trim())],
    )
    .map_err(|err| ParserError::Parse(Source::Linguee, err.to_string()))?;
    let raw = client.get(&RequestSpec::new(url, LINGUEE_HEADERS)).await?;
    let suggestions = parse_suggestions(&raw.body)?;
    tracing::debug!("Linguee suggests {suggestions:?} for {term}");
    Ok(suggestions)
}

fn parse_suggestions(body: &str) -> Result<Vec<String>, ParserError> {
    let html = Html::parse_document(body);
    let corrected = selector(Source::Linguee, "span.corrected")?;
    let mut suggestions = Vec::new();
    for suggestion in html.select(&corrected).map(element_text) {
        if !suggestion.is_empty() && !suggestions.contains(&suggestion) {
            suggestions.push(suggestion);
        }
    }
    Ok(suggestions)
}
