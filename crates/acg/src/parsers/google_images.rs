//! Image search results from Google.

use super::{Parser, ParserError, Query};
use crate::http::{RawResponse, RequestSpec, DEFAULT_HEADERS};
use acg_core::{LanguagePair, ParserResult, Source};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;

const SEARCH_URL: &str = "https://www.google.com/search";

// full size images are embedded in the page's scripts as ["url",height,width]
static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\["(https?://[^"]+?)",(\d+),(\d+)\]"#).expect("invalid image regex")
});

#[derive(Debug)]
pub struct GoogleImages {
    query: Option<Query>,
    limit: usize,
}

impl GoogleImages {
    /// Collects at most `limit` image URLs per lookup.
    pub fn new(limit: usize) -> Self {
        Self { query: None, limit }
    }
}

#[async_trait]
impl Parser for GoogleImages {
    fn source(&self) -> Source {
        Source::GoogleImages
    }

    fn supports(&self, _pair: LanguagePair) -> bool {
        true
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
            .ok_or(ParserError::NotSetUp(Source::GoogleImages))?;
        let lang = format!("lang_{}", query.pair.from.code());
        let url = Url::parse_with_params(
            SEARCH_URL,
            [
                ("q", query.phrase.as_str()),
                ("tbm", "isch"),
                ("lr", lang.as_str()),
            ],
        )
        .map_err(|err| ParserError::Parse(Source::GoogleImages, err.to_string()))?;
        Ok(RequestSpec::new(url, DEFAULT_HEADERS))
    }

    fn parse_response(&self, raw: &RawResponse) -> Result<ParserResult, ParserError> {
        let mut image_urls: Vec<String> = Vec::new();
        for captures in IMAGE.captures_iter(&raw.body) {
            if image_urls.len() >= self.limit {
                break;
            }
            let url = captures[1]
                .replace(r"\u003d", "=")
                .replace(r"\u0026", "&");
            // thumbnails hosted by google itself
            if url.contains("gstatic.com") || image_urls.contains(&url) {
                continue;
            }
            image_urls.push(url);
        }
        if image_urls.is_empty() {
            return Err(ParserError::NoMatch(Source::GoogleImages));
        }
        Ok(ParserResult {
            image_urls,
            ..Default::default()
        })
    }
}
