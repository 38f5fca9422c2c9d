//! Reverso Context, which finds example sentences together with their translations.

use super::{element_text, selector, Parser, ParserError, Query};
use crate::http::{RawResponse, RequestSpec, REVERSO_HEADERS};
use acg_core::{Example, LanguagePair, ParserResult, Source};
use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;

const BASE_URL: &str = "https://context.reverso.net/translation";

#[derive(Debug, Default)]
pub struct Reverso {
    query: Option<Query>,
}

#[async_trait]
impl Parser for Reverso {
    fn source(&self) -> Source {
        Source::Reverso
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
            .ok_or(ParserError::NotSetUp(Source::Reverso))?;
        let mut url = Url::parse(BASE_URL)
            .map_err(|err| ParserError::Parse(Source::Reverso, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ParserError::Parse(Source::Reverso, "base URL has no path".to_string()))?
            .push(&format!("{}-{}", query.pair.from.name(), query.pair.to.name()))
            .push(&query.phrase);
        Ok(RequestSpec::new(url, REVERSO_HEADERS))
    }

    fn parse_response(&self, raw: &RawResponse) -> Result<ParserResult, ParserError> {
        let src = Source::Reverso;
        let html = Html::parse_document(&raw.body);
        let source_text = selector(src, "div.src")?;
        let target_text = selector(src, "div.trg")?;

        let mut examples = Vec::new();
        for example in html.select(&selector(src, "div.example")?) {
            let Some(text) = example
                .select(&source_text)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
            else {
                continue;
            };
            let translation = example
                .select(&target_text)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty());
            examples.push(Example { text, translation });
        }

        if examples.is_empty() {
            return Err(ParserError::NoMatch(src));
        }
        tracing::debug!("Found {} examples on Reverso", examples.len());
        Ok(ParserResult {
            examples,
            ..Default::default()
        })
    }
}
