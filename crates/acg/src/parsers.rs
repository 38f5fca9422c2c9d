//! Parsers that scrape dictionary and translation sites for data about a word.
//!
//! Each parser is set up for one lookup with [`Parser::setup`], fetches one response with
//! [`Parser::make_request`] and extracts a [`ParserResult`] from it with [`Parser::parse_response`].

pub mod dicio;
pub mod google_images;
pub mod linguee;
pub mod reverso;

pub use dicio::Dicio;
pub use google_images::GoogleImages;
pub use linguee::Linguee;
pub use reverso::Reverso;

use crate::http::{HttpClient, RawResponse, RequestError, RequestSpec};
use acg_core::{LanguagePair, ParserResult, Source, UnsupportedLanguage, WordKey};
use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The site had nothing for the phrase. Recoverable.
    #[error("{0} has no match for the phrase")]
    NoMatch(Source),
    /// The response did not have the expected structure.
    #[error("Failed to parse the response from {0}: {1}")]
    Parse(Source, String),
    #[error("{0} was used before being set up")]
    NotSetUp(Source),
}

/// The phrase and languages a parser was set up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub phrase: String,
    pub pair: LanguagePair,
}

#[async_trait]
pub trait Parser: Send + Sync {
    fn source(&self) -> Source;

    /// Whether the site can handle the language pair.
    fn supports(&self, pair: LanguagePair) -> bool;

    /// Stores a validated query.
    fn configure(&mut self, query: Query);

    fn query(&self) -> Option<&Query>;

    /// Builds the request for the configured query.
    fn request(&self) -> Result<RequestSpec, ParserError>;

    /// Extracts the data from a raw response.
    fn parse_response(&self, raw: &RawResponse) -> Result<ParserResult, ParserError>;

    /// Configures the parser for one lookup.
    /// Fails without touching the network if either language is not supported.
    fn setup(&mut self, phrase: &str, from_lang: &str, to_lang: &str) -> Result<(), ParserError> {
        let pair = LanguagePair::parse(from_lang, to_lang)?;
        if !self.supports(pair) {
            return Err(UnsupportedLanguage::Pair {
                parser: self.source().to_string(),
                from: pair.from,
                to: pair.to,
            }
            .into());
        }
        self.configure(Query {
            phrase: phrase.trim().to_string(),
            pair,
        });
        Ok(())
    }

    async fn make_request(&self, client: &HttpClient) -> Result<RawResponse, ParserError> {
        let spec = self.request()?;
        Ok(client.get(&spec).await?)
    }

    /// Sets up, requests and parses in one go.
    async fn result(
        &mut self,
        client: &HttpClient,
        key: &WordKey,
    ) -> Result<ParserResult, ParserError> {
        self.setup(&key.term, key.pair.from.code(), key.pair.to.code())?;
        let raw = self.make_request(client).await?;
        self.parse_response(&raw)
    }
}

/// The parsers a word is looked up with, in the order they run.
pub fn default_parsers(image_limit: usize) -> Vec<Box<dyn Parser>> {
    vec![
        Box::new(Linguee::default()),
        Box::new(Dicio::default()),
        Box::new(Reverso::default()),
        Box::new(GoogleImages::new(image_limit)),
    ]
}

pub(crate) fn selector(source: Source, selector: &str) -> Result<Selector, ParserError> {
    Selector::parse(selector)
        .map_err(|err| ParserError::Parse(source, format!("invalid selector {selector}: {err}")))
}

/// All text inside the element, collapsed to one stripped line.
pub(crate) fn element_text(element: ElementRef) -> String {
    acg_core::text::single_line(&element.text().collect::<String>())
}

/// Text directly inside the element, ignoring child elements.
pub(crate) fn own_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect()
}

/// The element following this one among its siblings.
pub(crate) fn next_element(element: ElementRef) -> Option<ElementRef> {
    element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod test {
    use super::*;
    use acg_core::Language;

    #[test]
    fn setup_accepts_supported_pairs() {
        let mut parsers = default_parsers(20);
        for parser in &mut parsers {
            for from in Language::ALL {
                for to in Language::ALL {
                    let pair = LanguagePair::new(from, to);
                    let result = parser.setup("casa", from.code(), to.code());
                    if parser.supports(pair) {
                        assert!(result.is_ok(), "{} {pair}", parser.source());
                        assert_eq!(parser.query().unwrap().pair, pair);
                    } else {
                        assert!(
                            matches!(result, Err(ParserError::UnsupportedLanguage(_))),
                            "{} {pair}",
                            parser.source()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn setup_rejects_unknown_codes() {
        for mut parser in default_parsers(20) {
            assert!(matches!(
                parser.setup("casa", "pt", "fr"),
                Err(ParserError::UnsupportedLanguage(UnsupportedLanguage::Code(_)))
            ));
            assert!(matches!(
                parser.setup("casa", "xx", "en"),
                Err(ParserError::UnsupportedLanguage(_))
            ));
        }
    }

    #[test]
    fn request_requires_setup() {
        for parser in default_parsers(20) {
            assert!(matches!(parser.request(), Err(ParserError::NotSetUp(_))));
        }
    }
}
