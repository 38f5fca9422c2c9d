//! Aggregates the results of all parsers into a [`Word`] and keeps it in the [`WordStore`].

use crate::{
    http::HttpClient,
    parsers::{default_parsers, Parser, ParserError},
    store::{StorageError, WordStore},
    translate::Translate,
};
use acg_core::{IssueKind, LanguagePair, Source, UnsupportedLanguage, Word, WordKey};
use async_trait::async_trait;
use std::{collections::HashMap, path::Path, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0:?} has nothing to search for")]
    EmptyTerm(String),
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("Nothing found for {0}")]
    NothingFound(WordKey),
    #[error("Every source failed for {0}")]
    AllSourcesFailed(WordKey),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Produces a word for a key. Implemented by [`Pipeline`], the download queue only depends on this.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, key: &WordKey) -> Result<Word, SearchError>;
}

pub type ParserFactory = Arc<dyn Fn() -> Vec<Box<dyn Parser>> + Send + Sync>;

pub struct Pipeline {
    client: HttpClient,
    store: WordStore,
    parsers: ParserFactory,
    locks: Mutex<HashMap<WordKey, Arc<Mutex<()>>>>,
    translator: Option<Arc<dyn Translate>>,
    download_media: bool,
}

impl Pipeline {
    pub fn new(client: HttpClient, store: WordStore, image_limit: usize) -> Self {
        Self {
            client,
            store,
            parsers: Arc::new(move || default_parsers(image_limit)),
            locks: Mutex::new(HashMap::new()),
            translator: None,
            download_media: true,
        }
    }

    /// Replaces the parsers every lookup runs, in order.
    pub fn with_parsers(
        mut self,
        factory: impl Fn() -> Vec<Box<dyn Parser>> + Send + Sync + 'static,
    ) -> Self {
        self.parsers = Arc::new(factory);
        self
    }

    /// Whether the audio and the first image are downloaded next to the word file.
    pub fn with_media(mut self, enabled: bool) -> Self {
        self.download_media = enabled;
        self
    }

    /// Translates the examples, synonyms and antonyms the sources left untranslated.
    pub fn with_translator(mut self, translator: impl Translate + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    /// Returns the stored word for the term, looking it up if it has not been stored yet.
    pub async fn search(&self, term: &str, from: &str, to: &str) -> Result<Word, SearchError> {
        let key = WordKey::new(term, LanguagePair::parse(from, to)?);
        self.get_or_fetch(&key, false).await
    }

    /// Looks the term up again and merges the results into the stored word.
    pub async fn refresh(&self, term: &str, from: &str, to: &str) -> Result<Word, SearchError> {
        let key = WordKey::new(term, LanguagePair::parse(from, to)?);
        self.get_or_fetch(&key, true).await
    }

    async fn key_lock(&self, key: &WordKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drops the key's lock from the map unless another search is holding or waiting for it.
    async fn release_key_lock(&self, key: &WordKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // one reference in the map and the one passed in
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    async fn get_or_fetch(&self, key: &WordKey, refresh: bool) -> Result<Word, SearchError> {
        if key.folder().is_empty() {
            return Err(SearchError::EmptyTerm(key.term.clone()));
        }
        // concurrent searches for the same key wait for each other
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.load_or_fetch(key, refresh).await
        };
        self.release_key_lock(key, lock).await;
        result
    }

    async fn load_or_fetch(&self, key: &WordKey, refresh: bool) -> Result<Word, SearchError> {
        let stored = match self.store.from_json(key) {
            Ok(word) => Some(word),
            Err(StorageError::NotFound(_)) => None,
            Err(err) => {
                tracing::warn!("Looking up {key} again, the stored word is unreadable: {err}");
                None
            }
        };
        match stored {
            Some(word) if !refresh => {
                tracing::debug!("Using stored word for {key}");
                Ok(word)
            }
            stored => {
                let word = self.fetch(key, stored).await?;
                self.store.save_as_json(&word)?;
                Ok(word)
            }
        }
    }

    async fn fetch(&self, key: &WordKey, stored: Option<Word>) -> Result<Word, SearchError> {
        tracing::info!("Looking up {key}");
        let mut word = stored.unwrap_or_else(|| Word::new(key));
        word.issues.clear();

        let mut contributed = false;
        for mut parser in (self.parsers)() {
            let source = parser.source();
            match parser.result(&self.client, key).await {
                Ok(result) if !result.is_empty() => {
                    tracing::debug!("{source} found data for {key}");
                    word.merge(result);
                    contributed = true;
                }
                Ok(_) | Err(ParserError::NoMatch(_)) => {
                    tracing::debug!("{source} has nothing for {key}");
                    word.record_issue(source, IssueKind::NoResult, "no match");
                }
                Err(ParserError::UnsupportedLanguage(err)) => {
                    tracing::debug!("{err}");
                    word.record_issue(source, IssueKind::Unsupported, err.to_string());
                }
                Err(err) => {
                    tracing::warn!("{source} failed for {key}: {err}");
                    word.record_issue(source, IssueKind::Failed, error_chain(&err));
                }
            }
        }

        if !contributed {
            return Err(if word.has_warnings() {
                SearchError::AllSourcesFailed(key.clone())
            } else {
                SearchError::NothingFound(key.clone())
            });
        }
        if let Some(translator) = &self.translator {
            add_translations(translator.as_ref(), &mut word).await;
        }
        if self.download_media {
            self.fetch_media(&mut word).await;
        }
        Ok(word)
    }

    /// Downloads the pronunciation and the first image.
    /// Failed downloads are logged and skipped.
    async fn fetch_media(&self, word: &mut Word) {
        let key = word.key();
        let dir = self.store.media_dir(&key);
        let folder = key.folder();

        let mut downloads = Vec::new();
        if !word.audio_url.is_empty() {
            downloads.push((word.audio_url.clone(), format!("{folder}.mp3")));
        }
        if let Some(url) = word.image_urls.first() {
            downloads.push((url.clone(), format!("{folder}.jpg")));
        }

        for (url, name) in downloads {
            if word.media.contains(&name) {
                continue;
            }
            let bytes = match self.client.get_bytes(&url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!("Failed to download {url}: {err}");
                    continue;
                }
            };
            match write_media(&dir, &name, &bytes).await {
                Ok(()) => word.media.push(name),
                Err(err) => tracing::warn!("Failed to save {name} for {key}: {err}"),
            }
        }
    }
}

#[async_trait]
impl Lookup for Pipeline {
    async fn lookup(&self, key: &WordKey) -> Result<Word, SearchError> {
        self.get_or_fetch(key, false).await
    }
}

/// Fills in missing example translations and translates the synonyms and antonyms.
/// Failures are recorded as a warning on the word.
async fn add_translations(translator: &dyn Translate, word: &mut Word) {
    let pair = word.pair;
    let mut failures = Vec::new();
    for example in word.examples.iter_mut().filter(|e| e.translation.is_none()) {
        match translator.translate(&example.text, pair).await {
            Ok(translation) => example.translation = Some(translation),
            Err(err) => failures.push((example.text.clone(), err)),
        }
    }

    let terms = word
        .synonyms
        .iter()
        .chain(&word.antonyms)
        .filter(|term| !word.term_translations.contains_key(*term))
        .cloned()
        .collect::<Vec<_>>();
    for term in terms {
        match translator.translate(&term, pair).await {
            Ok(translation) => {
                word.term_translations.insert(term, translation);
            }
            Err(err) => failures.push((term, err)),
        }
    }

    for (text, err) in failures {
        tracing::warn!("Failed to translate {text:?}: {err}");
        word.record_issue(
            Source::GoogleTranslate,
            IssueKind::Failed,
            format!("{text}: {}", error_chain(&err)),
        );
    }
}

async fn write_media(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), bytes).await
}

/// The error with all of its causes on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
