//! Functionality for exporting words as Anki decks.

pub mod template;
pub mod word;

pub use self::{
    template::{model_from_html, CardModel, HtmlLoader, TemplateError},
    word::WordFields,
};
use crate::store::WordStore;
use acg_core::{Word, WordKey};
use genanki_rs::{Deck, Note, Package};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Path {0} is not valid UTF-8")]
    InvalidPath(PathBuf),
    #[error("Failed to create the Anki package")]
    Anki(#[from] genanki_rs::Error),
}

/// What the exported deck and its note type look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Directory with the `{template}_front.html` and `{template}_back.html` files.
    pub template_dir: PathBuf,
    pub model_name: String,
    pub templates: Vec<String>,
    pub css_file: String,
    pub deck_name: String,
    /// Globally unique Anki model ID. Change it when the fields of the templates change.
    pub model_id: i64,
    pub deck_id: i64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("./templates"),
            model_name: "pt-word".to_string(),
            templates: vec!["meaning-pt".to_string(), "pt-meaning".to_string()],
            css_file: "pt.css".to_string(),
            deck_name: "Portuguese::Vocab".to_string(),
            model_id: 1_607_392_319,
            deck_id: 2_059_400_110,
        }
    }
}

/// A word added to the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnkiCard {
    pub key: WordKey,
    /// Values in the order of the model's fields.
    pub fields: Vec<(String, String)>,
    pub media: Vec<PathBuf>,
}

impl AnkiCard {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    fn guid(&self) -> String {
        format!("acg-{}-{}", self.key.pair, self.key.folder())
    }
}

/// Collects words into a deck and writes them as an `.apkg` package.
pub struct AnkiObject {
    config: ExportConfig,
    model: CardModel,
    store: Option<WordStore>,
    cards: Vec<AnkiCard>,
}

impl AnkiObject {
    /// Builds the note type out of the configured template files.
    pub fn new(config: ExportConfig) -> Result<Self, ExportError> {
        let model = model_from_html(
            &config.template_dir,
            &config.model_name,
            &config.templates,
            config.model_id,
            &config.css_file,
        )?;
        Ok(Self {
            config,
            model,
            store: None,
            cards: Vec::new(),
        })
    }

    /// Attaches the media files the store keeps for each added word.
    pub fn with_media_from(mut self, store: WordStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.model.fields
    }

    /// Adds one note for the word, Anki generates a card from it for every template.
    /// Fields of the note type the word has no value for are left empty.
    pub fn add_card(&mut self, word: &Word) {
        let key = word.key();
        let values = WordFields::from_word(word);
        let fields = self
            .model
            .fields
            .iter()
            .cloned()
            .zip(values.to_fields(&self.model.fields))
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        let media = match &self.store {
            Some(store) => {
                let dir = store.media_dir(&key);
                word.media
                    .iter()
                    .map(|name| dir.join(name))
                    .filter(|path| path.is_file())
                    .collect()
            }
            None => Vec::new(),
        };
        tracing::debug!("Adding {key} to {}", self.config.deck_name);
        self.cards.retain(|card| card.key != key);
        self.cards.push(AnkiCard { key, fields, media });
    }

    pub fn cards(&self) -> &[AnkiCard] {
        &self.cards
    }

    /// Writes the deck to a temporary file next to `path` and moves it into place once complete.
    pub fn write_apkg(&self, path: &Path) -> Result<(), ExportError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .suffix(".apkg")
            .tempfile_in(dir)
            .map_err(|source| ExportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let temp_path = temp
            .path()
            .to_str()
            .ok_or_else(|| ExportError::InvalidPath(temp.path().to_path_buf()))?;

        let mut deck = Deck::new(
            self.config.deck_id,
            &self.config.deck_name,
            "Deck automatically generated by acg",
        );
        for card in &self.cards {
            let guid = card.guid();
            let tag = card.key.pair.to_string();
            let values = card.fields.iter().map(|(_, v)| v.as_str()).collect();
            let note = Note::new_with_options(
                self.model.model.clone(),
                values,
                None,
                Some(vec![tag.as_str()]),
                Some(&guid),
            )?;
            deck.add_note(note);
        }

        let media = self
            .cards
            .iter()
            .flat_map(|card| &card.media)
            .map(|path| {
                path.to_str()
                    .ok_or_else(|| ExportError::InvalidPath(path.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut package = Package::new(vec![deck], media)?;
        package.write_to_file(temp_path)?;

        temp.persist(path).map_err(|err| ExportError::Io {
            path: path.to_path_buf(),
            source: err.error,
        })?;
        tracing::info!("Wrote {} cards to {}", self.cards.len(), path.display());
        Ok(())
    }
}
