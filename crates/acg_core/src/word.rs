//! Words and the data collected for them.

use crate::{conjugation::ConjugationTable, language::LanguagePair};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Identifies a word: the search term together with the language pair it was looked up for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordKey {
    pub term: String,
    pub pair: LanguagePair,
}

impl WordKey {
    /// Trims and lowercases the term.
    pub fn new(term: &str, pair: LanguagePair) -> Self {
        Self {
            term: term.trim().to_lowercase(),
            pair,
        }
    }

    /// The name used for the word's storage folder and its files.
    ///
    /// The term transliterated to lowercase ASCII with spaces replaced by underscores.
    pub fn folder(&self) -> String {
        deunicode::deunicode(&self.term)
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.term, self.pair)
    }
}

/// A site data is scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Linguee,
    Dicio,
    Reverso,
    GoogleImages,
    GoogleTranslate,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linguee => "Linguee",
            Self::Dicio => "Dicio",
            Self::Reverso => "Reverso",
            Self::GoogleImages => "Google Images",
            Self::GoogleTranslate => "Google Translate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The source had nothing for the term.
    NoResult,
    /// The source does not handle the language pair.
    Unsupported,
    /// The request or the parsing failed.
    Failed,
}

/// Records that a source did not contribute to a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIssue {
    pub source: Source,
    pub kind: IssueKind,
    pub detail: String,
}

/// An example sentence with an optional translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub translation: Option<String>,
}

impl Example {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: None,
        }
    }

    pub fn translated(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: Some(translation.into()),
        }
    }
}

/// The fields a parser extracted from one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserResult {
    pub word_type: Option<String>,
    pub gender: Option<String>,
    pub translations: Vec<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub examples: Vec<Example>,
    pub explanations: Vec<String>,
    pub additional_info: Option<String>,
    pub conjugation: Option<ConjugationTable>,
    pub image_urls: Vec<String>,
    pub audio_url: Option<String>,
}

impl ParserResult {
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, str::is_empty);
        blank(&self.word_type)
            && blank(&self.gender)
            && self.translations.is_empty()
            && self.synonyms.is_empty()
            && self.antonyms.is_empty()
            && self.examples.is_empty()
            && self.explanations.is_empty()
            && blank(&self.additional_info)
            && self.conjugation.as_ref().map_or(true, ConjugationTable::is_empty)
            && self.image_urls.is_empty()
            && blank(&self.audio_url)
    }
}

/// Everything known about a search term in a language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub search_term: String,
    pub pair: LanguagePair,
    #[serde(default)]
    pub word_type: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub translations: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
    /// Machine translations of the synonyms and antonyms.
    #[serde(default)]
    pub term_translations: BTreeMap<String, String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub conjugation: Option<ConjugationTable>,
    #[serde(default)]
    pub conj_table_html: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub audio_url: String,
    /// Names of media files stored in the word's folder.
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub issues: Vec<SourceIssue>,
}

impl Word {
    pub fn new(key: &WordKey) -> Self {
        Self {
            search_term: key.term.clone(),
            pair: key.pair,
            word_type: String::new(),
            gender: String::new(),
            translations: Vec::new(),
            synonyms: Vec::new(),
            antonyms: Vec::new(),
            term_translations: BTreeMap::new(),
            examples: Vec::new(),
            explanations: Vec::new(),
            additional_info: String::new(),
            conjugation: None,
            conj_table_html: String::new(),
            image_urls: Vec::new(),
            audio_url: String::new(),
            media: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn key(&self) -> WordKey {
        WordKey::new(&self.search_term, self.pair)
    }

    /// Merges a parser's result into the word.
    ///
    /// Non-empty scalar fields are never overwritten.
    /// List fields get new, non-empty values appended.
    pub fn merge(&mut self, result: ParserResult) {
        fill(&mut self.word_type, result.word_type);
        fill(&mut self.gender, result.gender);
        fill(&mut self.additional_info, result.additional_info);
        fill(&mut self.audio_url, result.audio_url);
        append(&mut self.translations, result.translations);
        append(&mut self.synonyms, result.synonyms);
        append(&mut self.antonyms, result.antonyms);
        append(&mut self.explanations, result.explanations);
        append(&mut self.image_urls, result.image_urls);

        for example in result.examples {
            if example.text.is_empty() {
                continue;
            }
            match self.examples.iter_mut().find(|e| e.text == example.text) {
                Some(existing) => {
                    if existing.translation.is_none() {
                        existing.translation = example.translation;
                    }
                }
                None => self.examples.push(example),
            }
        }

        if let Some(table) = result.conjugation.filter(|t| !t.is_empty()) {
            if self.conjugation.as_ref().map_or(true, ConjugationTable::is_empty) {
                self.conj_table_html = table.to_html();
                self.conjugation = Some(table);
            }
        }
    }

    /// Whether any source contributed data to the word.
    pub fn has_data(&self) -> bool {
        !(self.word_type.is_empty()
            && self.gender.is_empty()
            && self.translations.is_empty()
            && self.synonyms.is_empty()
            && self.antonyms.is_empty()
            && self.examples.is_empty()
            && self.explanations.is_empty()
            && self.additional_info.is_empty()
            && self.conj_table_html.is_empty()
            && self.image_urls.is_empty()
            && self.audio_url.is_empty())
    }

    /// Whether a source failed while the word was being looked up.
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::Failed)
    }

    pub fn record_issue(&mut self, source: Source, kind: IssueKind, detail: impl Into<String>) {
        self.issues.push(SourceIssue {
            source,
            kind,
            detail: detail.into(),
        });
    }
}

fn fill(field: &mut String, value: Option<String>) {
    if field.is_empty() {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *field = value;
        }
    }
}

fn append(field: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !value.is_empty() && !field.contains(&value) {
            field.push(value);
        }
    }
}
