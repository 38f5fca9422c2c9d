//! ACG core types and functions.

pub mod conjugation;
pub mod language;
pub mod text;
pub mod word;

pub use conjugation::{ConjugationTable, Tense};
pub use language::{Language, LanguagePair, UnsupportedLanguage};
pub use word::{Example, IssueKind, ParserResult, Source, SourceIssue, Word, WordKey};
