//! The fixed set of languages cards can be generated for.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedLanguage {
    #[error("Unsupported language '{0}'")]
    Code(String),
    #[error("{parser} does not support translating from {from} to {to}")]
    Pair {
        parser: String,
        from: Language,
        to: Language,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    De,
    En,
    Es,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Pt, Language::De, Language::En, Language::Es];

    pub fn code(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::De => "de",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Lowercase English name, as used in some of the scraped sites' URLs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pt => "portuguese",
            Self::De => "german",
            Self::En => "english",
            Self::Es => "spanish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt" => Ok(Self::Pt),
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(UnsupportedLanguage::Code(s.to_string())),
        }
    }
}

/// The language a word is looked up in and the language it is translated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub from: Language,
    pub to: Language,
}

impl LanguagePair {
    pub fn new(from: Language, to: Language) -> Self {
        Self { from, to }
    }

    pub fn parse(from: &str, to: &str) -> Result<Self, UnsupportedLanguage> {
        Ok(Self {
            from: from.parse()?,
            to: to.parse()?,
        })
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_supported_codes() {
        for language in Language::ALL {
            assert_eq!(language.code().parse::<Language>().unwrap(), language);
        }
        assert_eq!(" PT ".parse::<Language>().unwrap(), Language::Pt);
    }

    #[test]
    fn rejects_unsupported_codes() {
        assert_eq!(
            "fr".parse::<Language>(),
            Err(UnsupportedLanguage::Code("fr".to_string()))
        );
        assert!(LanguagePair::parse("pt", "xx").is_err());
    }

    #[test]
    fn serializes_as_code() {
        let pair = LanguagePair::new(Language::Pt, Language::En);
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"from":"pt","to":"en"}"#);
        assert_eq!(pair.to_string(), "pt-en");
    }
}
