//! Reads lists of search terms from files and user input.

use acg_core::text::clean_term;
use scraper::{ElementRef, Html, Selector};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// The Kindle highlight color used for single words.
pub const DEFAULT_KINDLE_COLOR: &str = "highlight_yellow";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid selector {0}")]
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// A text file with one term per line.
    Text(PathBuf),
    /// Comma separated terms typed by the user.
    TextInput(String),
    /// The HTML notebook export of a Kindle, only highlights in `color` are imported.
    Kindle { path: PathBuf, color: String },
}

impl ImportSource {
    pub fn kindle(path: impl Into<PathBuf>) -> Self {
        Self::Kindle {
            path: path.into(),
            color: DEFAULT_KINDLE_COLOR.to_string(),
        }
    }

    /// The cleaned terms in their original order, without empty entries or duplicates.
    pub fn terms(&self) -> Result<Vec<String>, ImportError> {
        let raw: Vec<String> = match self {
            Self::Text(path) => read(path)?.lines().map(String::from).collect(),
            Self::TextInput(input) => input.split(',').map(String::from).collect(),
            Self::Kindle { path, color } => {
                let mut highlights = kindle_highlights(&read(path)?)?;
                highlights
                    .iter()
                    .position(|(c, _)| c == color)
                    .map(|i| highlights.swap_remove(i).1)
                    .unwrap_or_default()
            }
        };
        let mut terms = Vec::new();
        for term in raw.iter().map(|t| clean_term(t)) {
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        tracing::debug!("Imported {} terms", terms.len());
        Ok(terms)
    }
}

fn read(path: &Path) -> Result<String, ImportError> {
    fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Highlights of a Kindle notebook export grouped by their color, in order of appearance.
///
/// Each highlight has a `div.noteHeading` whose span carries the color as its class,
/// the highlighted text is in the following `div.noteText`.
pub fn kindle_highlights(html: &str) -> Result<Vec<(String, Vec<String>)>, ImportError> {
    let parse = |s: &str| Selector::parse(s).map_err(|err| ImportError::Selector(err.to_string()));
    let heading_span = parse("div.noteHeading span")?;
    let html = Html::parse_document(html);

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for span in html.select(&heading_span) {
        let Some(color) = span.value().classes().next() else {
            continue;
        };
        // skip ahead from the heading to the note text
        let text = span
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|heading| {
                heading
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .next()
            })
            .filter(|next| next.value().classes().any(|class| class == "noteText"))
            .map(|note| note.text().collect::<String>().trim().to_string());
        let Some(text) = text else {
            continue;
        };
        match groups.iter_mut().find(|(c, _)| c == color) {
            Some((_, texts)) => texts.push(text),
            None => groups.push((color.to_string(), vec![text])),
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod test {
    use super::*;

    const NOTEBOOK: &str = r#"<html><body>
<div class="bodyContainer">
<div class="notebookFor">Notebook Export</div>
<div class="sectionHeading">Capítulo 1</div>
<div class="noteHeading">Highlight (<span class="highlight_yellow">yellow</span>) - Location 12</div>
<div class="noteText">Começar,</div>
<div class="noteHeading">Highlight (<span class="highlight_blue">blue</span>) - Location 15</div>
<div class="noteText">de vez em quando</div>
<div class="noteHeading">Highlight (<span class="highlight_yellow">yellow</span>) - Location 20</div>
<div class="noteText">casa</div>
<div class="noteHeading">Highlight (<span class="highlight_yellow">yellow</span>) - Location 31</div>
<div class="noteText">Casa.</div>
</div>
</body></html>"#;

    #[test]
    fn groups_kindle_highlights_by_color() {
        let groups = kindle_highlights(NOTEBOOK).unwrap();
        assert_eq!(
            groups,
            vec![
                (
                    "highlight_yellow".to_string(),
                    vec!["Começar,".to_string(), "casa".to_string(), "Casa.".to_string()]
                ),
                ("highlight_blue".to_string(), vec!["de vez em quando".to_string()]),
            ]
        );
    }

    #[test]
    fn imports_kindle_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notebook.html");
        fs::write(&path, NOTEBOOK).unwrap();
        assert_eq!(
            ImportSource::kindle(&path).terms().unwrap(),
            vec!["começar", "casa"]
        );
        let phrases = ImportSource::Kindle {
            path,
            color: "highlight_pink".to_string(),
        };
        assert!(phrases.terms().unwrap().is_empty());
    }

    #[test]
    fn imports_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "casa\n\nMesa!\n  pão de queijo \ncasa\n").unwrap();
        assert_eq!(
            ImportSource::Text(path).terms().unwrap(),
            vec!["casa", "mesa", "pão de queijo"]
        );
    }

    #[test]
    fn imports_text_input() {
        let input = ImportSource::TextInput("casa, mesa,,  Casa , ¿cadeira?".to_string());
        assert_eq!(input.terms().unwrap(), vec!["casa", "mesa", "cadeira"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = ImportSource::Text(PathBuf::from("/nonexistent/words.txt"));
        assert!(matches!(source.terms(), Err(ImportError::Io { .. })));
    }
}
