//! Normalisation of text scraped from dictionary pages.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Punctuation stripped from imported terms.
const TERM_PUNCTUATION: &[char] = &[
    ',', '.', ';', ':', '-', '–', '—', '!', '?', '¿', '¡', '"', '\'', '”', '“',
];

/// Replaces each run of whitespace with a single space,
/// or with a single newline if the run contained one.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE
        .replace_all(text, |caps: &Captures| {
            if caps[0].contains('\n') {
                "\n"
            } else {
                " "
            }
        })
        .trim()
        .to_string()
}

/// Collapses multi-line markup text into one stripped line.
pub fn single_line(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Trims whitespace and trailing punctuation like `,` and `;` that list-style markup leaves behind.
pub fn strip_trailing_punctuation(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | ':') || c.is_whitespace())
        .to_string()
}

/// Normalises a scraped piece of text for storage.
pub fn clean_scraped(text: &str) -> String {
    strip_trailing_punctuation(&single_line(text))
}

/// Cleans up an imported term: surrounding punctuation and whitespace removed, lowercased.
pub fn clean_term(term: &str) -> String {
    term.trim_matches(|c: char| c.is_whitespace() || TERM_PUNCTUATION.contains(&c))
        .to_lowercase()
}

/// Wraps every occurrence of `word` in `sentence` in `<span class="word">`.
///
/// Matching is case insensitive and only whole words are tagged.
/// Each word of a phrase is tagged on its own, in a single pass over the sentence.
pub fn tag_word_in_sentence(sentence: &str, word: &str) -> String {
    let mut parts = word
        .split_whitespace()
        .map(clean_term)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    if parts.is_empty() {
        return sentence.to_string();
    }
    parts.sort_by(|a, b| b.len().cmp(&a.len()));
    parts.dedup();
    let alternation = parts
        .iter()
        .map(|part| regex::escape(part))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(regex) = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")) else {
        return sentence.to_string();
    };
    regex
        .replace_all(sentence, |caps: &Captures| {
            format!(r#"<span class="word">{}</span>"#, &caps[0])
        })
        .into_owned()
}

/// Renders the items as an HTML list.
pub fn html_list(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul>\n");
    for item in items {
        html.push_str(&format!("<li type=\"square\">{item}</li>\n"));
    }
    html.push_str("</ul>\n");
    html
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b  "), "a b");
        assert_eq!(collapse_whitespace("a \n\n  b\n"), "a\nb");
    }

    #[test]
    fn collapses_to_single_line() {
        assert_eq!(single_line("\n  casa\n   grande  "), "casa grande");
    }

    #[test]
    fn strips_trailing_punctuation() {
        assert_eq!(clean_scraped(" lar, \n"), "lar");
        assert_eq!(clean_scraped("moradia;"), "moradia");
        assert_eq!(clean_scraped("e.g. casa"), "e.g. casa");
    }

    #[test]
    fn cleans_terms() {
        assert_eq!(clean_term(" «Casa»,"), "«casa»");
        assert_eq!(clean_term("¿Começar?"), "começar");
        assert_eq!(clean_term("—"), "");
    }

    #[test]
    fn tags_whole_words() {
        assert_eq!(
            tag_word_in_sentence("A casa é uma Casa, não casamento.", "casa"),
            r#"A <span class="word">casa</span> é uma <span class="word">Casa</span>, não casamento."#
        );
    }

    #[test]
    fn tags_each_word_of_a_phrase_once() {
        assert_eq!(
            tag_word_in_sentence("Word class matters.", "word class"),
            r#"<span class="word">Word</span> <span class="word">class</span> matters."#
        );
        assert_eq!(
            tag_word_in_sentence("The span of a class", "class span"),
            r#"The <span class="word">span</span> of a <span class="word">class</span>"#
        );
        assert_eq!(tag_word_in_sentence("Nada aqui", "?!"), "Nada aqui");
    }

    #[test]
    fn renders_html_list() {
        assert_eq!(html_list(&[]), "");
        assert_eq!(
            html_list(&["a".to_string()]),
            "<ul>\n<li type=\"square\">a</li>\n</ul>\n"
        );
    }
}
