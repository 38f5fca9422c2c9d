//! The note fields generated for a word.

use acg_core::{
    text::{html_list, tag_word_in_sentence},
    Word,
};

/// Wrapper for the fields of a word note to make handling them in a typesafe way easier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFields {
    pub word: String,
    pub back: String,
    pub translation: String,
    pub synonym: String,
    pub antonym: String,
    pub example: String,
    pub example_trans: String,
    pub explanation: String,
    pub additional_info: String,
    pub conjugation_table: String,
    pub gender: String,
    pub word_type: String,
    pub audio: String,
    pub image: String,
}

impl WordFields {
    pub fn from_word(word: &Word) -> Self {
        let term = &word.search_term;
        let folder = word.key().folder();

        let example = word
            .examples
            .iter()
            .map(|e| tag_word_in_sentence(&e.text, term))
            .collect::<Vec<_>>();
        let example_trans = word
            .examples
            .iter()
            .filter_map(|e| e.translation.clone())
            .collect::<Vec<_>>();
        let explanation = word
            .explanations
            .iter()
            .map(|e| tag_word_in_sentence(e, term))
            .collect::<Vec<_>>();

        // synonyms and antonyms are followed by their translation where one is known
        let with_translations = |terms: &[String]| {
            terms
                .iter()
                .map(|term| match word.term_translations.get(term) {
                    Some(translation) => format!("{term} ({translation})"),
                    None => term.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let audio_file = format!("{folder}.mp3");
        let audio = if word.media.contains(&audio_file) {
            format!("[sound:{audio_file}]")
        } else {
            String::new()
        };
        let image_file = format!("{folder}.jpg");
        let image = if word.media.contains(&image_file) {
            format!(r#"<img src="{image_file}">"#)
        } else {
            // fall back to the remote image, which Anki shows while online
            word.image_urls
                .first()
                .map(|url| format!(r#"<img src="{url}">"#))
                .unwrap_or_default()
        };

        Self {
            word: term.clone(),
            back: word.translations.first().cloned().unwrap_or_default(),
            translation: word.translations.join(", "),
            synonym: with_translations(&word.synonyms),
            antonym: with_translations(&word.antonyms),
            example: html_list(&example),
            example_trans: html_list(&example_trans),
            explanation: html_list(&explanation),
            additional_info: word.additional_info.replace('\n', "<br>"),
            conjugation_table: word.conj_table_html.clone(),
            gender: word.gender.clone(),
            word_type: word.word_type.clone(),
            audio,
            image,
        }
    }

    /// The value for a field of the note type. Unknown fields have no value.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "word" | "front" => &self.word,
            "back" => &self.back,
            "translation" => &self.translation,
            "synonym" => &self.synonym,
            "antonym" => &self.antonym,
            "example" => &self.example,
            "example_trans" => &self.example_trans,
            "explanation" => &self.explanation,
            "additional_info" => &self.additional_info,
            "conjugation_table" => &self.conjugation_table,
            "gender" => &self.gender,
            "word_type" => &self.word_type,
            "audio" => &self.audio,
            "image" => &self.image,
            _ => return None,
        };
        Some(value)
    }

    /// Values for the given fields in order, empty for unknown fields.
    pub fn to_fields<'a>(&'a self, names: &[String]) -> Vec<&'a str> {
        names
            .iter()
            .map(|name| self.get(name).unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use acg_core::{Example, Language, LanguagePair, ParserResult, WordKey};

    fn word() -> Word {
        let key = WordKey::new("casa", LanguagePair::new(Language::Pt, Language::En));
        let mut word = Word::new(&key);
        word.merge(ParserResult {
            word_type: Some("noun".to_string()),
            gender: Some("f".to_string()),
            translations: vec!["house".to_string(), "home".to_string()],
            examples: vec![
                Example::translated("A Casa é grande.", "The house is big."),
                Example::new("Casamento não."),
            ],
            additional_info: Some("Plural: casas\nSeparação silábica: ca-sa".to_string()),
            image_urls: vec!["https://example.com/casa.jpg".to_string()],
            ..Default::default()
        });
        word
    }

    #[test]
    fn maps_word_onto_fields() {
        let fields = WordFields::from_word(&word());
        assert_eq!(fields.get("front"), Some("casa"));
        assert_eq!(fields.get("word"), Some("casa"));
        assert_eq!(fields.get("back"), Some("house"));
        assert_eq!(fields.translation, "house, home");
        assert!(fields
            .example
            .contains(r#"A <span class="word">Casa</span> é grande."#));
        assert!(fields.example.contains("Casamento não."));
        assert!(fields.example_trans.contains("The house is big."));
        assert_eq!(
            fields.additional_info,
            "Plural: casas<br>Separação silábica: ca-sa"
        );
        assert_eq!(fields.audio, "");
        assert_eq!(fields.image, r#"<img src="https://example.com/casa.jpg">"#);
        assert_eq!(fields.get("kanji"), None);
    }

    #[test]
    fn appends_term_translations() {
        let mut word = word();
        word.synonyms = vec!["lar".to_string(), "moradia".to_string()];
        word.antonyms = vec!["rua".to_string()];
        word.term_translations.insert("lar".to_string(), "home".to_string());
        word.term_translations.insert("rua".to_string(), "street".to_string());
        let fields = WordFields::from_word(&word);
        assert_eq!(fields.synonym, "lar (home), moradia");
        assert_eq!(fields.antonym, "rua (street)");
    }

    #[test]
    fn prefers_downloaded_media() {
        let mut word = word();
        word.media = vec!["casa.mp3".to_string(), "casa.jpg".to_string()];
        let fields = WordFields::from_word(&word);
        assert_eq!(fields.audio, "[sound:casa.mp3]");
        assert_eq!(fields.image, r#"<img src="casa.jpg">"#);
    }

    #[test]
    fn orders_values_by_field_names() {
        let fields = WordFields::from_word(&word());
        let names = ["back", "unknown", "front"].map(String::from);
        assert_eq!(fields.to_fields(&names), vec!["house", "", "casa"]);
    }
}
