//! Persists words as JSON files, one folder per word.
//!
//! The layout is `{root}/{from}-{to}/{folder}/{folder}.json`, media files of the word
//! are stored next to the JSON file.

use acg_core::{Word, WordKey};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid word file {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No stored word for {0}")]
    NotFound(WordKey),
}

#[derive(Debug, Clone)]
pub struct WordStore {
    root: PathBuf,
}

impl WordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The folder holding the word's JSON file and media.
    pub fn media_dir(&self, key: &WordKey) -> PathBuf {
        self.root.join(key.pair.to_string()).join(key.folder())
    }

    pub fn path_for(&self, key: &WordKey) -> PathBuf {
        self.media_dir(key).join(format!("{}.json", key.folder()))
    }

    pub fn exists(&self, key: &WordKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Writes the word to a temporary file in its folder and renames it into place.
    pub fn save_as_json(&self, word: &Word) -> Result<PathBuf, StorageError> {
        let key = word.key();
        let dir = self.media_dir(&key);
        let path = self.path_for(&key);
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        let json = serde_json::to_vec_pretty(word).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err(&dir))?;
        temp.write_all(&json).map_err(io_err(temp.path()))?;
        temp.persist(&path).map_err(|err| StorageError::Io {
            path: path.clone(),
            source: err.error,
        })?;
        tracing::debug!("Saved {key} to {}", path.display());
        Ok(path)
    }

    pub fn from_json(&self, key: &WordKey) -> Result<Word, StorageError> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.clone()))
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&contents).map_err(|source| StorageError::Json { path, source })
    }

    /// Every word stored for any language pair. Unreadable files are skipped with a warning.
    pub fn all_words(&self) -> Result<Vec<Word>, StorageError> {
        let mut words = Vec::new();
        let pairs = match fs::read_dir(&self.root) {
            Ok(pairs) => pairs,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(words),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };
        for pair_dir in pairs.flatten().filter(|e| e.path().is_dir()) {
            let folders = fs::read_dir(pair_dir.path()).map_err(|source| StorageError::Io {
                path: pair_dir.path(),
                source,
            })?;
            for folder in folders.flatten() {
                let name = folder.file_name();
                let path = folder.path().join(format!("{}.json", name.to_string_lossy()));
                if !path.is_file() {
                    continue;
                }
                let word = fs::read_to_string(&path)
                    .map_err(|err| err.to_string())
                    .and_then(|s| serde_json::from_str::<Word>(&s).map_err(|err| err.to_string()));
                match word {
                    Ok(word) => words.push(word),
                    Err(err) => tracing::warn!("Skipping {}: {err}", path.display()),
                }
            }
        }
        words.sort_by(|a, b| a.search_term.cmp(&b.search_term));
        Ok(words)
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io { path, source }
}

#[cfg(test)]
mod test {
    use super::*;
    use acg_core::{Example, IssueKind, Language, LanguagePair, ParserResult, Source};

    fn populated_word() -> Word {
        let key = WordKey::new("pão de queijo", LanguagePair::new(Language::Pt, Language::En));
        let mut word = Word::new(&key);
        word.merge(ParserResult {
            word_type: Some("noun".to_string()),
            gender: Some("m".to_string()),
            translations: vec!["cheese bread".to_string()],
            examples: vec![Example::translated("Comi pão de queijo.", "I ate cheese bread.")],
            explanations: vec!["Pequeno pão feito com polvilho e queijo".to_string()],
            image_urls: vec!["https://example.com/pao.jpg".to_string()],
            audio_url: Some("https://www.linguee.de/mp3/PT_BR/p1.mp3".to_string()),
            ..Default::default()
        });
        word.media.push("pao_de_queijo.mp3".to_string());
        word.record_issue(Source::Reverso, IssueKind::Failed, "status 503");
        word
    }

    #[test]
    fn places_words_by_pair_and_folder() {
        let store = WordStore::new("/data/words");
        let key = WordKey::new("Começar", LanguagePair::new(Language::Pt, Language::De));
        assert_eq!(
            store.path_for(&key),
            PathBuf::from("/data/words/pt-de/comecar/comecar.json")
        );
    }

    #[test]
    fn roundtrips_populated_word() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordStore::new(dir.path());
        let word = populated_word();
        let key = word.key();
        assert!(!store.exists(&key));

        let path = store.save_as_json(&word).unwrap();
        assert!(store.exists(&key));
        assert_eq!(path, store.path_for(&key));
        assert_eq!(store.from_json(&key).unwrap(), word);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordStore::new(dir.path());
        let mut word = populated_word();
        store.save_as_json(&word).unwrap();
        word.translations.push("pão".to_string());
        store.save_as_json(&word).unwrap();
        assert_eq!(store.from_json(&word.key()).unwrap(), word);
        // only the json file remains, no temporary files
        assert_eq!(fs::read_dir(store.media_dir(&word.key())).unwrap().count(), 1);
    }

    #[test]
    fn missing_word_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordStore::new(dir.path());
        let key = WordKey::new("casa", LanguagePair::new(Language::Pt, Language::En));
        assert!(matches!(store.from_json(&key), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordStore::new(dir.path());
        let key = WordKey::new("casa", LanguagePair::new(Language::Pt, Language::En));
        fs::create_dir_all(store.media_dir(&key)).unwrap();
        fs::write(store.path_for(&key), "{ not json").unwrap();
        assert!(matches!(store.from_json(&key), Err(StorageError::Json { .. })));
    }

    #[test]
    fn lists_all_words() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordStore::new(dir.path());
        assert!(store.all_words().unwrap().is_empty());
        let word = populated_word();
        store.save_as_json(&word).unwrap();
        let other = Word::new(&WordKey::new(
            "haus",
            LanguagePair::new(Language::De, Language::En),
        ));
        store.save_as_json(&other).unwrap();
        let words = store.all_words().unwrap();
        assert_eq!(words, vec![other, word]);
    }
}
