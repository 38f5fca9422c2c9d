//! Settings read from the environment, which may be populated from a `.env` file.

use eyre::WrapErr;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub template_dir: PathBuf,
    pub export_dir: PathBuf,
    pub request_timeout: Duration,
    pub download_media: bool,
    pub image_limit: usize,
    /// Whether untranslated examples, synonyms and antonyms are machine translated.
    pub translate: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_vars(|name| env::var(name))
    }

    fn from_vars(var: impl Fn(&str) -> Result<String, env::VarError>) -> eyre::Result<Self> {
        let get = |name: &str, default: &str| -> eyre::Result<String> {
            match var(name) {
                Ok(value) => Ok(value),
                Err(env::VarError::NotPresent) => Ok(default.to_string()),
                Err(err) => Err(err).wrap_err_with(|| format!("Invalid {name}")),
            }
        };
        Ok(Self {
            data_dir: get("ACG_DATA_DIR", "./data/words")?.into(),
            template_dir: get("ACG_TEMPLATE_DIR", "./templates")?.into(),
            export_dir: get("ACG_EXPORT_DIR", "./export")?.into(),
            request_timeout: Duration::from_secs(parse(
                "ACG_REQUEST_TIMEOUT_SECS",
                &get("ACG_REQUEST_TIMEOUT_SECS", "20")?,
            )?),
            download_media: parse("ACG_DOWNLOAD_MEDIA", &get("ACG_DOWNLOAD_MEDIA", "true")?)?,
            image_limit: parse("ACG_IMAGE_LIMIT", &get("ACG_IMAGE_LIMIT", "20")?)?,
            translate: parse("ACG_TRANSLATE", &get("ACG_TRANSLATE", "true")?)?,
        })
    }
}

fn parse<T>(name: &str, value: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .wrap_err_with(|| format!("Invalid {name}: {value}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> eyre::Result<Config> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_vars(|name| vars.get(name).cloned().ok_or(env::VarError::NotPresent))
    }

    #[test]
    fn uses_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data/words"));
        assert_eq!(config.template_dir, PathBuf::from("./templates"));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert!(config.download_media);
        assert_eq!(config.image_limit, 20);
        assert!(config.translate);
    }

    #[test]
    fn reads_variables() {
        let config = config(&[
            ("ACG_DATA_DIR", "/srv/acg"),
            ("ACG_REQUEST_TIMEOUT_SECS", " 5 "),
            ("ACG_DOWNLOAD_MEDIA", "false"),
            ("ACG_TRANSLATE", "false"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/acg"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.download_media);
        assert!(!config.translate);
    }

    #[test]
    fn rejects_invalid_numbers() {
        let err = config(&[("ACG_IMAGE_LIMIT", "many")]).unwrap_err();
        assert!(err.to_string().contains("ACG_IMAGE_LIMIT"));
    }
}
