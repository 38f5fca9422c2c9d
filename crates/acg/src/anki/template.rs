//! Card templates written as HTML files.
//!
//! A template file may pull in other files with `<include src="other.html"></include>` and
//! reference scripts with `<script src="script.js"></script>`. Anki only accepts a single
//! self-contained snippet per card side, so includes and scripts are inlined when the model is built.

use genanki_rs::{Field, Model, Template};
use regex::Regex;
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<include\s+src\s*=\s*["']([^"']+)["']\s*/?>(?:\s*</include>)?"#)
        .expect("invalid include regex")
});
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("invalid script regex")
});
static SCRIPT_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']+)["']"#).expect("invalid src regex")
});
static DEFER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdefer\b").expect("invalid defer regex"));
static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head>").expect("invalid head regex"));
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)</body>").expect("invalid body regex"));
static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]*)\}\}").expect("invalid field regex"));

/// Fields Anki fills in itself.
const SPECIAL_FIELDS: [&str; 7] = [
    "FrontSide", "Tags", "Type", "Deck", "Subdeck", "Card", "CardFlag",
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Template includes form a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("The model {0} has no templates")]
    NoTemplates(String),
}

/// An HTML template file and the directory its includes are resolved against.
#[derive(Debug, Clone)]
pub struct HtmlLoader {
    dir: PathBuf,
    name: String,
    content: String,
}

impl HtmlLoader {
    pub fn load(dir: impl Into<PathBuf>, name: &str) -> Result<Self, TemplateError> {
        let dir = dir.into();
        let content = read(&dir.join(name))?;
        Ok(Self {
            dir,
            name: name.to_string(),
            content,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Names of the note fields the template refers to.
    ///
    /// Section markers (`{{#x}}`, `{{^x}}`, `{{/x}}`) and filters (`{{type:x}}`) are reduced
    /// to the field name, fields Anki provides itself like `FrontSide` are left out.
    /// Fields in included files are not part of the set.
    pub fn set_of_fields(&self) -> BTreeSet<String> {
        fields_in(&self.content)
    }

    /// Resolves includes and inlines scripts, returning the snippet Anki renders.
    ///
    /// Scripts from the head are placed at the start of the body and deferred scripts at its end.
    /// Documents without a body are used as a whole.
    pub fn replace_includes_with_content(&self) -> Result<String, TemplateError> {
        let mut stack = vec![self.name.clone()];
        let resolved = self.resolve_includes(&self.content, &mut stack)?;

        let head = HEAD
            .captures(&resolved)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let body = match BODY.captures(&resolved) {
            Some(captures) => captures[1].to_string(),
            None => HEAD.replace(&resolved, "").into_owned(),
        };

        let mut head_scripts = Vec::new();
        for captures in SCRIPT.captures_iter(&head) {
            let (script, _) = self.inline_script(&captures[1], &captures[2])?;
            head_scripts.push(script);
        }

        let mut deferred = Vec::new();
        let mut content = String::new();
        let mut last = 0;
        for captures in SCRIPT.captures_iter(&body) {
            let Some(tag) = captures.get(0) else {
                continue;
            };
            content.push_str(&body[last..tag.start()]);
            last = tag.end();
            let (script, defer) = self.inline_script(&captures[1], &captures[2])?;
            if defer {
                deferred.push(script);
            } else {
                content.push_str(&script);
            }
        }
        content.push_str(&body[last..]);

        let mut parts = head_scripts;
        parts.push(content.trim().to_string());
        parts.extend(deferred);
        Ok(parts.join("\n"))
    }

    /// Replaces include tags with the file contents, depth first.
    /// `stack` holds the files currently being resolved.
    fn resolve_includes(
        &self,
        content: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, TemplateError> {
        let mut resolved = String::new();
        let mut last = 0;
        for captures in INCLUDE.captures_iter(content) {
            let Some(tag) = captures.get(0) else {
                continue;
            };
            let name = captures[1].trim().to_string();
            if stack.contains(&name) {
                let mut cycle = stack.clone();
                cycle.push(name);
                return Err(TemplateError::Cycle(cycle));
            }
            let included = read(&self.dir.join(&name))?;
            stack.push(name);
            let included = self.resolve_includes(&included, stack)?;
            stack.pop();

            resolved.push_str(&content[last..tag.start()]);
            resolved.push_str(included.trim());
            last = tag.end();
        }
        resolved.push_str(&content[last..]);
        Ok(resolved)
    }

    /// Returns the script tag with the referenced file inlined, and whether it was deferred.
    fn inline_script(&self, attrs: &str, body: &str) -> Result<(String, bool), TemplateError> {
        let defer = DEFER.is_match(attrs);
        let attrs = DEFER.replace_all(attrs, "");
        let (attrs, body) = match SCRIPT_SRC.captures(&attrs) {
            Some(captures) => {
                let source = read(&self.dir.join(&captures[1]))?;
                (SCRIPT_SRC.replace_all(&attrs, "").into_owned(), source)
            }
            None => (attrs.to_string(), body.to_string()),
        };
        let attrs = attrs.split_whitespace().collect::<Vec<_>>().join(" ");
        let open = if attrs.is_empty() {
            "<script>".to_string()
        } else {
            format!("<script {attrs}>")
        };
        Ok((format!("{open}{}</script>", body.trim()), defer))
    }
}

fn read(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// An Anki model together with the names of its fields, in order.
#[derive(Clone)]
pub struct CardModel {
    pub model: Model,
    pub fields: Vec<String>,
}

fn fields_in(content: &str) -> BTreeSet<String> {
    FIELD
        .captures_iter(content)
        .filter_map(|captures| {
            let tag = captures[1].trim().trim_start_matches(['#', '^', '/']);
            let name = tag.rsplit(':').next().unwrap_or(tag).trim();
            (!name.is_empty() && !SPECIAL_FIELDS.contains(&name)).then(|| name.to_string())
        })
        .collect()
}

/// Builds a model out of `{template}_front.html` and `{template}_back.html` files in `dir`.
///
/// The fields are every field the templates refer to, in reverse alphabetical order.
pub fn model_from_html(
    dir: &Path,
    name: &str,
    template_names: &[String],
    model_id: i64,
    css_file: &str,
) -> Result<CardModel, TemplateError> {
    if template_names.is_empty() {
        return Err(TemplateError::NoTemplates(name.to_string()));
    }

    let mut fields = BTreeSet::new();
    let mut templates = Vec::new();
    for template_name in template_names {
        let front = HtmlLoader::load(dir, &format!("{template_name}_front.html"))?
            .replace_includes_with_content()?;
        let back = HtmlLoader::load(dir, &format!("{template_name}_back.html"))?
            .replace_includes_with_content()?;
        // included files may reference fields too
        fields.extend(fields_in(&front));
        fields.extend(fields_in(&back));
        templates.push(Template::new(template_name).qfmt(&front).afmt(&back));
    }
    let fields = fields.into_iter().rev().collect::<Vec<_>>();
    tracing::debug!("Model {name} has the fields {fields:?}");

    let css = read(&dir.join(css_file))?;
    let model = Model::new(
        model_id,
        name,
        fields.iter().map(|f| Field::new(f)).collect(),
        templates,
    )
    .css(&css);
    Ok(CardModel { model, fields })
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn collects_fields() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[(
                "card.html",
                "{{FrontSide}}<hr>{{#image}}{{image}}{{/image}} {{ type:word }} {{^gender}}-{{/gender}} {{furigana:translation}}",
            )],
        );
        let loader = HtmlLoader::load(dir.path(), "card.html").unwrap();
        let fields = loader.set_of_fields();
        assert_eq!(
            fields.into_iter().collect::<Vec<_>>(),
            vec!["gender", "image", "translation", "word"]
        );
    }

    #[test]
    fn resolves_nested_includes() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                ("front.html", r#"<div>{{word}}</div><include src="media.html"></include>"#),
                ("media.html", "<div>{{image}}</div>\n<include src=\"audio.html\"/>\n"),
                ("audio.html", "{{audio}}"),
            ],
        );
        let loader = HtmlLoader::load(dir.path(), "front.html").unwrap();
        assert_eq!(
            loader.replace_includes_with_content().unwrap(),
            "<div>{{word}}</div><div>{{image}}</div>\n{{audio}}"
        );
    }

    #[test]
    fn detects_include_cycles() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                ("front.html", r#"<include src="a.html"></include>"#),
                ("a.html", r#"<include src="b.html"></include>"#),
                ("b.html", r#"<include src="a.html"></include>"#),
            ],
        );
        let loader = HtmlLoader::load(dir.path(), "front.html").unwrap();
        match loader.replace_includes_with_content() {
            Err(TemplateError::Cycle(cycle)) => {
                assert_eq!(cycle, vec!["front.html", "a.html", "b.html", "a.html"])
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_include_is_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &[("front.html", r#"<include src="front.html">"#)]);
        let loader = HtmlLoader::load(dir.path(), "front.html").unwrap();
        assert!(matches!(
            loader.replace_includes_with_content(),
            Err(TemplateError::Cycle(_))
        ));
    }

    #[test]
    fn inlines_and_orders_scripts() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                (
                    "back.html",
                    r#"<html>
<head><script src="setup.js"></script></head>
<body>
<script defer src="late.js"></script>
<div>{{back}}</div>
<script>inline();</script>
</body>
</html>"#,
                ),
                ("setup.js", "setup();\n"),
                ("late.js", "late();"),
            ],
        );
        let loader = HtmlLoader::load(dir.path(), "back.html").unwrap();
        assert_eq!(
            loader.replace_includes_with_content().unwrap(),
            "<script>setup();</script>\n<div>{{back}}</div>\n<script>inline();</script>\n<script>late();</script>"
        );
    }

    #[test]
    fn missing_include_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &[("front.html", r#"<include src="nope.html"></include>"#)]);
        let loader = HtmlLoader::load(dir.path(), "front.html").unwrap();
        assert!(matches!(
            loader.replace_includes_with_content(),
            Err(TemplateError::Io { .. })
        ));
    }

    #[test]
    fn builds_model_from_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                ("basic_front.html", "{{front}}"),
                ("basic_back.html", "{{FrontSide}}<hr id=answer>{{back}}"),
                ("reverse_front.html", "{{back}}"),
                ("reverse_back.html", "{{FrontSide}}<hr id=answer>{{front}} {{audio}}"),
                ("style.css", ".card { text-align: center; }"),
            ],
        );
        let templates = vec!["basic".to_string(), "reverse".to_string()];
        let model = model_from_html(dir.path(), "basic", &templates, 1, "style.css").unwrap();
        assert_eq!(model.fields, vec!["front", "back", "audio"]);

        assert!(matches!(
            model_from_html(dir.path(), "basic", &[], 1, "style.css"),
            Err(TemplateError::NoTemplates(_))
        ));
        assert!(matches!(
            model_from_html(dir.path(), "basic", &templates, 1, "missing.css"),
            Err(TemplateError::Io { .. })
        ));
    }

    #[test]
    fn counts_fields_of_included_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            &[
                ("card_front.html", r#"{{word}}<include src="extra.html"></include>"#),
                ("card_back.html", "{{FrontSide}}"),
                ("extra.html", "{{#gender}}{{gender}}{{/gender}}"),
                ("style.css", ""),
            ],
        );
        let model =
            model_from_html(dir.path(), "card", &["card".to_string()], 1, "style.css").unwrap();
        assert_eq!(model.fields, vec!["word", "gender"]);
    }

    #[test]
    fn bundled_templates_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let templates = vec!["meaning-pt".to_string(), "pt-meaning".to_string()];
        let model = model_from_html(&dir, "pt-word", &templates, 1, "pt.css").unwrap();
        assert_eq!(model.fields.first().map(String::as_str), Some("word_type"));
        assert!(model.fields.iter().any(|f| f == "conjugation_table"));
    }
}
