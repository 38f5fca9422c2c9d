//! Verb conjugation tables.

use serde::{Deserialize, Serialize};

/// The persons shown on cards, in display order.
pub const PERSONS: [&str; 4] = ["eu", "ele", "nós", "eles"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationTable {
    pub tenses: Vec<Tense>,
}

/// One column of a conjugation table, e.g. "Presente do Indicativo".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tense {
    pub mood: String,
    pub name: String,
    /// `(person, form)` rows in document order.
    pub forms: Vec<(String, String)>,
}

impl Tense {
    pub fn form(&self, person: &str) -> Option<&str> {
        self.forms
            .iter()
            .find(|(p, _)| p == person)
            .map(|(_, form)| form.as_str())
    }

    fn is_subjunctive(&self) -> bool {
        self.mood.contains("Subjuntivo") || self.name.contains("Subjuntivo")
    }

    fn heading(&self) -> String {
        self.name
            .replace("do Subjuntivo", "")
            .replace("do Indicativo", "")
            .trim()
            .to_string()
    }
}

impl ConjugationTable {
    pub fn is_empty(&self) -> bool {
        self.tenses.is_empty()
    }

    /// Renders one table per tense with rows for [`PERSONS`].
    /// Tenses lacking a person (like the imperative) get an empty cell for it.
    pub fn to_html(&self) -> String {
        self.tenses
            .iter()
            .map(|tense| {
                let class = if tense.is_subjunctive() { "subj" } else { "ind" };
                let rows = PERSONS
                    .iter()
                    .map(|person| {
                        let form = tense.form(person).unwrap_or_default();
                        format!("    <tr>\n      <td>{form}</td>\n    </tr>\n")
                    })
                    .collect::<String>();
                format!(
                    "<table border=\"1\" class=\"dataframe {class}\">\n  <thead>\n    <tr style=\"text-align: right;\">\n      <th>{}</th>\n    </tr>\n  </thead>\n  <tbody>\n{rows}  </tbody>\n</table>",
                    tense.heading()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tense(mood: &str, name: &str) -> Tense {
        Tense {
            mood: mood.to_string(),
            name: name.to_string(),
            forms: vec![
                ("eu".to_string(), "começo".to_string()),
                ("tu".to_string(), "começas".to_string()),
                ("ele".to_string(), "começa".to_string()),
                ("nós".to_string(), "começamos".to_string()),
                ("eles".to_string(), "começam".to_string()),
            ],
        }
    }

    #[test]
    fn renders_tables_per_tense() {
        let table = ConjugationTable {
            tenses: vec![
                tense("Indicativo", "Presente do Indicativo"),
                tense("Subjuntivo", "Presente do Subjuntivo"),
            ],
        };
        let html = table.to_html();
        assert_eq!(html.matches("<table").count(), 2);
        assert!(html.contains("class=\"dataframe ind\""));
        assert!(html.contains("class=\"dataframe subj\""));
        assert!(html.contains("<th>Presente</th>"));
        assert!(html.contains("<td>começamos</td>"));
        // only the four displayed persons are rendered
        assert!(!html.contains("começas"));
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(ConjugationTable::default().to_html(), "");
    }
}
