//! Dicio, a monolingual Portuguese dictionary.
//! Provides explanations, examples, synonyms, antonyms and conjugation tables.

use super::{element_text, next_element, own_text, selector, Parser, ParserError, Query};
use crate::http::{HttpClient, RawResponse, RequestSpec, DEFAULT_HEADERS};
use acg_core::{
    text::{clean_scraped, collapse_whitespace},
    ConjugationTable, Example, Language, LanguagePair, ParserResult, Source, Tense,
};
use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;

const BASE_URL: &str = "https://www.dicio.com.br";
const PERSONS: [&str; 6] = ["eu", "tu", "ele", "nós", "vós", "eles"];
const CONJUNCTIONS: [&str; 3] = ["que", "se", "quando"];

#[derive(Debug, Default)]
pub struct Dicio {
    query: Option<Query>,
}

impl Dicio {
    /// The "did you mean" link Dicio shows instead of an entry when the spelling is off.
    fn suggestion(&self, raw: &RawResponse) -> Result<Option<Url>, ParserError> {
        let html = Html::parse_document(&raw.body);
        let sugg = selector(Source::Dicio, "a._sugg")?;
        let Some(href) = html
            .select(&sugg)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            return Ok(None);
        };
        let base = Url::parse(BASE_URL)
            .map_err(|err| ParserError::Parse(Source::Dicio, err.to_string()))?;
        let url = base
            .join(href)
            .map_err(|err| ParserError::Parse(Source::Dicio, err.to_string()))?;
        Ok(Some(url))
    }
}

#[async_trait]
impl Parser for Dicio {
    fn source(&self) -> Source {
        Source::Dicio
    }

    fn supports(&self, pair: LanguagePair) -> bool {
        pair.from == Language::Pt
    }

    fn configure(&mut self, query: Query) {
        self.query = Some(query);
    }

    fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    fn request(&self) -> Result<RequestSpec, ParserError> {
        let query = self.query.as_ref().ok_or(ParserError::NotSetUp(Source::Dicio))?;
        let phrase = query.phrase.replace(' ', "-");
        let url = Url::parse_with_params(&format!("{BASE_URL}/pesquisa.php"), [("q", phrase)])
            .map_err(|err| ParserError::Parse(Source::Dicio, err.to_string()))?;
        Ok(RequestSpec::new(url, DEFAULT_HEADERS))
    }

    /// Follows the suggestion link once if the search landed on a suggestion page.
    async fn make_request(&self, client: &HttpClient) -> Result<RawResponse, ParserError> {
        let raw = client.get(&self.request()?).await?;
        match self.suggestion(&raw)? {
            Some(url) => {
                tracing::debug!("Following Dicio suggestion {url}");
                Ok(client.get(&RequestSpec::new(url, DEFAULT_HEADERS)).await?)
            }
            None => Ok(raw),
        }
    }

    fn parse_response(&self, raw: &RawResponse) -> Result<ParserResult, ParserError> {
        let src = Source::Dicio;
        let html = Html::parse_document(&raw.body);

        let explanations = html
            .select(&selector(src, ".significado > span:not(.cl)")?)
            .map(element_text)
            .map(|e| clean_scraped(&e))
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>();

        let examples = html
            .select(&selector(src, ".tit-frases + .frases .frase")?)
            .map(element_text)
            .filter(|e| !e.is_empty())
            .map(Example::new)
            .collect::<Vec<_>>();

        let mut synonyms = Vec::new();
        let mut antonyms = Vec::new();
        let link = selector(src, "a")?;
        for paragraph in html.select(&selector(src, "p.sinonimos")?) {
            let label = own_text(paragraph).to_lowercase();
            let target = if label.contains("contr") {
                &mut antonyms
            } else if label.contains("sin") {
                &mut synonyms
            } else {
                continue;
            };
            target.extend(
                paragraph
                    .select(&link)
                    .map(element_text)
                    .map(|s| clean_scraped(&s))
                    .filter(|s| !s.is_empty()),
            );
        }

        let additional_info = html
            .select(&selector(src, "h2.tit-section + p.adicional")?)
            .next()
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|p| !p.is_empty());

        let conjugation = conjugation_table(&html)?;

        let result = ParserResult {
            explanations,
            examples,
            synonyms,
            antonyms,
            additional_info,
            conjugation,
            ..Default::default()
        };
        if result.is_empty() {
            return Err(ParserError::NoMatch(src));
        }
        Ok(result)
    }
}

/// Reads the indicative and subjunctive sections of the conjugation table, if any.
fn conjugation_table(html: &Html) -> Result<Option<ConjugationTable>, ParserError> {
    let src = Source::Dicio;
    let li = selector(src, "li")?;
    let mut tenses = Vec::new();
    // the first two moods are the indicative and the subjunctive
    for modo in html.select(&selector(src, "div.modo")?).take(2) {
        let mood = element_text(modo);
        let Some(columns) = next_element(modo) else {
            continue;
        };
        for column in columns.select(&li) {
            let mut strings = column
                .text()
                .map(str::trim)
                .filter(|s| !s.is_empty());
            let Some(name) = strings.next() else {
                continue;
            };
            let forms = conjugation_rows(strings);
            if !forms.is_empty() {
                tenses.push(Tense {
                    mood: mood.clone(),
                    name: name.to_string(),
                    forms,
                });
            }
        }
    }
    if tenses.is_empty() {
        tracing::debug!("No conjugation table found");
        return Ok(None);
    }
    Ok(Some(ConjugationTable { tenses }))
}

/// Splits the text of a tense column into `(person, form)` rows.
/// Every person pronoun starts a new row, forms may span several words.
/// Conjunctions in front of a pronoun ("que eu comece") are not part of the form.
fn conjugation_rows<'a>(strings: impl Iterator<Item = &'a str>) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut tokens = strings.flat_map(str::split_whitespace).peekable();
    while let Some(token) = tokens.next() {
        if PERSONS.contains(&token) {
            rows.push((token.to_string(), String::new()));
            continue;
        }
        let before_person = tokens.peek().is_some_and(|next| PERSONS.contains(next));
        if before_person && CONJUNCTIONS.contains(&token) {
            continue;
        }
        if let Some((_, form)) = rows.last_mut() {
            if !form.is_empty() {
                form.push(' ');
            }
            form.push_str(token);
        }
    }
    rows.retain(|(_, form)| !form.is_empty());
    rows
}

#[cfg(test)]
mod test {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<h1>Começar</h1>
<p class="significado textonovo">
    <span class="cl">verbo transitivo direto</span>
    <span>Dar início a; principiar,
        iniciar.</span>
    <span>Estar no princípio de;</span>
</p>
<p class="adicional sinonimos">começar é sinônimo de: <a href="/iniciar/">iniciar</a>, <a href="/principiar/">principiar</a></p>
<p class="adicional sinonimos">começar é o contrário de: <a href="/acabar/">acabar</a></p>
<h3 class="tit-frases">Frases com começar</h3>
<div class="frases">
    <div class="frase">Vamos começar   de novo. <em>- Autor</em></div>
    <div class="frase">Começar é difícil.</div>
</div>
<h2 class="tit-section">Definição de Começar</h2>
<p class="adicional">Classe gramatical: verbo
    Separação silábica: co-me-çar</p>
<div class="modo">Indicativo</div>
<ul class="tempos">
    <li><span class="tempo-conjugacao">Presente do Indicativo</span>
        eu <a href="/comeco/">começo</a><br>tu começas<br>ele começa<br>nós começamos<br>vós começais<br>eles começam</li>
    <li><span class="tempo-conjugacao">Pretérito Perfeito</span>
        eu comecei<br>tu começaste<br>ele começou<br>nós começamos<br>vós começastes<br>eles começaram</li>
</ul>
<div class="modo">Subjuntivo</div>
<ul class="tempos">
    <li><span class="tempo-conjugacao">Presente do Subjuntivo</span>
        que eu comece<br>que tu comeces<br>que ele comece<br>que nós comecemos<br>que vós comeceis<br>que eles comecem</li>
</ul>
<div class="modo">Imperativo</div>
<ul class="tempos">
    <li><span class="tempo-conjugacao">Imperativo Afirmativo</span>começa tu</li>
</ul>
</body></html>
"#;

    fn dicio() -> Dicio {
        let mut dicio = Dicio::default();
        dicio.setup("começar", "pt", "en").unwrap();
        dicio
    }

    #[test]
    fn parses_entry() {
        let raw = RawResponse::ok("https://www.dicio.com.br/comecar/", "text/html", PAGE);
        let result = dicio().parse_response(&raw).unwrap();
        assert_eq!(
            result.explanations,
            vec!["Dar início a; principiar, iniciar", "Estar no princípio de"]
        );
        assert_eq!(result.synonyms, vec!["iniciar", "principiar"]);
        assert_eq!(result.antonyms, vec!["acabar"]);
        assert_eq!(
            result.examples,
            vec![
                Example::new("Vamos começar de novo. - Autor"),
                Example::new("Começar é difícil."),
            ]
        );
        assert_eq!(
            result.additional_info.as_deref(),
            Some("Classe gramatical: verbo\nSeparação silábica: co-me-çar")
        );
    }

    #[test]
    fn parses_conjugation_table() {
        let raw = RawResponse::ok("https://www.dicio.com.br/comecar/", "text/html", PAGE);
        let table = dicio().parse_response(&raw).unwrap().conjugation.unwrap();
        // the imperative is not included
        assert_eq!(table.tenses.len(), 3);
        let present = &table.tenses[0];
        assert_eq!(present.mood, "Indicativo");
        assert_eq!(present.name, "Presente do Indicativo");
        assert_eq!(present.form("eu"), Some("começo"));
        assert_eq!(present.form("eles"), Some("começam"));
        let subjunctive = &table.tenses[2];
        assert_eq!(subjunctive.mood, "Subjuntivo");
        assert_eq!(subjunctive.form("nós"), Some("comecemos"));
        assert!(table.to_html().contains("class=\"dataframe subj\""));
    }

    #[test]
    fn splits_rows_on_pronouns() {
        let rows = conjugation_rows(["que eu comece", "que tu", "comeces"].into_iter());
        assert_eq!(
            rows,
            vec![
                ("eu".to_string(), "comece".to_string()),
                ("tu".to_string(), "comeces".to_string()),
            ]
        );
    }

    #[test]
    fn empty_page_is_no_match() {
        let raw = RawResponse::ok(
            "https://www.dicio.com.br/pesquisa.php?q=xyz",
            "text/html",
            "<html><body><p>Nenhum resultado</p></body></html>",
        );
        assert!(matches!(
            dicio().parse_response(&raw),
            Err(ParserError::NoMatch(Source::Dicio))
        ));
    }

    #[test]
    fn finds_suggestion_link() {
        let raw = RawResponse::ok(
            "https://www.dicio.com.br/pesquisa.php?q=comecar",
            "text/html",
            r#"<html><body>Você quis dizer <a class="_sugg" href="/comecar/">começar</a>?</body></html>"#,
        );
        let url = dicio().suggestion(&raw).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://www.dicio.com.br/comecar/");
    }

    #[test]
    fn only_supports_portuguese() {
        let mut dicio = Dicio::default();
        assert!(dicio.setup("casa", "pt", "de").is_ok());
        assert!(matches!(
            dicio.setup("house", "en", "pt"),
            Err(ParserError::UnsupportedLanguage(_))
        ));
    }
}
