//! Command line interface for ACG.

mod cli;
mod config;

use acg::{
    anki::{AnkiObject, ExportConfig},
    import::ImportSource,
    parsers::linguee,
    queue::EntryStatus,
    DownloadQueue, HttpClient, Pipeline, Translator, WordStore,
};
use acg_core::{IssueKind, LanguagePair, WordKey};
use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use eyre::WrapErr;
use std::{path::PathBuf, sync::Arc};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = Config::from_env().wrap_err("Invalid configuration")?;

    let client = HttpClient::new(config.request_timeout).wrap_err("Failed to build HTTP client")?;
    let store = WordStore::new(&config.data_dir);
    let mut pipeline = Pipeline::new(client.clone(), store.clone(), config.image_limit)
        .with_media(config.download_media);
    if config.translate {
        pipeline = pipeline.with_translator(Translator::new(client));
    }

    match cli.command {
        Command::Search {
            term,
            from,
            to,
            refresh,
        } => {
            let word = if refresh {
                pipeline.refresh(&term, &from, &to).await
            } else {
                pipeline.search(&term, &from, &to).await
            }
            .wrap_err_with(|| format!("Failed to search for {term}"))?;
            for issue in word.issues.iter().filter(|i| i.kind == IssueKind::Failed) {
                tracing::warn!("{} failed: {}", issue.source, issue.detail);
            }
            println!("{}", serde_json::to_string_pretty(&word)?);
        }
        Command::Queue {
            from,
            to,
            file,
            kindle,
            color,
            words,
        } => {
            let pair = LanguagePair::parse(&from, &to)?;
            let mut sources = Vec::new();
            sources.extend(file.map(ImportSource::Text));
            sources.extend(kindle.map(|path| ImportSource::Kindle { path, color }));
            sources.extend(words.map(ImportSource::TextInput));
            if sources.is_empty() {
                eyre::bail!("Nothing to queue, pass --file, --kindle or --words");
            }
            run_queue(Arc::new(pipeline), &sources, pair).await?;
        }
        Command::Suggest { term, from, to } => {
            let pair = LanguagePair::parse(&from, &to)?;
            let suggestions = linguee::did_you_mean(pipeline.client(), &term, pair)
                .await
                .wrap_err_with(|| format!("Failed to fetch suggestions for {term}"))?;
            if suggestions.is_empty() {
                println!("No suggestions for {term}");
            }
            for suggestion in suggestions {
                println!("{suggestion}");
            }
        }
        Command::Export {
            terms,
            from,
            to,
            deck,
            model,
            templates,
            css,
            output,
        } => {
            let pair = LanguagePair::parse(&from, &to)?;
            let defaults = ExportConfig::default();
            let export = ExportConfig {
                template_dir: config.template_dir.clone(),
                model_name: model.unwrap_or(defaults.model_name),
                templates: if templates.is_empty() {
                    defaults.templates
                } else {
                    templates
                },
                css_file: css.unwrap_or(defaults.css_file),
                deck_name: deck.unwrap_or(defaults.deck_name),
                ..defaults
            };
            let output = output.unwrap_or_else(|| default_output(&config, &export.deck_name));
            export_words(&store, export, pair, &terms, output).await?;
        }
    }

    Ok(())
}

async fn run_queue(
    pipeline: Arc<Pipeline>,
    sources: &[ImportSource],
    pair: LanguagePair,
) -> eyre::Result<()> {
    let (queue, mut events) = DownloadQueue::new(pipeline);
    for source in sources {
        queue
            .import_from(source, pair)
            .wrap_err("Failed to import words")?;
    }

    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.status {
                EntryStatus::Queued => tracing::debug!("Queued {}", event.key),
                EntryStatus::InProgress => tracing::info!("Searching for {}", event.key),
                EntryStatus::Done => tracing::info!("Finished {}", event.key),
                EntryStatus::Error(err) => tracing::warn!("{}: {err}", event.key),
                EntryStatus::Removed => tracing::debug!("Removed {}", event.key),
            }
        }
    });

    queue.start_downloading();
    queue.wait_idle().await;
    let snapshot = queue.snapshot();
    drop(queue);
    progress.await.wrap_err("Progress task failed")?;

    println!("Downloaded {} words", snapshot.done.len());
    for (key, err) in &snapshot.errors {
        println!("Failed {key}: {err}");
    }
    Ok(())
}

async fn export_words(
    store: &WordStore,
    config: ExportConfig,
    pair: LanguagePair,
    terms: &[String],
    output: PathBuf,
) -> eyre::Result<()> {
    let words = if terms.is_empty() {
        store
            .all_words()?
            .into_iter()
            .filter(|word| word.pair == pair)
            .collect::<Vec<_>>()
    } else {
        terms
            .iter()
            .map(|term| store.from_json(&WordKey::new(term, pair)))
            .collect::<Result<Vec<_>, _>>()?
    };
    if words.is_empty() {
        eyre::bail!("No stored words for {pair}");
    }

    let mut anki = AnkiObject::new(config)
        .wrap_err("Failed to load card templates")?
        .with_media_from(store.clone());
    for word in &words {
        anki.add_card(word);
    }
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }

    let path = output.clone();
    tokio::task::spawn_blocking(move || anki.write_apkg(&path))
        .await?
        .wrap_err("Failed to write Anki package")?;
    println!("Exported {} words to {}", words.len(), output.display());
    Ok(())
}

fn default_output(config: &Config, deck_name: &str) -> PathBuf {
    let deck = deck_name.replace("::", "_").replace(' ', "_");
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    config.export_dir.join(format!("{deck}_{timestamp}.apkg"))
}
