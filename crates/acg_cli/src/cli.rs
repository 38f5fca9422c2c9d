use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Looks a word up and prints the collected data as JSON.
    Search {
        term: String,
        /// The language of the word.
        #[arg(short, long, default_value = "pt")]
        from: String,
        /// The language to translate to.
        #[arg(short, long, default_value = "en")]
        to: String,
        /// Looks the word up again even if it is stored already.
        #[arg(short, long)]
        refresh: bool,
    },
    /// Downloads a list of words one after another.
    Queue {
        #[arg(short, long, default_value = "pt")]
        from: String,
        #[arg(short, long, default_value = "en")]
        to: String,
        /// A text file with one word per line.
        #[arg(long)]
        file: Option<PathBuf>,
        /// The HTML notebook exported by a Kindle.
        #[arg(short, long)]
        kindle: Option<PathBuf>,
        /// The highlight color of the Kindle notes to import.
        #[arg(short, long, default_value = acg::import::DEFAULT_KINDLE_COLOR)]
        color: String,
        /// Comma separated words.
        #[arg(short, long)]
        words: Option<String>,
    },
    /// Prints the spellings Linguee suggests for a word.
    Suggest {
        term: String,
        #[arg(short, long, default_value = "pt")]
        from: String,
        #[arg(short, long, default_value = "en")]
        to: String,
    },
    /// Exports stored words as an Anki package.
    Export {
        /// The words to export. Exports every stored word of the language pair if empty.
        terms: Vec<String>,
        #[arg(short, long, default_value = "pt")]
        from: String,
        #[arg(short, long, default_value = "en")]
        to: String,
        /// The name of the Anki deck.
        #[arg(short, long)]
        deck: Option<String>,
        /// The name of the Anki note type.
        #[arg(short, long)]
        model: Option<String>,
        /// The card templates to use, each needs a `_front.html` and a `_back.html` file.
        #[arg(long, value_delimiter = ',')]
        templates: Vec<String>,
        /// The stylesheet in the template directory.
        #[arg(long)]
        css: Option<String>,
        /// The path of the output file. Defaults to a timestamped file in the export directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
