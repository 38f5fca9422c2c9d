//! Provides all of ACG's core functionality: looking words up on dictionary sites,
//! translating what they left out, storing the results and exporting them as Anki cards.

pub mod anki;
pub mod http;
pub mod import;
pub mod parsers;
pub mod pipeline;
pub mod queue;
pub mod store;
pub mod translate;

pub use self::{
    http::HttpClient,
    pipeline::{Lookup, Pipeline, SearchError},
    queue::DownloadQueue,
    store::WordStore,
    translate::Translator,
};
