//! Website categorization: scrape page text, count words, and assign a domain to a
//! topical category with either a trained TF-IDF + SVM model or a keyword crawl.

pub mod config;
pub mod crawler;
pub mod error;
pub mod indexer;
pub mod interactive;
pub mod logging;
pub mod report;
pub mod words;

pub use error::{Error, Result};
