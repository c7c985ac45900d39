use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Category keyword lists, in category order. Keywords are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    categories: Vec<(String, Vec<String>)>,
}

impl KeywordSet {
    pub fn new<C, K, W>(categories: C) -> Self
    where
        C: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let categories = categories
            .into_iter()
            .map(|(name, words)| (name, normalize_words(words)))
            .collect();
        Self { categories }
    }

    /// Loads one category per file: the file stem names the category and each
    /// non-blank line is a keyword. Categories are ordered by file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut categories = Vec::new();
        for path in list_files(dir.as_ref())? {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let contents = fs::read_to_string(&path)?;
            let words = normalize_words(contents.lines());
            debug!(target: "crawl", category = name, keywords = words.len(), "loaded keywords");
            categories.push((name.to_string(), words));
        }
        Ok(Self { categories })
    }

    pub fn without_stop_words(self, stop_words: &StopWords) -> Self {
        let categories = self
            .categories
            .into_iter()
            .map(|(name, words)| {
                let words = words.into_iter().filter(|w| !stop_words.contains(w)).collect();
                (name, words)
            })
            .collect();
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Words ignored by the word report and removed from keyword lists.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn from_words<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        Self {
            words: normalize_words(words).into_iter().collect(),
        }
    }

    /// Merges every file in `dir`, one word per line.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut words = HashSet::new();
        for path in list_files(dir.as_ref())? {
            let contents = fs::read_to_string(&path)?;
            words.extend(normalize_words(contents.lines()));
        }
        debug!(target: "crawl", count = words.len(), "loaded stop words");
        Ok(Self { words })
    }

    /// Case-insensitive membership.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn normalize_words<I, W>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = W>,
    W: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
