// src/words/mod.rs

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crawler::keywords::StopWords;
use crate::error::Result;

static NON_WORD: OnceLock<Regex> = OnceLock::new();

/// One row of the word report.
#[derive(Debug, Serialize, Deserialize)]
struct WordRecord {
    word: String,
    number_of_repetition: u32,
}

/// Word occurrence counts, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCounts {
    entries: Vec<(String, u32)>,
    positions: HashMap<String, usize>,
}

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `word`.
    pub fn add(&mut self, word: &str) {
        match self.positions.get(word) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.positions.insert(word.to_string(), self.entries.len());
                self.entries.push((word.to_string(), 1));
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<u32> {
        self.positions.get(word).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, i.e. the number of tokens seen.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| u64::from(*count)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(word, count)| (word.as_str(), *count))
    }

    /// Drops every word contained in `stop_words`.
    pub fn without_stop_words(self, stop_words: &StopWords) -> Self {
        let mut kept = WordCounts::new();
        for (word, count) in self.entries {
            if !stop_words.contains(&word) {
                kept.positions.insert(word.clone(), kept.entries.len());
                kept.entries.push((word, count));
            }
        }
        kept
    }

    /// Entries ordered by count, most repeated first.
    pub fn into_sorted(self) -> Vec<(String, u32)> {
        sort_by_repetition(self.entries)
    }
}

/// Replaces every non-word character with whitespace and counts the remaining tokens.
/// Case-sensitive, no stemming.
pub fn count_words(text: &str) -> WordCounts {
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w]").unwrap());
    let cleaned = non_word.replace_all(text, " ");

    let mut counts = WordCounts::new();
    for word in cleaned.split_whitespace() {
        counts.add(word);
    }
    counts
}

/// Sorts descending by count. The sort is stable, equal counts keep their order.
pub fn sort_by_repetition(mut entries: Vec<(String, u32)>) -> Vec<(String, u32)> {
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Writes `word,number_of_repetition` rows with a header line.
pub fn write_csv<W: Write>(writer: W, entries: &[(String, u32)]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (word, count) in entries {
        csv_writer.serialize(WordRecord {
            word: word.clone(),
            number_of_repetition: *count,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_path(path: impl AsRef<Path>, entries: &[(String, u32)]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, entries)
}

/// Reads a word report written by [`write_csv`], keeping row order.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<(String, u32)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();
    for record in csv_reader.deserialize() {
        let record: WordRecord = record?;
        entries.push((record.word, record.number_of_repetition));
    }
    Ok(entries)
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Vec<(String, u32)>> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}
