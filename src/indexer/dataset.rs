use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct DatasetRecord {
    domain: String,
    category: String,
}

/// Training domains grouped by category, categories in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingData {
    categories: Vec<(String, Vec<String>)>,
}

impl TrainingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a `domain,category` CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut data = TrainingData::new();
        for record in csv_reader.deserialize() {
            let record: DatasetRecord = record?;
            data.push(record.category, record.domain);
        }
        Ok(data)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn push(&mut self, category: impl Into<String>, domain: impl Into<String>) {
        let category = category.into();
        let domain = domain.into();
        match self.categories.iter_mut().find(|(name, _)| *name == category) {
            Some((_, domains)) => domains.push(domain),
            None => self.categories.push((category, vec![domain])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, domains)| (name.as_str(), domains.as_slice()))
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn domain_count(&self) -> usize {
        self.categories.iter().map(|(_, d)| d.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
