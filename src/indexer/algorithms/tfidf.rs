use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::SparseVector;
use crate::error::{Error, Result};

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

/// TF-IDF vectorizer with document-frequency bounds.
///
/// Text is lower-cased and split into runs of two or more word characters. Term
/// weights are raw counts times the smoothed idf `ln((1 + n) / (1 + df)) + 1`, and
/// every vector is L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Drop terms found in fewer than this share of documents.
    min_df: f64,
    /// Drop terms found in more than this share of documents.
    max_df: f64,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new(min_df: f64, max_df: f64) -> Self {
        Self {
            min_df,
            max_df,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Number of features, i.e. vocabulary size.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    /// Learns vocabulary and idf weights from `documents`, replacing any previous fit.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        let n_docs = documents.len();
        let term_counts: Vec<HashMap<String, u32>> =
            documents.par_iter().map(|doc| count_terms(doc)).collect();

        let mut doc_frequencies: HashMap<&str, usize> = HashMap::new();
        for counts in &term_counts {
            for term in counts.keys() {
                *doc_frequencies.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let max_count = self.max_df * n_docs as f64;
        let min_count = self.min_df * n_docs as f64;
        // Sorted so feature indices do not depend on hash order.
        let kept: BTreeSet<&str> = doc_frequencies
            .iter()
            .filter(|&(_, &df)| df as f64 <= max_count && df as f64 >= min_count)
            .map(|(&term, _)| term)
            .collect();

        if kept.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, term) in kept.into_iter().enumerate() {
            let df = doc_frequencies[term] as f64;
            idf.push(((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), index);
        }

        self.vocabulary = vocabulary;
        self.idf = idf;
        Ok(())
    }

    /// Weights `text` against the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut vector: SparseVector = count_terms(text)
            .into_iter()
            .filter_map(|(term, count)| {
                let &index = self.vocabulary.get(&term)?;
                Some((index, count as f64 * self.idf.get(index)?))
            })
            .collect();
        vector.sort_unstable_by_key(|&(index, _)| index);

        let norm = vector.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }

    /// Verifies that the vocabulary and idf table describe the same feature space.
    pub fn check(&self) -> Result<()> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(Error::CorruptModel(format!(
                "{} vocabulary terms for {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        if let Some((term, &index)) = self
            .vocabulary
            .iter()
            .find(|&(_, &index)| index >= self.idf.len())
        {
            return Err(Error::CorruptModel(format!(
                "term `{term}` maps to feature {index} of {}",
                self.idf.len()
            )));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(Error::CorruptModel("non-finite idf weight".to_string()));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_term(&mut self, term: &str, index: usize) {
        self.vocabulary.insert(term.to_string(), index);
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        Ok(documents.par_iter().map(|doc| self.transform(doc)).collect())
    }
}

fn count_terms(text: &str) -> HashMap<String, u32> {
    let pattern = TOKEN_PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").unwrap());
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in pattern.find_iter(&lowered) {
        *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn common_terms_are_pruned_by_max_df() {
        let documents = docs(&[
            "shared football goal",
            "shared election vote",
            "shared compiler rust",
            "shared recipe pasta",
        ]);
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        vectorizer.fit(&documents).unwrap();

        assert!(!vectorizer.vocabulary().contains_key("shared"));
        assert!(vectorizer.vocabulary().contains_key("football"));
        assert_eq!(vectorizer.dimension(), 8);
    }

    #[test]
    fn single_character_tokens_are_ignored() {
        let mut vectorizer = TfidfVectorizer::new(0.0, 1.0);
        vectorizer.fit(&docs(&["a bb C dd"])).unwrap();
        let mut terms: Vec<_> = vectorizer.vocabulary().keys().cloned().collect();
        terms.sort();
        assert_eq!(terms, vec!["bb", "dd"]);
    }

    #[test]
    fn vectors_are_unit_length() {
        let documents = docs(&["goal goal match", "vote election", "rust cargo", "pasta sauce"]);
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        let vectors = vectorizer.fit_transform(&documents).unwrap();
        for vector in &vectors {
            let norm: f64 = vector.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        // "goal" appears twice as often as "match" with the same idf.
        let first = &vectors[0];
        let goal = vectorizer.vocabulary()["goal"];
        let matched = vectorizer.vocabulary()["match"];
        let weight = |i| first.iter().find(|(j, _)| *j == i).unwrap().1;
        assert!((weight(goal) - 2.0 * weight(matched)).abs() < 1e-12);
    }

    #[test]
    fn unknown_terms_give_an_empty_vector() {
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        vectorizer
            .fit(&docs(&["goal", "vote", "rust", "pasta"]))
            .unwrap();
        assert!(vectorizer.transform("nothing known here").is_empty());
        assert!(vectorizer.transform("").is_empty());
    }

    #[test]
    fn too_few_documents_leave_no_terms() {
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        let err = vectorizer.fit(&docs(&["goal", "vote", "rust"])).unwrap_err();
        assert!(matches!(err, Error::EmptyVocabulary));
    }

    #[test]
    fn fitted_vectorizer_passes_its_own_check() {
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        vectorizer
            .fit(&docs(&["goal", "vote", "rust", "pasta"]))
            .unwrap();
        vectorizer.check().unwrap();
    }

    #[test]
    fn term_past_the_idf_table_is_caught() {
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        vectorizer
            .fit(&docs(&["goal", "vote", "rust", "pasta"]))
            .unwrap();
        vectorizer.insert_term("zzz", 999);

        assert!(matches!(vectorizer.check(), Err(Error::CorruptModel(_))));
        // Scoring still ignores the dangling term instead of indexing past the table.
        assert!(vectorizer.transform("zzz").is_empty());
    }
}
