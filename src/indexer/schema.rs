use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::algorithms::svm::SvmModel;
use super::algorithms::tfidf::TfidfVectorizer;
use crate::error::{Error, Result};

/// Tag written at the start of every model file.
pub const MODEL_FORMAT: &str = "site-categorizer/svm";
/// Bumped whenever the layout of [`ModelFile`] changes.
pub const MODEL_VERSION: u32 = 1;

/// On-disk layout of a trained classifier.
///
/// The vectorizer, classifier and label list are stored together so they can
/// never be mixed between trainings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelFile {
    pub format: String,
    pub version: u32,
    /// Category names, indexed by category id.
    pub labels: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub classifier: SvmModel,
}

impl ModelFile {
    pub fn new(labels: Vec<String>, vectorizer: TfidfVectorizer, classifier: SvmModel) -> Self {
        Self {
            format: MODEL_FORMAT.to_string(),
            version: MODEL_VERSION,
            labels,
            vectorizer,
            classifier,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes and validates a model file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: ModelFile = bincode::deserialize(bytes)?;
        let expected = format!("{MODEL_FORMAT} v{MODEL_VERSION}");
        if file.format != MODEL_FORMAT || file.version != MODEL_VERSION {
            return Err(Error::IncompatibleModel {
                found: format!("{} v{}", file.format, file.version),
                expected,
            });
        }
        file.vectorizer.check()?;
        if file.vectorizer.dimension() != file.classifier.dimension() {
            return Err(Error::DimensionMismatch {
                vectorizer: file.vectorizer.dimension(),
                classifier: file.classifier.dimension(),
            });
        }
        file.classifier.check()?;
        if file.classifier.n_classes() != file.labels.len() {
            return Err(Error::CorruptModel(format!(
                "{} category labels for {} classifier classes",
                file.labels.len(),
                file.classifier.n_classes()
            )));
        }
        Ok(file)
    }
}

/// Bidirectional category name <-> id mapping.
///
/// Ids are positions in the label list; the reverse index is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    labels: Vec<String>,
    ids: HashMap<String, usize>,
}

impl CategoryMap {
    /// Builds the map from labels in first-seen order. Repeated labels keep their first id.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = CategoryMap::default();
        for label in labels {
            let label = label.into();
            if !map.ids.contains_key(&label) {
                map.ids.insert(label.clone(), map.labels.len());
                map.labels.push(label);
            }
        }
        map
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::algorithms::svm::ModelKind;

    #[test]
    fn category_ids_follow_first_appearance() {
        let map = CategoryMap::from_labels(["news", "sports", "news", "tech"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.id("news"), Some(0));
        assert_eq!(map.id("sports"), Some(1));
        assert_eq!(map.id("tech"), Some(2));
        assert_eq!(map.label(1), Some("sports"));
        assert_eq!(map.label(3), None);
        assert_eq!(map.id("cooking"), None);
    }

    fn tiny_parts(classifier_dimension: usize) -> (TfidfVectorizer, SvmModel) {
        let documents: Vec<String> = ["goal", "vote", "rust", "pasta"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut vectorizer = TfidfVectorizer::new(0.0, 0.25);
        let vectors = vectorizer.fit_transform(&documents).unwrap();
        let classifier =
            SvmModel::fit(ModelKind::Linear, &vectors, &[0, 1, 2, 3], 4, classifier_dimension).unwrap();
        (vectorizer, classifier)
    }

    fn labels() -> Vec<String> {
        ["sports", "politics", "tech", "food"].map(String::from).to_vec()
    }

    fn tiny_model() -> ModelFile {
        let (vectorizer, classifier) = tiny_parts(4);
        ModelFile::new(labels(), vectorizer, classifier)
    }

    #[test]
    fn rejects_other_versions() {
        let mut model = tiny_model();
        model.version = MODEL_VERSION + 1;
        let bytes = model.to_bytes().unwrap();
        let err = ModelFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::IncompatibleModel { .. }));
    }

    #[test]
    fn rejects_garbage() {
        let err = ModelFile::from_bytes(b"not a model").unwrap_err();
        assert!(matches!(err, Error::ModelCodec(_)));
    }

    #[test]
    fn round_trips_labels() {
        let bytes = tiny_model().to_bytes().unwrap();
        let decoded = ModelFile::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.labels, vec!["sports", "politics", "tech", "food"]);
        assert_eq!(decoded.vectorizer.dimension(), 4);
    }

    #[test]
    fn rejects_vectorizer_and_classifier_of_different_widths() {
        let (vectorizer, classifier) = tiny_parts(6);
        let bytes = ModelFile::new(labels(), vectorizer, classifier).to_bytes().unwrap();
        let err = ModelFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                vectorizer: 4,
                classifier: 6
            }
        ));
    }

    #[test]
    fn rejects_vocabulary_pointing_past_the_features() {
        let mut model = tiny_model();
        model.vectorizer.insert_term("zzz", 999);
        let bytes = model.to_bytes().unwrap();
        let err = ModelFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptModel(_)));
    }

    #[test]
    fn rejects_label_list_shorter_than_the_classes() {
        let mut model = tiny_model();
        model.labels.pop();
        let bytes = model.to_bytes().unwrap();
        let err = ModelFile::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptModel(msg) if msg.contains("3 category labels")));
    }
}
