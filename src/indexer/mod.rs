use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

pub mod algorithms;
pub mod dataset;
pub mod schema;

pub use self::algorithms::svm::ModelKind;
use self::algorithms::svm::SvmModel;
use self::algorithms::tfidf::TfidfVectorizer;
use self::dataset::TrainingData;
use self::schema::{CategoryMap, ModelFile};
use crate::crawler::datascraper::{Scraper, detect_language};
use crate::error::{Error, Result};

/// Terms found in more than this share of category documents are dropped.
const MAX_DOCUMENT_FREQUENCY: f64 = 0.25;
const MIN_DOCUMENT_FREQUENCY: f64 = 0.0;

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ModelKind::Linear),
            "poly" | "polynomial" => Ok(ModelKind::Polynomial),
            _ => Err(Error::UnsupportedModel(value.to_string())),
        }
    }
}

/// Predicted category, its decision score and the detected page language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub category: String,
    pub confidence: f64,
    pub language: String,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confidence {:.4}, language {})",
            self.category, self.confidence, self.language
        )
    }
}

/// Vectorizer, classifier and labels from one training run.
#[derive(Debug, Clone)]
struct FittedModel {
    categories: CategoryMap,
    vectorizer: TfidfVectorizer,
    classifier: SvmModel,
}

/// Categorizes websites from their text with TF-IDF features and an SVM.
#[derive(Debug, Clone)]
pub struct WebsiteClassifier {
    kind: ModelKind,
    fitted: Option<FittedModel>,
}

impl WebsiteClassifier {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind, fitted: None }
    }

    /// Parses the model kind, failing on anything other than `linear` or `poly`.
    pub fn with_kind_name(kind: &str) -> Result<Self> {
        Ok(Self::new(kind.parse()?))
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Category names by id. Empty until trained.
    pub fn categories(&self) -> &[String] {
        self.fitted
            .as_ref()
            .map(|f| f.categories.labels())
            .unwrap_or_default()
    }

    /// Downloads every training domain and fits on one document per category.
    pub async fn train(&mut self, scraper: &Scraper, data: &TrainingData) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let mut documents = Vec::with_capacity(data.category_count());
        for (category, domains) in data.iter() {
            let mut texts = Vec::with_capacity(domains.len());
            for domain in domains {
                info!(target: "train", %category, %domain, "extracting text");
                texts.push(scraper.extract_text(domain).await?);
            }
            documents.push((category.to_string(), texts.join(" ")));
        }

        self.fit_texts(&documents)
    }

    /// Fits on `(category, text)` documents. Repeated categories keep their first id.
    /// A failed fit leaves the previous one in place.
    pub fn fit_texts(&mut self, documents: &[(String, String)]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let categories = CategoryMap::from_labels(documents.iter().map(|(c, _)| c.as_str()));
        let texts: Vec<String> = documents.iter().map(|(_, text)| text.clone()).collect();
        let labels: Vec<usize> = documents
            .iter()
            .filter_map(|(c, _)| categories.id(c))
            .collect();

        let mut vectorizer = TfidfVectorizer::new(MIN_DOCUMENT_FREQUENCY, MAX_DOCUMENT_FREQUENCY);
        let vectors = vectorizer.fit_transform(&texts)?;
        let classifier = SvmModel::fit(
            self.kind,
            &vectors,
            &labels,
            categories.len(),
            vectorizer.dimension(),
        )?;

        info!(
            target: "train",
            categories = categories.len(),
            features = vectorizer.dimension(),
            kind = ?self.kind,
            "classifier trained"
        );

        self.fitted = Some(FittedModel {
            categories,
            vectorizer,
            classifier,
        });
        Ok(())
    }

    /// Downloads `domain` and classifies its text.
    pub async fn predict(&self, scraper: &Scraper, domain: &str) -> Result<Prediction> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        let page = scraper.extract(domain).await?;
        fitted.predict(&page.text, page.language)
    }

    pub fn predict_text(&self, text: &str) -> Result<Prediction> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        fitted.predict(text, detect_language(text))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        ModelFile::new(
            fitted.categories.labels().to_vec(),
            fitted.vectorizer.clone(),
            fitted.classifier.clone(),
        )
        .to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file = ModelFile::from_bytes(bytes)?;
        Ok(Self {
            kind: file.classifier.kind(),
            fitted: Some(FittedModel {
                categories: CategoryMap::from_labels(file.labels),
                vectorizer: file.vectorizer,
                classifier: file.classifier,
            }),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        info!(target: "model", path = %path.display(), bytes = bytes.len(), "model saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let classifier = Self::from_bytes(&bytes)?;
        info!(
            target: "model",
            path = %path.display(),
            categories = classifier.categories().len(),
            "model loaded"
        );
        Ok(classifier)
    }
}

impl FittedModel {
    fn predict(&self, text: &str, language: String) -> Result<Prediction> {
        let vector = self.vectorizer.transform(text);
        let scores = self.classifier.decision_scores(&vector)?;

        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        Ok(Prediction {
            category: self.categories.label(best).unwrap_or_default().to_string(),
            confidence: scores.get(best).copied().unwrap_or(f64::NEG_INFINITY),
            language,
        })
    }
}
