use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::svm::Kernels;
use smartcore::svm::svc::{SVC, SVCParameters};

use super::{SparseVector, to_dense};
use crate::error::{Error, Result};

/// Penalty for margin violations.
const C: f64 = 1.0;
const POLY_DEGREE: f64 = 3.0;
const POLY_COEF0: f64 = 1.0;
/// Fixed so a reloaded model reproduces the scores of the trained one.
const SOLVER_SEED: u64 = 42;

/// Which decision function to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Linear,
    Polynomial,
}

type Svc<'a> = SVC<'a, f64, i32, DenseMatrix<f64>, Vec<i32>>;
type SvcParameters = SVCParameters<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// One-vs-rest support-vector classifier, one binary smartcore `SVC` per class.
///
/// A smartcore `SVC` borrows its training matrix and parameters, and its serde
/// form drops the kernel, so the model keeps the training problem itself and
/// solves the binary machines (seeded, hence reproducibly) when it scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmModel {
    kind: ModelKind,
    dimension: usize,
    /// Polynomial kernel coefficient, `1 / (n_features * var(X))`.
    gamma: f64,
    n_classes: usize,
    samples: Vec<SparseVector>,
    labels: Vec<usize>,
}

impl SvmModel {
    /// Trains one binary problem per class. `labels[i]` is the class of `samples[i]`.
    pub fn fit(
        kind: ModelKind,
        samples: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
        dimension: usize,
    ) -> Result<Self> {
        let model = Self {
            kind,
            dimension,
            gamma: scale_gamma(samples, dimension),
            n_classes,
            samples: samples.to_vec(),
            labels: labels.to_vec(),
        };
        model.check()?;
        // Solving once up front surfaces solver failures at training time.
        model.decision_matrix(samples)?;
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Number of input features the model was trained on.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// One score per class; larger means more confident.
    pub fn decision_scores(&self, x: &SparseVector) -> Result<Vec<f64>> {
        let mut rows = self.decision_matrix(std::slice::from_ref(x))?;
        Ok(rows.pop().unwrap_or_default())
    }

    /// Verifies the stored training problem is usable: every sample fits the
    /// feature space and every label names a known class with at least one
    /// sample on each side of every binary split.
    pub fn check(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::CorruptModel("empty feature space".to_string()));
        }
        if self.samples.is_empty() || self.samples.len() != self.labels.len() {
            return Err(Error::CorruptModel(format!(
                "{} training samples for {} labels",
                self.samples.len(),
                self.labels.len()
            )));
        }
        if let Some(&(index, _)) = self
            .samples
            .iter()
            .flatten()
            .find(|&&(index, _)| index >= self.dimension)
        {
            return Err(Error::DimensionMismatch {
                vectorizer: index + 1,
                classifier: self.dimension,
            });
        }
        if let Some(&label) = self.labels.iter().find(|&&label| label >= self.n_classes) {
            return Err(Error::CorruptModel(format!(
                "label {label} outside {} classes",
                self.n_classes
            )));
        }
        if let Some(class) = (0..self.n_classes).find(|c| !self.labels.contains(c)) {
            return Err(Error::Classifier(format!("class {class} has no training samples")));
        }
        if self.n_classes < 2 {
            return Err(Error::Classifier("at least two classes are required".to_string()));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(Error::CorruptModel(format!("kernel gamma {}", self.gamma)));
        }
        Ok(())
    }

    /// Scores every query against every class: `result[query][class]`.
    fn decision_matrix(&self, queries: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        let train_rows: Vec<Vec<f64>> = self
            .samples
            .iter()
            .map(|x| to_dense(x, self.dimension))
            .collect();
        let query_rows: Vec<Vec<f64>> = queries
            .iter()
            .map(|x| to_dense(x, self.dimension))
            .collect();
        let train = DenseMatrix::from_2d_vec(&train_rows);
        let query = DenseMatrix::from_2d_vec(&query_rows);

        let per_class = (0..self.n_classes)
            .into_par_iter()
            .map(|class| {
                let targets = one_vs_rest(&self.labels, class);
                let parameters = self.parameters();
                let machine: Svc<'_> = SVC::fit(&train, &targets, &parameters)
                    .map_err(|err| Error::Classifier(err.to_string()))?;
                machine
                    .decision_function(&query)
                    .map_err(|err| Error::Classifier(err.to_string()))
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok((0..queries.len())
            .map(|row| per_class.iter().map(|scores| scores[row]).collect())
            .collect())
    }

    fn parameters(&self) -> SvcParameters {
        let parameters = SVCParameters::default()
            .with_c(C)
            .with_seed(Some(SOLVER_SEED));
        match self.kind {
            ModelKind::Linear => parameters.with_kernel(Kernels::linear()),
            ModelKind::Polynomial => parameters.with_kernel(
                Kernels::polynomial().with_params(POLY_DEGREE, self.gamma, POLY_COEF0),
            ),
        }
    }
}

fn one_vs_rest(labels: &[usize], class: usize) -> Vec<i32> {
    labels
        .iter()
        .map(|&label| if label == class { 1 } else { -1 })
        .collect()
}

/// `1 / (n_features * var(X))` over the dense sample matrix, 1 when degenerate.
fn scale_gamma(samples: &[SparseVector], dimension: usize) -> f64 {
    let cells = (samples.len() * dimension) as f64;
    if cells == 0.0 {
        return 1.0;
    }
    let (sum, sum_sq) = samples
        .iter()
        .flatten()
        .fold((0.0, 0.0), |(s, sq), &(_, v)| (s + v, sq + v * v));
    let mean = sum / cells;
    let variance = sum_sq / cells - mean * mean;
    if variance > 0.0 {
        1.0 / (dimension as f64 * variance)
    } else {
        1.0
    }
}
