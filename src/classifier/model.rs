//! Trained intent models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::vectorizer::{cosine, dot_dense, SparseVector, TfidfVectorizer};
use super::Classifier;
use crate::error::ClassifierError;
use crate::types::ClassificationResult;

/// Laplace smoothing for naive Bayes.
const ALPHA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    NaiveBayes,
    Centroid,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::Centroid => "centroid",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "naive_bayes" | "nb" => Ok(ModelKind::NaiveBayes),
            "centroid" | "nearest_centroid" => Ok(ModelKind::Centroid),
            other => Err(format!("unknown model type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Params {
    NaiveBayes {
        class_log_prior: Vec<f64>,
        /// `[class][feature]` log P(feature | class).
        feature_log_prob: Vec<Vec<f64>>,
    },
    Centroid {
        /// One L2-normalized centroid per class.
        centroids: Vec<SparseVector>,
    },
}

/// A fitted vectorizer plus the class parameters of one model kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    key: String,
    labels: Vec<String>,
    vectorizer: TfidfVectorizer,
    params: Params,
}

impl TrainedModel {
    /// Fit a model on already-vectorized samples.
    ///
    /// `targets[i]` indexes into `labels`.
    pub fn fit(
        key: impl Into<String>,
        kind: ModelKind,
        vectorizer: TfidfVectorizer,
        labels: Vec<String>,
        samples: &[SparseVector],
        targets: &[usize],
    ) -> Self {
        let n_classes = labels.len();
        let n_features = vectorizer.len();

        // Per-class feature sums, used by both kinds
        let mut sums = vec![vec![0.0; n_features]; n_classes];
        let mut class_count = vec![0usize; n_classes];
        for (x, &class) in samples.iter().zip(targets) {
            class_count[class] += 1;
            for &(index, weight) in x {
                sums[class][index] += weight;
            }
        }

        let params = match kind {
            ModelKind::NaiveBayes => {
                let total = samples.len().max(1) as f64;
                let class_log_prior = class_count
                    .iter()
                    .map(|&c| ((c as f64).max(f64::MIN_POSITIVE) / total).ln())
                    .collect();
                let feature_log_prob = sums
                    .iter()
                    .map(|row| {
                        let denom = row.iter().sum::<f64>() + ALPHA * n_features as f64;
                        row.iter().map(|&v| ((v + ALPHA) / denom).ln()).collect()
                    })
                    .collect();
                Params::NaiveBayes {
                    class_log_prior,
                    feature_log_prob,
                }
            }
            ModelKind::Centroid => {
                let centroids = sums
                    .into_iter()
                    .map(|mut row: Vec<f64>| {
                        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                        if norm > 0.0 {
                            row.iter_mut().for_each(|v| *v /= norm);
                        }
                        row.into_iter()
                            .enumerate()
                            .filter(|&(_, v)| v != 0.0)
                            .collect::<SparseVector>()
                    })
                    .collect();
                Params::Centroid { centroids }
            }
        };

        Self {
            key: key.into(),
            labels,
            vectorizer,
            params,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self.params {
            Params::NaiveBayes { .. } => ModelKind::NaiveBayes,
            Params::Centroid { .. } => ModelKind::Centroid,
        }
    }

    /// Check that the class parameters, labels and vocabulary agree in size.
    ///
    /// Models loaded from disk must pass this before they are consulted.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let corrupt = |reason: String| ClassifierError::Corrupt {
            model: self.key.clone(),
            reason,
        };
        let n_classes = self.labels.len();
        let n_features = self.vectorizer.len();

        if n_classes == 0 {
            return Err(corrupt("no labels".to_string()));
        }
        self.vectorizer.check().map_err(&corrupt)?;

        match &self.params {
            Params::NaiveBayes {
                class_log_prior,
                feature_log_prob,
            } => {
                if class_log_prior.len() != n_classes || feature_log_prob.len() != n_classes {
                    return Err(corrupt(format!(
                        "{n_classes} labels but {} priors and {} likelihood rows",
                        class_log_prior.len(),
                        feature_log_prob.len()
                    )));
                }
                if let Some(row) = feature_log_prob.iter().find(|row| row.len() != n_features) {
                    return Err(corrupt(format!(
                        "likelihood row of {} features for a vocabulary of {n_features}",
                        row.len()
                    )));
                }
            }
            Params::Centroid { centroids } => {
                if centroids.len() != n_classes {
                    return Err(corrupt(format!("{n_classes} labels but {} centroids", centroids.len())));
                }
                if centroids.iter().flatten().any(|&(index, _)| index >= n_features) {
                    return Err(corrupt(format!("centroid index outside a vocabulary of {n_features}")));
                }
            }
        }
        Ok(())
    }

    /// Index of the best class and its confidence.
    fn best_class(&self, x: &SparseVector) -> Option<(usize, f64)> {
        let scores: Vec<f64> = match &self.params {
            Params::NaiveBayes {
                class_log_prior,
                feature_log_prob,
            } => {
                let jll: Vec<f64> = class_log_prior
                    .iter()
                    .zip(feature_log_prob)
                    .map(|(prior, row)| prior + dot_dense(x, row))
                    .collect();
                // Softmax, shifted by the max for stability
                let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let exp: Vec<f64> = jll.iter().map(|v| (v - max).exp()).collect();
                let sum: f64 = exp.iter().sum();
                exp.into_iter().map(|v| v / sum).collect()
            }
            Params::Centroid { centroids } => centroids.iter().map(|c| cosine(x, c)).collect(),
        };

        scores
            .into_iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl Classifier for TrainedModel {
    fn key(&self) -> &str {
        &self.key
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        let x = self.vectorizer.transform(text);
        if x.is_empty() {
            return Err(ClassifierError::Unvectorizable);
        }
        let (class, confidence) = self.best_class(&x).ok_or(ClassifierError::Unvectorizable)?;
        let label = self.labels.get(class).ok_or_else(|| ClassifierError::Corrupt {
            model: self.key.clone(),
            reason: format!("class {class} has no label"),
        })?;
        Ok(ClassificationResult::new(label.clone(), confidence, self.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Labels list empty while the centroid table has one class.
    const MISSING_LABELS: &str = r#"{
        "key": "apps_centroid",
        "labels": [],
        "vectorizer": {"vocabulary": {"chrome": 0}, "idf": [1.0]},
        "params": {"kind": "centroid", "centroids": [[[0, 1.0]]]}
    }"#;

    #[test]
    fn test_missing_labels_fail_validation_and_prediction() {
        let model: TrainedModel = serde_json::from_str(MISSING_LABELS).unwrap();

        assert!(matches!(model.validate(), Err(ClassifierError::Corrupt { .. })));
        assert!(matches!(model.predict("chrome"), Err(ClassifierError::Corrupt { .. })));
    }

    #[test]
    fn test_short_likelihood_rows_fail_validation() {
        let text = r#"{
            "key": "apps_naive_bayes",
            "labels": ["open_chrome", "open_notepad"],
            "vectorizer": {"vocabulary": {"chrome": 0, "notepad": 1}, "idf": [1.0, 1.0]},
            "params": {"kind": "naive_bayes", "class_log_prior": [-0.7, -0.7], "feature_log_prob": [[-0.1], [-0.1]]}
        }"#;
        let model: TrainedModel = serde_json::from_str(text).unwrap();

        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("apps_naive_bayes"));
    }

    #[test]
    fn test_fitted_model_is_valid() {
        let vectorizer = TfidfVectorizer::fit(&["open chrome", "open notepad"], 100);
        let samples: Vec<SparseVector> = ["open chrome", "open notepad"]
            .iter()
            .map(|t| vectorizer.transform(t))
            .collect();
        let labels = vec!["open_chrome".to_string(), "open_notepad".to_string()];

        for kind in [ModelKind::NaiveBayes, ModelKind::Centroid] {
            let model = TrainedModel::fit("apps", kind, vectorizer.clone(), labels.clone(), &samples, &[0, 1]);
            assert!(model.validate().is_ok());
        }
    }
}
