//! Classifier bridge
//!
//! Trained text classifiers are consulted before the rule table. A model
//! set is installed as one immutable snapshot; swapping in retrained models
//! replaces the snapshot atomically, so a command in flight always sees
//! either the old set or the new one.

pub mod model;
pub mod training;
pub mod vectorizer;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ClassifierError;
use crate::types::ClassificationResult;

pub use model::{ModelKind, TrainedModel};
pub use training::{ModelStore, Sample, TrainingDataset, TrainingReport};

/// A trained text classifier.
pub trait Classifier: Send + Sync {
    /// Identifier, conventionally `<dataset>_<model kind>`.
    fn key(&self) -> &str;

    fn labels(&self) -> &[String];

    fn predict(&self, text: &str) -> Result<ClassificationResult, ClassifierError>;
}

/// How predictions from several models are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleStrategy {
    /// First model, in registration order, whose prediction qualifies.
    #[default]
    FirstConfident,
    /// Highest-confidence qualifying prediction across all models.
    BestConfident,
}

type Snapshot = Arc<[Arc<dyn Classifier>]>;

pub struct ClassifierBridge {
    models: RwLock<Snapshot>,
}

impl ClassifierBridge {
    pub fn new() -> Self {
        Self::from_models(Vec::new())
    }

    pub fn from_models(models: Vec<Arc<dyn Classifier>>) -> Self {
        Self {
            models: RwLock::new(Arc::from(models)),
        }
    }

    /// Current model set. Later installs do not affect a taken snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.models.read())
    }

    /// Replace the whole model set.
    pub fn install(&self, models: Vec<Arc<dyn Classifier>>) {
        *self.models.write() = Arc::from(models);
    }

    /// Add a model, replacing one with the same key in place.
    pub fn register(&self, model: Arc<dyn Classifier>) {
        let mut guard = self.models.write();
        let mut next: Vec<Arc<dyn Classifier>> = guard.iter().cloned().collect();
        match next.iter().position(|m| m.key() == model.key()) {
            Some(index) => next[index] = model,
            None => next.push(model),
        }
        *guard = Arc::from(next);
    }

    pub fn clear(&self) {
        self.install(Vec::new());
    }

    pub fn keys(&self) -> Vec<String> {
        self.snapshot().iter().map(|m| m.key().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Query one model by key.
    pub fn predict(&self, text: &str, model_id: &str) -> Result<ClassificationResult, ClassifierError> {
        let models = self.snapshot();
        let model = models
            .iter()
            .find(|m| m.key() == model_id)
            .ok_or_else(|| ClassifierError::ModelNotFound(model_id.to_string()))?;
        guarded_predict(model.as_ref(), text)
    }

    /// A prediction at or above `threshold` whose label has a handler.
    ///
    /// Model errors (unknown vocabulary, inference failures) count as "no
    /// prediction" for that model and never escape.
    pub fn resolve(&self, text: &str, threshold: f64, strategy: EnsembleStrategy) -> Option<ClassificationResult> {
        let models = self.snapshot();
        let mut qualifying = models.iter().filter_map(|model| match guarded_predict(model.as_ref(), text) {
            Ok(result) if result.confidence >= threshold && result.intent.is_some() => Some(result),
            Ok(result) => {
                debug!(
                    model = model.key(),
                    label = %result.label,
                    confidence = result.confidence,
                    "prediction not usable"
                );
                None
            }
            Err(e) => {
                debug!(model = model.key(), error = %e, "classifier unavailable");
                None
            }
        });

        match strategy {
            EnsembleStrategy::FirstConfident => qualifying.next(),
            EnsembleStrategy::BestConfident => {
                qualifying.max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
            }
        }
    }
}

/// Run one prediction, turning a panic inside the model into an error.
fn guarded_predict(model: &dyn Classifier, text: &str) -> Result<ClassificationResult, ClassifierError> {
    catch_unwind(AssertUnwindSafe(|| model.predict(text))).unwrap_or_else(|_| {
        error!(model = model.key(), "classifier panicked");
        Err(ClassifierError::Panicked(model.key().to_string()))
    })
}

impl Default for ClassifierBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Always predicts one label with a fixed confidence.
    pub struct FixedClassifier {
        pub key: String,
        pub labels: Vec<String>,
        pub confidence: f64,
    }

    impl FixedClassifier {
        pub fn new(key: &str, label: &str, confidence: f64) -> Self {
            Self {
                key: key.to_string(),
                labels: vec![label.to_string()],
                confidence,
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn key(&self) -> &str {
            &self.key
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&self, _text: &str) -> Result<ClassificationResult, ClassifierError> {
            Ok(ClassificationResult::new(self.labels[0].clone(), self.confidence, self.key.clone()))
        }
    }

    /// Panics on every prediction.
    pub struct PanickingClassifier;

    impl Classifier for PanickingClassifier {
        fn key(&self) -> &str {
            "panicking"
        }

        fn labels(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _text: &str) -> Result<ClassificationResult, ClassifierError> {
            panic!("index out of bounds")
        }
    }

    /// Never produces a prediction.
    pub struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn key(&self) -> &str {
            "broken"
        }

        fn labels(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _text: &str) -> Result<ClassificationResult, ClassifierError> {
            Err(ClassifierError::Unvectorizable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{BrokenClassifier, FixedClassifier, PanickingClassifier};
    use super::*;
    use crate::types::Intent;

    fn bridge(models: Vec<FixedClassifier>) -> ClassifierBridge {
        ClassifierBridge::from_models(models.into_iter().map(|m| Arc::new(m) as Arc<dyn Classifier>).collect())
    }

    #[test]
    fn test_empty_bridge_gives_nothing() {
        let bridge = ClassifierBridge::new();
        assert!(bridge.resolve("open notepad", 0.7, EnsembleStrategy::FirstConfident).is_none());
        assert!(matches!(bridge.predict("x", "missing"), Err(ClassifierError::ModelNotFound(_))));
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let bridge = bridge(vec![FixedClassifier::new("a", "open_notepad", 0.69)]);
        assert!(bridge.resolve("open notepad", 0.7, EnsembleStrategy::FirstConfident).is_none());
    }

    #[test]
    fn test_unbound_label_is_ignored() {
        let bridge = bridge(vec![FixedClassifier::new("a", "dev_environment", 0.99)]);
        assert!(bridge.resolve("open my coding setup", 0.7, EnsembleStrategy::FirstConfident).is_none());
    }

    #[test]
    fn test_first_confident_uses_registration_order() {
        let bridge = bridge(vec![
            FixedClassifier::new("a", "open_chrome", 0.75),
            FixedClassifier::new("b", "open_edge", 0.95),
        ]);
        let result = bridge.resolve("open browser", 0.7, EnsembleStrategy::FirstConfident).unwrap();
        assert_eq!(result.intent, Some(Intent::OpenChrome));
        assert_eq!(result.model_key, "a");
    }

    #[test]
    fn test_best_confident_takes_maximum() {
        let bridge = bridge(vec![
            FixedClassifier::new("a", "open_chrome", 0.75),
            FixedClassifier::new("b", "open_edge", 0.95),
        ]);
        let result = bridge.resolve("open browser", 0.7, EnsembleStrategy::BestConfident).unwrap();
        assert_eq!(result.intent, Some(Intent::OpenEdge));
    }

    #[test]
    fn test_failing_model_is_skipped() {
        let bridge = ClassifierBridge::from_models(vec![
            Arc::new(BrokenClassifier) as Arc<dyn Classifier>,
            Arc::new(FixedClassifier::new("b", "get_time", 0.9)),
        ]);
        let result = bridge.resolve("time", 0.7, EnsembleStrategy::FirstConfident).unwrap();
        assert_eq!(result.intent, Some(Intent::GetTime));
    }

    #[test]
    fn test_panicking_model_is_skipped() {
        let bridge = ClassifierBridge::from_models(vec![
            Arc::new(PanickingClassifier) as Arc<dyn Classifier>,
            Arc::new(FixedClassifier::new("b", "get_time", 0.9)),
        ]);
        for strategy in [EnsembleStrategy::FirstConfident, EnsembleStrategy::BestConfident] {
            let result = bridge.resolve("time", 0.7, strategy).unwrap();
            assert_eq!(result.model_key, "b");
        }
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let bridge = bridge(vec![FixedClassifier::new("a", "open_chrome", 0.9)]);
        let before = bridge.snapshot();
        bridge.install(Vec::new());
        assert_eq!(before.len(), 1);
        assert!(bridge.is_empty());

        bridge.register(Arc::new(FixedClassifier::new("a", "open_edge", 0.9)));
        bridge.register(Arc::new(FixedClassifier::new("a", "open_firefox", 0.9)));
        assert_eq!(bridge.keys(), vec!["a".to_string()]);
        assert_eq!(bridge.predict("x", "a").unwrap().label, "open_firefox");
    }
}
