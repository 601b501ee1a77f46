//! Datasets, training, and model persistence
//!
//! Datasets live as `<training_data_dir>/<name>.json`; trained models as
//! `<models_dir>/<name>_<kind>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::{ModelKind, TrainedModel};
use super::vectorizer::{TfidfVectorizer, MAX_FEATURES};
use super::Classifier;
use crate::error::ClassifierError;

const SPLIT_SEED: u64 = 42;
const TEST_FRACTION: f64 = 0.2;
/// Below this many samples everything is used for training.
const MIN_SAMPLES_FOR_SPLIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataset {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub data: Vec<Sample>,
}

impl TrainingDataset {
    pub fn push(&mut self, text: impl Into<String>, label: impl Into<String>) {
        self.data.push(Sample {
            text: text.into(),
            label: label.into(),
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub model_key: String,
    pub model_kind: ModelKind,
    pub accuracy: f64,
    pub dataset_size: usize,
    pub labels: Vec<String>,
}

/// Fit `kind` on `dataset`, holding out a deterministic 20% for accuracy.
pub fn train(
    dataset_name: &str,
    dataset: &TrainingDataset,
    kind: ModelKind,
) -> Result<(TrainedModel, TrainingReport), ClassifierError> {
    if dataset.data.is_empty() {
        return Err(ClassifierError::EmptyDataset(dataset_name.to_string()));
    }

    let mut order: Vec<usize> = (0..dataset.data.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));

    let (train_idx, test_idx) = if order.len() >= MIN_SAMPLES_FOR_SPLIT {
        let n_test = ((order.len() as f64) * TEST_FRACTION).ceil() as usize;
        let (test, train) = order.split_at(n_test);
        (train.to_vec(), test.to_vec())
    } else {
        (order.clone(), order)
    };

    let mut labels: Vec<String> = dataset.data.iter().map(|s| s.label.clone()).collect();
    labels.sort();
    labels.dedup();
    let label_index: AHashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();

    let train_texts: Vec<&str> = train_idx.iter().map(|&i| dataset.data[i].text.as_str()).collect();
    let vectorizer = TfidfVectorizer::fit(&train_texts, MAX_FEATURES);
    let samples: Vec<_> = train_texts.iter().map(|t| vectorizer.transform(t)).collect();
    let targets: Vec<usize> = train_idx
        .iter()
        .map(|&i| label_index[dataset.data[i].label.as_str()])
        .collect();

    let key = format!("{dataset_name}_{kind}");
    let model = TrainedModel::fit(&key, kind, vectorizer, labels.clone(), &samples, &targets);

    let correct = test_idx
        .iter()
        .filter(|&&i| {
            let sample = &dataset.data[i];
            model
                .predict(&sample.text)
                .is_ok_and(|r| r.label == sample.label)
        })
        .count();
    let accuracy = correct as f64 / test_idx.len() as f64;

    info!(model = %key, accuracy, samples = dataset.data.len(), "trained model");
    let report = TrainingReport {
        model_key: key,
        model_kind: kind,
        accuracy,
        dataset_size: dataset.data.len(),
        labels,
    };
    Ok((model, report))
}

/// On-disk datasets and trained models.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
    data_dir: PathBuf,
}

impl ModelStore {
    pub fn new(models_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn dataset_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    pub fn load_dataset(&self, name: &str) -> Result<TrainingDataset, ClassifierError> {
        let path = self.dataset_path(name);
        if !path.exists() {
            return Err(ClassifierError::DatasetNotFound(path));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }

    pub fn save_dataset(&self, name: &str, dataset: &TrainingDataset) -> Result<(), ClassifierError> {
        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.dataset_path(name), serde_json::to_string_pretty(dataset)?)?;
        info!(dataset = name, "saved dataset");
        Ok(())
    }

    /// Names of datasets in the data directory, sorted.
    pub fn available_datasets(&self) -> Vec<String> {
        let mut names = json_stems(&self.data_dir);
        names.sort();
        names
    }

    /// Train on a stored dataset and persist the model.
    pub fn train(&self, dataset_name: &str, kind: ModelKind) -> Result<(TrainedModel, TrainingReport), ClassifierError> {
        let dataset = self.load_dataset(dataset_name)?;
        let (model, report) = train(dataset_name, &dataset, kind)?;
        self.save_model(&model)?;
        Ok((model, report))
    }

    pub fn save_model(&self, model: &TrainedModel) -> Result<(), ClassifierError> {
        fs::create_dir_all(&self.models_dir)?;
        let path = self.models_dir.join(format!("{}.json", model.key()));
        fs::write(&path, serde_json::to_string(model)?)?;
        Ok(())
    }

    /// All models in the models directory, ordered by key.
    ///
    /// A missing directory is an empty set. Unreadable files and models that
    /// fail [`TrainedModel::validate`] are skipped.
    pub fn load_all(&self) -> Vec<TrainedModel> {
        let mut stems = json_stems(&self.models_dir);
        stems.sort();

        stems
            .into_iter()
            .filter_map(|stem| {
                let path = self.models_dir.join(format!("{stem}.json"));
                let loaded = fs::read_to_string(&path)
                    .map_err(ClassifierError::from)
                    .and_then(|text| serde_json::from_str::<TrainedModel>(&text).map_err(ClassifierError::from))
                    .and_then(|model| model.validate().map(|()| model));
                match loaded {
                    Ok(model) => {
                        info!(model = %stem, "loaded model");
                        Some(model)
                    }
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "skipping unreadable model");
                        None
                    }
                }
            })
            .collect()
    }
}

fn json_stems(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect()
}

#[cfg(test)]
pub(crate) fn sample_dataset() -> TrainingDataset {
    let mut ds = TrainingDataset {
        description: "app launching".to_string(),
        task_type: "apps".to_string(),
        data: Vec::new(),
    };
    for text in ["open chrome", "launch chrome browser", "start google chrome", "chrome please", "bring up chrome"] {
        ds.push(text, "open_chrome");
    }
    for text in ["open notepad", "launch notepad editor", "start notepad", "notepad please", "bring up notepad"] {
        ds.push(text, "open_notepad");
    }
    for text in ["what time is it", "tell me the time", "current time", "time now", "clock time please"] {
        ds.push(text, "get_time");
    }
    ds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_naive_bayes_predicts_training_vocabulary() {
        let (model, report) = train("apps", &sample_dataset(), ModelKind::NaiveBayes).unwrap();
        assert_eq!(report.model_key, "apps_naive_bayes");
        assert_eq!(report.dataset_size, 15);
        assert_eq!(report.labels.len(), 3);

        let result = model.predict("chrome").unwrap();
        assert_eq!(result.label, "open_chrome");
        assert!(result.confidence > 1.0 / 3.0);
    }

    #[test]
    fn test_train_centroid() {
        let (model, _) = train("apps", &sample_dataset(), ModelKind::Centroid).unwrap();
        let result = model.predict("notepad").unwrap();
        assert_eq!(result.label, "open_notepad");
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn test_unknown_words_are_unvectorizable() {
        let (model, _) = train("apps", &sample_dataset(), ModelKind::NaiveBayes).unwrap();
        assert!(matches!(model.predict("do a backflip"), Err(ClassifierError::Unvectorizable)));
    }

    #[test]
    fn test_empty_dataset() {
        let err = train("empty", &TrainingDataset::default(), ModelKind::NaiveBayes).unwrap_err();
        assert!(matches!(err, ClassifierError::EmptyDataset(_)));
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"), dir.path().join("data"));

        store.save_dataset("apps", &sample_dataset()).unwrap();
        assert_eq!(store.available_datasets(), vec!["apps".to_string()]);

        store.train("apps", ModelKind::NaiveBayes).unwrap();
        store.train("apps", ModelKind::Centroid).unwrap();

        let keys: Vec<String> = store.load_all().iter().map(|m| m.key().to_string()).collect();
        assert_eq!(keys, vec!["apps_centroid", "apps_naive_bayes"]);
    }

    #[test]
    fn test_load_all_skips_inconsistent_models() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"), dir.path().join("data"));
        store.save_dataset("apps", &sample_dataset()).unwrap();
        store.train("apps", ModelKind::Centroid).unwrap();

        let broken = r#"{
            "key": "broken_centroid",
            "labels": [],
            "vectorizer": {"vocabulary": {"chrome": 0}, "idf": [1.0]},
            "params": {"kind": "centroid", "centroids": [[[0, 1.0]]]}
        }"#;
        fs::write(store.models_dir().join("broken_centroid.json"), broken).unwrap();
        fs::write(store.models_dir().join("truncated.json"), "{\"key\": \"trunc").unwrap();

        let keys: Vec<String> = store.load_all().iter().map(|m| m.key().to_string()).collect();
        assert_eq!(keys, vec!["apps_centroid"]);
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path(), dir.path());
        assert!(matches!(store.load_dataset("nope"), Err(ClassifierError::DatasetNotFound(_))));
        assert!(store.load_all().is_empty());
    }
}
