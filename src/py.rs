//! Python bindings for the butler core using PyO3

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::classifier::{Classifier, ModelKind, ModelStore};
use crate::collab::Collaborators;
use crate::config::{init_tracing, ButlerConfig};
use crate::dispatcher::{Dispatcher, ResolutionSource};
use crate::entities::EntityExtractor;
use crate::timeparse::parse_time;

fn runtime_err(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(e.to_string())
}

/// Resolve a time expression against the local clock (Python function)
#[pyfunction]
pub fn py_parse_time(expr: &str) -> String {
    let now = chrono::Local::now().naive_local();
    parse_time(expr, now).format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Python wrapper for the dispatcher with portable collaborators
#[pyclass]
pub struct PyButler {
    dispatcher: Arc<Dispatcher>,
    store: ModelStore,
}

#[pymethods]
impl PyButler {
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<PathBuf>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => ButlerConfig::load_or_create(&path).map_err(runtime_err)?,
            None => ButlerConfig::default(),
        };
        init_tracing(&config.logging.filter);

        let collab = Collaborators::portable(config.paths.base_dir());
        let dispatcher = Dispatcher::from_config(&config, collab).map_err(runtime_err)?;
        let store = ModelStore::new(&config.paths.models_dir, &config.paths.training_data_dir);

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            store,
        })
    }

    /// Interpret and act on a command; returns the reply text
    fn process(&self, py: Python<'_>, text: &str) -> String {
        let dispatcher = Arc::clone(&self.dispatcher);
        let text = text.to_string();
        py.allow_threads(move || dispatcher.process(&text))
    }

    /// Resolve a command without acting on it
    fn interpret<'py>(&self, text: &str, py: Python<'py>) -> PyResult<Option<Bound<'py, PyDict>>> {
        let Some(resolution) = self.dispatcher.interpret(text) else {
            return Ok(None);
        };

        let dict = PyDict::new_bound(py);
        dict.set_item("intent", resolution.intent.label())?;
        match &resolution.source {
            ResolutionSource::Rule(captures) => {
                dict.set_item("source", "rule")?;
                dict.set_item("pattern", &captures.pattern)?;
                dict.set_item("groups", captures.groups.iter().skip(1).cloned().collect::<Vec<_>>())?;
            }
            ResolutionSource::Classifier(result) => {
                dict.set_item("source", "classifier")?;
                dict.set_item("confidence", result.confidence)?;
                dict.set_item("model", &result.model_key)?;
            }
        }
        Ok(Some(dict))
    }

    /// Train a model on a stored dataset and start using it
    #[pyo3(signature = (dataset, model_kind="naive_bayes"))]
    fn train<'py>(&self, dataset: &str, model_kind: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let kind = ModelKind::from_str(model_kind).map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))?;
        let (model, report) = self.store.train(dataset, kind).map_err(runtime_err)?;

        if let Some(bridge) = self.dispatcher.classifier() {
            bridge.register(Arc::new(model) as Arc<dyn Classifier>);
        }

        let dict = PyDict::new_bound(py);
        dict.set_item("model_key", &report.model_key)?;
        dict.set_item("model_kind", report.model_kind.as_str())?;
        dict.set_item("accuracy", report.accuracy)?;
        dict.set_item("dataset_size", report.dataset_size)?;
        dict.set_item("labels", &report.labels)?;
        Ok(dict)
    }

    /// Keys of the models currently consulted
    fn models(&self) -> Vec<String> {
        self.dispatcher
            .classifier()
            .map(|bridge| bridge.keys())
            .unwrap_or_default()
    }

    /// Names of datasets available for training
    fn datasets(&self) -> Vec<String> {
        self.store.available_datasets()
    }
}

/// Python wrapper for entity extractor
#[pyclass]
pub struct PyEntityExtractor {
    extractor: EntityExtractor,
}

#[pymethods]
impl PyEntityExtractor {
    #[new]
    fn new() -> Self {
        Self {
            extractor: EntityExtractor::new(),
        }
    }

    /// Extract entities from text
    fn extract<'py>(&self, text: &str, py: Python<'py>) -> PyResult<Vec<Bound<'py, PyDict>>> {
        self.extractor
            .extract(text)
            .iter()
            .map(|e| -> PyResult<Bound<'py, PyDict>> {
                let dict = PyDict::new_bound(py);
                dict.set_item("kind", e.kind.as_str())?;
                dict.set_item("value", &e.value)?;
                dict.set_item("original", &e.original)?;
                dict.set_item("start", e.start)?;
                dict.set_item("end", e.end)?;
                Ok(dict)
            })
            .collect()
    }
}
