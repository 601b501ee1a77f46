//! Butler core - command interpretation and dispatch for a desktop assistant
//!
//! A command is normalized, offered to the trained classifiers (used only
//! when confident), then to an ordered table of regular-expression rules
//! (first match wins). The resolved intent's handler acts through
//! collaborator traits and returns the reply to speak.

pub mod classifier;
pub mod collab;
pub mod config;
pub mod dispatcher;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod matcher;
pub mod registry;
pub mod responses;
pub mod timeparse;
pub mod types;

pub use classifier::{Classifier, ClassifierBridge, EnsembleStrategy, ModelKind, ModelStore, TrainedModel};
pub use collab::Collaborators;
pub use config::{init_tracing, ButlerConfig};
pub use dispatcher::{Dispatcher, DispatcherBuilder, IntentSource, Resolution, ResolutionSource};
pub use entities::EntityExtractor;
pub use error::*;
pub use handlers::{HandlerContext, HandlerSet, KnownFolders};
pub use intake::{CommandIntake, Reply};
pub use matcher::RuleMatcher;
pub use registry::{IntentRegistry, PatternRule, RuleSpec};
pub use responses::{FixedResponses, RandomResponses, ResponseCategory, ResponseProvider};
pub use timeparse::{parse_time, try_parse_time};
pub use types::*;

// Python bindings
#[cfg(feature = "python")]
pub mod py;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn butler_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyButler>()?;
    m.add_class::<PyEntityExtractor>()?;
    m.add_function(wrap_pyfunction!(py_parse_time, m)?)?;
    Ok(())
}
