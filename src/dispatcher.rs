//! Command dispatcher
//!
//! Normalizes input, asks each intent source in turn (classifier first when
//! enabled, then the rule table), runs the handler for the first resolution
//! and turns whatever happens into a reply. `process` never fails.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::classifier::{Classifier, ClassifierBridge, EnsembleStrategy, ModelStore};
use crate::collab::{AppTable, Collaborators};
use crate::config::{ButlerConfig, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::error::ButlerError;
use crate::handlers::{HandlerContext, HandlerSet};
use crate::matcher::RuleMatcher;
use crate::registry::IntentRegistry;
use crate::responses::{FixedResponses, RandomResponses, ResponseCategory, ResponseProvider};
use crate::types::{ClassificationResult, Command, Intent, MatchResult};

/// How a command was resolved to an intent.
#[derive(Debug, Clone)]
pub enum ResolutionSource {
    Rule(MatchResult),
    Classifier(ClassificationResult),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub intent: Intent,
    pub source: ResolutionSource,
}

impl Resolution {
    fn context<'a>(&'a self, command: &'a Command) -> HandlerContext<'a> {
        match &self.source {
            ResolutionSource::Rule(captures) => HandlerContext::from_rule(&command.raw, &command.normalized, captures),
            ResolutionSource::Classifier(result) => {
                HandlerContext::from_classifier(&command.raw, &command.normalized, result)
            }
        }
    }
}

/// One link in the resolution chain.
pub trait IntentSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, command: &Command) -> Option<Resolution>;
}

/// Trained classifiers, gated by confidence.
pub struct ClassifierStage {
    bridge: Arc<ClassifierBridge>,
    threshold: f64,
    strategy: EnsembleStrategy,
}

impl ClassifierStage {
    pub fn new(bridge: Arc<ClassifierBridge>, threshold: f64, strategy: EnsembleStrategy) -> Self {
        Self {
            bridge,
            threshold,
            strategy,
        }
    }
}

impl IntentSource for ClassifierStage {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn resolve(&self, command: &Command) -> Option<Resolution> {
        let result = self
            .bridge
            .resolve(&command.normalized, self.threshold, self.strategy)?;
        let intent = result.intent?;
        debug!(
            intent = %intent,
            confidence = result.confidence,
            model = %result.model_key,
            "classifier resolved"
        );
        Some(Resolution {
            intent,
            source: ResolutionSource::Classifier(result),
        })
    }
}

/// The ordered rule table.
pub struct RuleStage {
    matcher: RuleMatcher,
}

impl RuleStage {
    pub fn new(matcher: RuleMatcher) -> Self {
        Self { matcher }
    }
}

impl IntentSource for RuleStage {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn resolve(&self, command: &Command) -> Option<Resolution> {
        let (intent, captures) = self.matcher.match_text(&command.normalized)?;
        Some(Resolution {
            intent,
            source: ResolutionSource::Rule(captures),
        })
    }
}

pub struct Dispatcher {
    stages: Vec<Box<dyn IntentSource>>,
    handlers: HandlerSet,
    responses: Arc<dyn ResponseProvider>,
    classifier: Option<Arc<ClassifierBridge>>,
}

impl Dispatcher {
    pub fn builder(handlers: HandlerSet) -> DispatcherBuilder {
        DispatcherBuilder::new(handlers)
    }

    /// Build the full pipeline from configuration.
    ///
    /// Custom rules go ahead of the built-ins. When the classifier is enabled
    /// every model saved under `paths.models_dir` is loaded.
    pub fn from_config(config: &ButlerConfig, collab: Collaborators) -> Result<Self, ButlerError> {
        config.validate()?;
        let registry = IntentRegistry::with_custom(&config.rules)?;
        let responses: Arc<dyn ResponseProvider> = if config.personality.randomize {
            Arc::new(RandomResponses::new(config.personality.user_name.clone()))
        } else {
            Arc::new(FixedResponses::new(config.personality.user_name.clone()))
        };
        let handlers = HandlerSet::new(collab, AppTable::new(&config.apps), responses.clone());

        let mut builder = DispatcherBuilder::new(handlers)
            .responses(responses)
            .registry(Arc::new(registry));

        if config.dispatch.classifier_enabled {
            let store = ModelStore::new(&config.paths.models_dir, &config.paths.training_data_dir);
            let models: Vec<Arc<dyn Classifier>> = store
                .load_all()
                .into_iter()
                .map(|m| Arc::new(m) as Arc<dyn Classifier>)
                .collect();
            info!(count = models.len(), "classifier models loaded");
            builder = builder.classifier(
                Arc::new(ClassifierBridge::from_models(models)),
                config.dispatch.confidence_threshold,
                config.dispatch.ensemble,
            );
        }

        builder.build()
    }

    /// Resolve `text` without running a handler.
    pub fn interpret(&self, text: &str) -> Option<Resolution> {
        let command = Command::new(text);
        if command.is_empty() {
            return None;
        }
        self.resolve(&command)
    }

    fn resolve(&self, command: &Command) -> Option<Resolution> {
        self.stages.iter().find_map(|stage| {
            let resolution = stage.resolve(command)?;
            debug!(stage = stage.name(), intent = %resolution.intent, "resolved");
            Some(resolution)
        })
    }

    /// Interpret and act on one command, returning the reply to speak.
    pub fn process(&self, text: &str) -> String {
        let command = Command::new(text);
        if command.is_empty() {
            return self.responses.render(ResponseCategory::DidntCatch);
        }

        let Some(resolution) = self.resolve(&command) else {
            debug!(text = %command.normalized, "no intent matched");
            return self.responses.render(ResponseCategory::Unrecognized);
        };

        let ctx = resolution.context(&command);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handlers.handle(resolution.intent, &ctx)));

        match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(intent = %resolution.intent, error = %e, "handler failed");
                self.responses.render_failure(&e.to_string())
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(intent = %resolution.intent, %reason, "handler panicked");
                self.responses.render_failure("something went wrong on my end")
            }
        }
    }

    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    /// The classifier bridge, for installing retrained models.
    pub fn classifier(&self) -> Option<&Arc<ClassifierBridge>> {
        self.classifier.as_ref()
    }
}

pub struct DispatcherBuilder {
    handlers: HandlerSet,
    responses: Option<Arc<dyn ResponseProvider>>,
    registry: Option<Arc<IntentRegistry>>,
    classifier: Option<ClassifierStageConfig>,
}

struct ClassifierStageConfig {
    bridge: Arc<ClassifierBridge>,
    threshold: f64,
    strategy: EnsembleStrategy,
}

impl DispatcherBuilder {
    pub fn new(handlers: HandlerSet) -> Self {
        Self {
            handlers,
            responses: None,
            registry: None,
            classifier: None,
        }
    }

    pub fn responses(mut self, responses: Arc<dyn ResponseProvider>) -> Self {
        self.responses = Some(responses);
        self
    }

    /// Rule table; the built-in table when not set.
    pub fn registry(mut self, registry: Arc<IntentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Consult `bridge` before the rules.
    pub fn classifier(mut self, bridge: Arc<ClassifierBridge>, threshold: f64, strategy: EnsembleStrategy) -> Self {
        self.classifier = Some(ClassifierStageConfig {
            bridge,
            threshold,
            strategy,
        });
        self
    }

    /// Same as [`classifier`](Self::classifier) with the default threshold
    /// and strategy.
    pub fn default_classifier(self, bridge: Arc<ClassifierBridge>) -> Self {
        self.classifier(bridge, DEFAULT_CONFIDENCE_THRESHOLD, EnsembleStrategy::default())
    }

    pub fn build(self) -> Result<Dispatcher, ButlerError> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(IntentRegistry::builtin()?),
        };
        let responses = self
            .responses
            .unwrap_or_else(|| Arc::new(RandomResponses::new("sir")));

        let mut stages: Vec<Box<dyn IntentSource>> = Vec::new();
        let mut bridge = None;
        if let Some(cfg) = self.classifier {
            bridge = Some(cfg.bridge.clone());
            stages.push(Box::new(ClassifierStage::new(cfg.bridge, cfg.threshold, cfg.strategy)));
        }
        stages.push(Box::new(RuleStage::new(RuleMatcher::new(registry))));

        Ok(Dispatcher {
            stages,
            handlers: self.handlers,
            responses,
            classifier: bridge,
        })
    }
}
