//! Serialized command intake
//!
//! Commands can arrive from several places at once (voice, hotkey, text
//! box). They are queued and dispatched one at a time, in arrival order, on
//! a single worker thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, info};

use crate::collab::SpeechSink;
use crate::dispatcher::Dispatcher;
use crate::error::IntakeError;

/// A processed command and the reply that was spoken for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub command: String,
    pub response: String,
}

pub struct CommandIntake {
    commands: Option<Sender<String>>,
    replies: Receiver<Reply>,
    worker: Option<JoinHandle<()>>,
}

impl CommandIntake {
    /// Start the worker. Each reply is spoken through `sink` and then
    /// published on [`replies`](Self::replies).
    pub fn spawn(dispatcher: Arc<Dispatcher>, sink: Arc<dyn SpeechSink>) -> Result<Self, IntakeError> {
        let (command_tx, command_rx) = channel::unbounded::<String>();
        let (reply_tx, reply_rx) = channel::unbounded::<Reply>();

        let worker = thread::Builder::new()
            .name("butler-intake".to_string())
            .spawn(move || {
                for command in command_rx {
                    let response = dispatcher.process(&command);
                    sink.speak(&response);
                    // Nobody listening for replies is fine
                    let _ = reply_tx.send(Reply { command, response });
                }
                debug!("intake worker exiting");
            })?;

        info!("command intake started");
        Ok(Self {
            commands: Some(command_tx),
            replies: reply_rx,
            worker: Some(worker),
        })
    }

    /// Queue a command behind any already waiting.
    pub fn submit(&self, text: impl Into<String>) -> Result<(), IntakeError> {
        self.commands
            .as_ref()
            .ok_or(IntakeError::Closed)?
            .send(text.into())
            .map_err(|_| IntakeError::Closed)
    }

    pub fn replies(&self) -> &Receiver<Reply> {
        &self.replies
    }

    /// Stop accepting commands and wait for the queued ones to finish.
    pub fn shutdown(&mut self) {
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            info!("command intake stopped");
        }
    }
}

impl Drop for CommandIntake {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::AppTable;
    use crate::handlers::testing::Harness;
    use crate::handlers::HandlerSet;
    use crate::responses::FixedResponses;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSpeech {
        spoken: Mutex<Vec<String>>,
    }

    impl SpeechSink for RecordingSpeech {
        fn speak(&self, text: &str) {
            self.spoken.lock().push(text.to_string());
        }
    }

    fn dispatcher(h: &Harness) -> Arc<Dispatcher> {
        let responses = Arc::new(FixedResponses::default());
        let handlers = HandlerSet::new(h.collab.clone(), AppTable::default(), responses.clone());
        Arc::new(Dispatcher::builder(handlers).responses(responses).build().unwrap())
    }

    #[test]
    fn test_commands_processed_in_order() {
        let h = Harness::new();
        let speech = Arc::new(RecordingSpeech::default());
        let mut intake = CommandIntake::spawn(dispatcher(&h), speech.clone()).unwrap();

        intake.submit("open notepad").unwrap();
        intake.submit("").unwrap();
        intake.submit("open calculator").unwrap();
        intake.shutdown();

        let replies: Vec<Reply> = intake.replies().try_iter().collect();
        let commands: Vec<&str> = replies.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, ["open notepad", "", "open calculator"]);
        assert_eq!(replies[1].response, "I didn't catch that. Could you please repeat?");

        assert_eq!(h.process.launched(), vec!["notepad.exe", "calc.exe"]);
        assert_eq!(speech.spoken.lock().len(), 3);
    }

    #[test]
    fn test_worker_survives_panicking_model() {
        use crate::classifier::testing::PanickingClassifier;
        use crate::classifier::{Classifier, ClassifierBridge};

        let h = Harness::new();
        let responses = Arc::new(FixedResponses::default());
        let handlers = HandlerSet::new(h.collab.clone(), AppTable::default(), responses.clone());
        let bridge = ClassifierBridge::from_models(vec![Arc::new(PanickingClassifier) as Arc<dyn Classifier>]);
        let dispatcher = Dispatcher::builder(handlers)
            .responses(responses)
            .default_classifier(Arc::new(bridge))
            .build()
            .unwrap();
        let mut intake = CommandIntake::spawn(Arc::new(dispatcher), Arc::new(RecordingSpeech::default())).unwrap();

        intake.submit("open notepad").unwrap();
        intake.submit("open calculator").unwrap();
        intake.shutdown();

        assert_eq!(intake.replies().try_iter().count(), 2);
        assert_eq!(h.process.launched(), vec!["notepad.exe", "calc.exe"]);
    }

    #[test]
    fn test_submit_after_shutdown() {
        let h = Harness::new();
        let mut intake = CommandIntake::spawn(dispatcher(&h), Arc::new(RecordingSpeech::default())).unwrap();
        intake.shutdown();
        intake.shutdown();

        assert!(matches!(intake.submit("open notepad"), Err(IntakeError::Closed)));
    }
}
