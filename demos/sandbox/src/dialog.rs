//! Scripted conversations.
//!
//! A script is written as straight-line async code that asks questions and
//! waits for answers. It runs on its own task and talks to the subscriber
//! that owns the conversation over two single-slot channels: steps (events
//! to emit, questions to show) flow out, choices flow back in.
//!
//! The owning subscriber drives it from inside its handler: on each delivery
//! that concerns the conversation it hands over a choice and then awaits the
//! script's next step while still holding the delivery, so every event the
//! script emits becomes a follow-up of that delivery.

use std::future::Future;
use std::sync::Arc;

use engine_bus::{Delivery, Event};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A question with its possible answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub choices: Vec<String>,
}

#[derive(Debug)]
enum Step {
    Emit(Event),
    Ask(Prompt),
}

/// The script's side of a conversation.
///
/// Every method returns `None` once the conversation has been abandoned, so
/// scripts can bail out with `?`.
#[derive(Debug)]
pub struct Prompter {
    steps: mpsc::Sender<Step>,
    choices: mpsc::Receiver<usize>,
}

impl Prompter {
    /// Ask a question and wait for the index of the chosen answer.
    pub async fn prompt(&mut self, text: impl Into<String>, choices: &[&str]) -> Option<usize> {
        let prompt = Prompt {
            text: text.into(),
            choices: choices.iter().map(|choice| (*choice).to_owned()).collect(),
        };
        self.steps.send(Step::Ask(prompt)).await.ok()?;
        self.choices.recv().await
    }

    /// Emit an event as a follow-up of the delivery currently driving the
    /// conversation.
    pub async fn emit(&mut self, event: Event) -> Option<()> {
        self.steps.send(Step::Emit(event)).await.ok()
    }
}

/// A conversation script. Cheap to clone; each run gets a fresh
/// [`Prompter`].
pub type DialogScript = Arc<dyn Fn(Prompter) -> BoxFuture<'static, Option<()>> + Send + Sync>;

/// Wrap an async closure as a [`DialogScript`].
pub fn script<F, Fut>(f: F) -> DialogScript
where
    F: Fn(Prompter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<()>> + Send + 'static,
{
    Arc::new(move |prompter| f(prompter).boxed())
}

/// The owner's side of one running conversation.
#[derive(Debug)]
pub struct Dialog {
    steps: mpsc::Receiver<Step>,
    choices: mpsc::Sender<usize>,
    /// Number of answers to the question currently shown.
    open_choices: usize,
    worker: JoinHandle<()>,
}

impl Dialog {
    /// Start `script` and drive it to its first question.
    ///
    /// Returns the conversation and its first question, or `None` for the
    /// question if the script finished without asking anything.
    pub async fn start(script: &DialogScript, delivery: &Delivery) -> (Self, Option<Prompt>) {
        let (step_tx, step_rx) = mpsc::channel(1);
        let (choice_tx, choice_rx) = mpsc::channel(1);
        let run = script(Prompter {
            steps: step_tx,
            choices: choice_rx,
        });
        let worker = tokio::spawn(async move {
            if run.await.is_none() {
                debug!("dialog abandoned");
            }
        });

        let mut dialog = Self {
            steps: step_rx,
            choices: choice_tx,
            open_choices: 0,
            worker,
        };
        let prompt = dialog.advance(delivery).await;
        (dialog, prompt)
    }

    /// Number of answers to the question currently shown.
    #[must_use]
    pub fn open_choices(&self) -> usize {
        self.open_choices
    }

    /// Answer the current question and drive the script to its next one.
    ///
    /// Returns `None` once the script has finished.
    pub async fn answer(&mut self, choice: usize, delivery: &Delivery) -> Option<Prompt> {
        self.choices.send(choice).await.ok()?;
        self.advance(delivery).await
    }

    async fn advance(&mut self, delivery: &Delivery) -> Option<Prompt> {
        while let Some(step) = self.steps.recv().await {
            match step {
                Step::Emit(event) => delivery.emit(event),
                Step::Ask(prompt) => {
                    self.open_choices = prompt.choices.len();
                    return Some(prompt);
                }
            }
        }
        self.open_choices = 0;
        None
    }
}

impl Drop for Dialog {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
