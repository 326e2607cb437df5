use log::{debug, info};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::sentiment::{ClassificationResult, Classifier, Sentiment};

pub const EMPTY_INPUT: &str = "Please enter some text to analyze";
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from API";

pub const BUTTON_IDLE: &str = "Analyze";
pub const BUTTON_BUSY: &str = "Analyzing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const LIGHT_GREEN: Rgb = Rgb(200, 255, 200);
    pub const LIGHT_RED: Rgb = Rgb(255, 200, 200);
    pub const LIGHT_GRAY: Rgb = Rgb(230, 230, 230);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// What the UI surface shows: a background color and a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Loading,
    Positive,
    Negative,
    Neutral,
    Unrecognized(String),
    Error(String),
}

impl From<ClassificationResult> for DisplayState {
    fn from(result: ClassificationResult) -> Self {
        match result {
            ClassificationResult::Sentiment(Sentiment::Positive) => DisplayState::Positive,
            ClassificationResult::Sentiment(Sentiment::Negative) => DisplayState::Negative,
            ClassificationResult::Sentiment(Sentiment::Neutral) => DisplayState::Neutral,
            ClassificationResult::Unrecognized(raw) => DisplayState::Unrecognized(raw),
            ClassificationResult::Failure { message, .. } => DisplayState::Error(message),
        }
    }
}

impl DisplayState {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayState::Idle => "idle",
            DisplayState::Loading => "loading",
            DisplayState::Positive => "positive",
            DisplayState::Negative => "negative",
            DisplayState::Neutral => "neutral",
            DisplayState::Unrecognized(_) => "unrecognized",
            DisplayState::Error(_) => "error",
        }
    }

    pub fn background(&self) -> Rgb {
        match self {
            DisplayState::Positive => Rgb::LIGHT_GREEN,
            DisplayState::Negative => Rgb::LIGHT_RED,
            DisplayState::Neutral => Rgb::LIGHT_GRAY,
            _ => Rgb::WHITE,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DisplayState::Idle => String::new(),
            DisplayState::Loading => "Processing...".to_string(),
            DisplayState::Positive => "Positive sentiment 😊".to_string(),
            DisplayState::Negative => "Negative sentiment 😔".to_string(),
            DisplayState::Neutral => "Neutral sentiment 😐".to_string(),
            DisplayState::Unrecognized(raw) => format!("Could not determine sentiment: {}", raw),
            DisplayState::Error(message) => message.clone(),
        }
    }

    /// Transient notification (a toast on mobile), if the state calls for one.
    pub fn notice(&self) -> Option<String> {
        match self {
            DisplayState::Unrecognized(_) => Some(UNEXPECTED_RESPONSE.to_string()),
            DisplayState::Error(message) => Some(message.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Please enter some text to analyze")]
    EmptyInput,
    #[error("A request is already in flight")]
    Busy,
}

struct InFlight {
    result: oneshot::Receiver<ClassificationResult>,
    task: JoinHandle<()>,
}

/// Headless UI model. Allows one outstanding request at a time:
/// `Idle -> Loading -> result`, or back to `Idle` on cancel.
pub struct Presenter {
    classifier: Arc<dyn Classifier>,
    state: DisplayState,
    in_flight: Option<InFlight>,
}

impl Presenter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            state: DisplayState::Idle,
            in_flight: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    #[inline]
    pub fn can_submit(&self) -> bool {
        self.in_flight.is_none()
    }

    pub fn button_label(&self) -> &'static str {
        if self.can_submit() {
            BUTTON_IDLE
        } else {
            BUTTON_BUSY
        }
    }

    /// Starts a classification in the background. Must be called inside a tokio runtime.
    pub fn submit(&mut self, input: &str) -> Result<(), SubmitError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if !self.can_submit() {
            return Err(SubmitError::Busy);
        }

        let (tx, rx) = oneshot::channel();
        let classifier = self.classifier.clone();
        let text = text.to_string();

        let task = tokio::spawn(async move {
            let result = classifier.classify(&text).await;
            if tx.send(result).is_err() {
                debug!("Result dropped, request was cancelled");
            }
        });

        self.state = DisplayState::Loading;
        self.in_flight = Some(InFlight { result: rx, task });
        Ok(())
    }

    /// Waits for the in-flight request, if any, and applies its result.
    pub async fn wait(&mut self) -> &DisplayState {
        self.wait_or_cancel(std::future::pending::<()>()).await
    }

    /// Like `wait`, but cancels the request if `signal` resolves first.
    pub async fn wait_or_cancel<F>(&mut self, signal: F) -> &DisplayState
    where
        F: Future,
    {
        let received = match self.in_flight.as_mut() {
            Some(in_flight) => tokio::select! {
                received = &mut in_flight.result => Some(received),
                _ = signal => None,
            },
            None => return &self.state,
        };

        match received {
            Some(Ok(result)) => {
                self.in_flight = None;
                info!("Classification finished: {}", result);
                self.state = DisplayState::from(result);
            }
            Some(Err(_)) => {
                self.in_flight = None;
                self.state = DisplayState::Error("Request ended without a result".to_string());
            }
            None => {
                self.cancel();
            }
        }
        &self.state
    }

    /// Aborts the in-flight request. Returns false when there was none.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.task.abort();
                self.state = DisplayState::Idle;
                info!("Classification cancelled");
                true
            }
            None => false,
        }
    }
}
