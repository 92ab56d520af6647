//! Question answering over the filtered data via a chat-completion service.
//!
//! The shell hands a [`AssistantRequest`] (fixed system instruction, a
//! `describe()` table of the filtered tracts, the user's question) to an
//! [`AssistantWorker`], which runs one blocking round trip on a background
//! thread. Every failure comes back as an [`AssistantError`] whose `Display`
//! is shown to the user as is.

pub mod openai;

use std::fmt;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use thiserror::Error;

/// Role instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful data analyst.";

/// Errors that can occur while asking the assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No API key was entered for this session.
    #[error("Enter an API key to ask the assistant.")]
    MissingCredential,

    /// The question box is blank.
    #[error("Type a question first.")]
    EmptyQuestion,

    /// The current filters match no tracts.
    #[error("No data available for selected filters.")]
    NoData,

    /// A previous question is still being answered.
    #[error("The assistant is still answering the previous question.")]
    Busy,

    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned an error (bad key, quota, ...).
    #[error("Provider error: {message}")]
    Provider {
        /// Message reported by the provider.
        message: String,
    },

    /// The worker thread could not be started.
    #[error("Could not start assistant worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker went away without answering.
    #[error("The assistant request was interrupted.")]
    Disconnected,
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An API key entered for the current session. Kept in memory only: it has
/// no serialization path and its `Debug` output is redacted.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(ApiKey(trimmed.to_string()))
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Request / backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantRequest {
    pub system: String,
    /// Text table describing the filtered tracts.
    pub data_description: String,
    pub question: String,
}

impl AssistantRequest {
    pub fn new(data_description: String, question: &str) -> Result<Self, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }
        Ok(AssistantRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            data_description,
            question: question.to_string(),
        })
    }

    /// The user turn: data description followed by the question.
    pub fn user_message(&self) -> String {
        format!(
            "Here is a statistical summary of the filtered food access data:\n{}\n\nQuestion: {}",
            self.data_description, self.question
        )
    }
}

/// A chat-completion service.
pub trait ChatBackend: Send + Sync {
    /// Send one request and return the answer text.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError`] if the request fails for any reason.
    fn complete(&self, key: &ApiKey, request: &AssistantRequest) -> Result<String, AssistantError>;
}

// ---------------------------------------------------------------------------
// Worker: one outstanding request at a time
// ---------------------------------------------------------------------------

pub struct AssistantWorker {
    backend: Arc<dyn ChatBackend>,
    pending: Option<Receiver<Result<String, AssistantError>>>,
}

impl AssistantWorker {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start answering `request` in the background.
    ///
    /// # Errors
    ///
    /// [`AssistantError::Busy`] while a previous request is outstanding.
    pub fn submit(&mut self, key: ApiKey, request: AssistantRequest) -> Result<(), AssistantError> {
        if self.pending.is_some() {
            return Err(AssistantError::Busy);
        }

        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        std::thread::Builder::new()
            .name("assistant".to_string())
            .spawn(move || {
                log::info!("Asking assistant ({} chars of context)", request.data_description.len());
                let result = backend.complete(&key, &request);
                match &result {
                    Ok(answer) => log::info!("Assistant answered ({} chars)", answer.len()),
                    Err(e) => log::error!("Assistant request failed: {e}"),
                }
                // The receiver is gone only if the app shut down.
                let _ = tx.send(result);
            })?;

        self.pending = Some(rx);
        Ok(())
    }

    /// Non-blocking check for the outstanding answer.
    pub fn poll(&mut self) -> Option<Result<String, AssistantError>> {
        let rx = self.pending.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                Some(Err(AssistantError::Disconnected))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Returns a canned answer or fails like an unreachable host.
    pub(crate) struct StubBackend {
        pub answer: Option<String>,
        pub seen: Mutex<Vec<AssistantRequest>>,
    }

    impl StubBackend {
        pub(crate) fn answering(answer: &str) -> Arc<Self> {
            Arc::new(StubBackend {
                answer: Some(answer.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(StubBackend {
                answer: None,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChatBackend for StubBackend {
        fn complete(&self, _key: &ApiKey, request: &AssistantRequest) -> Result<String, AssistantError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answer.clone().ok_or_else(|| AssistantError::Provider {
                message: "network unreachable".to_string(),
            })
        }
    }

    /// Blocks on a gate until released, to keep a request outstanding.
    struct GatedBackend {
        gate: Mutex<Receiver<()>>,
    }

    impl ChatBackend for GatedBackend {
        fn complete(&self, _key: &ApiKey, _request: &AssistantRequest) -> Result<String, AssistantError> {
            let _ = self.gate.lock().unwrap().recv();
            Ok("done".to_string())
        }
    }

    pub(crate) fn wait_for(worker: &mut AssistantWorker) -> Result<String, AssistantError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = worker.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "assistant did not answer");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn key() -> ApiKey {
        ApiKey::new("sk-test").unwrap()
    }

    #[test]
    fn api_key_is_redacted_and_trimmed() {
        let key = ApiKey::new("  sk-secret  ").unwrap();
        assert_eq!(key.expose(), "sk-secret");
        assert!(!format!("{key:?}").contains("sk-secret"));
        assert!(ApiKey::new("   ").is_none());
    }

    #[test]
    fn blank_question_is_rejected() {
        assert!(matches!(
            AssistantRequest::new(String::new(), "  "),
            Err(AssistantError::EmptyQuestion)
        ));
    }

    #[test]
    fn user_message_carries_description_and_question() {
        let req = AssistantRequest::new("count 2".to_string(), " Why? ").unwrap();
        assert_eq!(req.system, SYSTEM_INSTRUCTION);
        assert_eq!(
            req.user_message(),
            "Here is a statistical summary of the filtered food access data:\ncount 2\n\nQuestion: Why?"
        );
    }

    #[test]
    fn worker_returns_answer() {
        let backend = StubBackend::answering("Mostly rural tracts.");
        let mut worker = AssistantWorker::new(backend.clone());
        assert!(worker.poll().is_none());

        let req = AssistantRequest::new("desc".to_string(), "q").unwrap();
        worker.submit(key(), req.clone()).unwrap();
        assert_eq!(wait_for(&mut worker).unwrap(), "Mostly rural tracts.");
        assert!(!worker.is_pending());
        assert_eq!(*backend.seen.lock().unwrap(), vec![req]);
    }

    #[test]
    fn worker_surfaces_failure_as_readable_message() {
        let mut worker = AssistantWorker::new(StubBackend::failing());
        worker
            .submit(key(), AssistantRequest::new("desc".to_string(), "q").unwrap())
            .unwrap();
        let err = wait_for(&mut worker).unwrap_err();
        assert_eq!(err.to_string(), "Provider error: network unreachable");
    }

    #[test]
    fn only_one_request_outstanding() {
        let (release, gate) = mpsc::channel();
        let mut worker = AssistantWorker::new(Arc::new(GatedBackend {
            gate: Mutex::new(gate),
        }));
        let req = AssistantRequest::new("desc".to_string(), "q").unwrap();

        worker.submit(key(), req.clone()).unwrap();
        assert!(worker.is_pending());
        assert!(matches!(worker.submit(key(), req.clone()), Err(AssistantError::Busy)));

        release.send(()).unwrap();
        assert_eq!(wait_for(&mut worker).unwrap(), "done");
        worker.submit(key(), req).unwrap();
        release.send(()).unwrap();
        assert!(wait_for(&mut worker).is_ok());
    }
}
