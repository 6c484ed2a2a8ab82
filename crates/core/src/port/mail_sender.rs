// Mail Sender Port
// Outbound delivery abstraction; template rendering is out of scope,
// messages are plain text.

use async_trait::async_trait;
use thiserror::Error;

/// A rendered, ready-to-send message
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery errors
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Recipient rejected: {0}")]
    RecipientRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Mail sender trait
///
/// Implementations:
/// - OutboxMailSender: writes messages to an outbox directory (production default)
/// - MockMailSender: records messages, scriptable failures (tests)
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a single message
    async fn send(&self, message: &MailMessage) -> Result<(), SendError>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock sender behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always deliver
        Success,
        /// Always fail with message
        Fail(String),
        /// Fail the first N attempts, then deliver
        FailFirst(usize),
    }

    /// Mock MailSender for testing
    pub struct MockMailSender {
        behavior: Mutex<MockBehavior>,
        sent: Mutex<Vec<MailMessage>>,
        attempts: Mutex<usize>,
    }

    impl MockMailSender {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Mutex::new(behavior),
                sent: Mutex::new(Vec::new()),
                attempts: Mutex::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn sent_messages(&self) -> Vec<MailMessage> {
            self.sent.lock().unwrap().clone()
        }

        pub fn attempt_count(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl MailSender for MockMailSender {
        async fn send(&self, message: &MailMessage) -> Result<(), SendError> {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                *attempts += 1;
                *attempts
            };

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Success => {
                    self.sent.lock().unwrap().push(message.clone());
                    Ok(())
                }
                MockBehavior::Fail(msg) => Err(SendError::Transport(msg)),
                MockBehavior::FailFirst(n) => {
                    if attempt <= n {
                        Err(SendError::Transport(format!("induced failure {}", attempt)))
                    } else {
                        self.sent.lock().unwrap().push(message.clone());
                        Ok(())
                    }
                }
            }
        }
    }
}
