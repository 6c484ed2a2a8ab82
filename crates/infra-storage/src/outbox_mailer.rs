// Outbox MailSender implementation
//
// Messages are written as JSON files into an outbox directory; a relay
// outside this process picks them up and does the actual SMTP send.

use async_trait::async_trait;
use credent_core::port::{MailMessage, MailSender, SendError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub struct OutboxMailSender {
    outbox_dir: PathBuf,
    sequence: AtomicU64,
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    queued_at: i64,
}

impl OutboxMailSender {
    pub fn new(outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl MailSender for OutboxMailSender {
    async fn send(&self, message: &MailMessage) -> Result<(), SendError> {
        if message.to.trim().is_empty() || !message.to.contains('@') {
            return Err(SendError::RecipientRejected(message.to.clone()));
        }

        tokio::fs::create_dir_all(&self.outbox_dir)
            .await
            .map_err(|e| SendError::Io(format!("{}: {}", self.outbox_dir.display(), e)))?;

        let queued_at = chrono::Utc::now().timestamp_millis();
        let entry = OutboxEntry {
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
            queued_at,
        };
        let bytes = serde_json::to_vec_pretty(&entry)
            .map_err(|e| SendError::Io(format!("serialize outbox entry: {}", e)))?;

        // Timestamp plus per-process sequence keeps names unique within a
        // delivery batch
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = self.outbox_dir.join(format!("{}_{:04}.json", queued_at, seq));

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| SendError::Io(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SendError::Io(format!("{}: {}", path.display(), e)))?;

        debug!(to = %message.to, file = %path.display(), "Message written to outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_writes_outbox_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sender = OutboxMailSender::new(tmp.path());

        let message = MailMessage {
            to: "worker@example.test".to_string(),
            subject: "Certificate expiring".to_string(),
            body: "Your FIRST-AID certificate expires soon.".to_string(),
        };
        sender.send(&message).await.unwrap();

        let mut entries = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<_>>();
        assert_eq!(entries.len(), 1);

        let contents = std::fs::read_to_string(entries.pop().unwrap()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["to"], "worker@example.test");
        assert_eq!(parsed["subject"], "Certificate expiring");
    }

    #[tokio::test]
    async fn test_send_rejects_bad_recipient() {
        let tmp = tempfile::tempdir().unwrap();
        let sender = OutboxMailSender::new(tmp.path());

        let message = MailMessage {
            to: "no-at-sign".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        let err = sender.send(&message).await.unwrap_err();
        assert!(matches!(err, SendError::RecipientRejected(_)));
    }

    #[tokio::test]
    async fn test_sequential_sends_get_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let sender = OutboxMailSender::new(tmp.path());

        for i in 0..3 {
            let message = MailMessage {
                to: format!("user{}@example.test", i),
                subject: "s".to_string(),
                body: "b".to_string(),
            };
            sender.send(&message).await.unwrap();
        }

        let count = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(count, 3);
    }
}
