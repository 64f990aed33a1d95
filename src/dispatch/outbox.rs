use std::collections::HashSet;
use std::sync::Mutex;

use super::{DunningEmail, MailTransport};
use crate::errors::ControlError;

/// In-memory mail transport: accepted messages land in an outbox the
/// caller can inspect. Individual recipients can be made to fail, which
/// is how partial-dispatch behavior is exercised.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    messages: Mutex<Vec<DunningEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send to `recipient` fail until further notice.
    pub fn fail_recipient(&self, recipient: impl Into<String>) {
        self.failing
            .lock()
            .expect("outbox lock poisoned")
            .insert(recipient.into());
    }

    pub fn messages(&self) -> Vec<DunningEmail> {
        self.messages
            .lock()
            .expect("outbox lock poisoned")
            .clone()
    }
}

impl MailTransport for OutboxMailer {
    fn send(&self, email: &DunningEmail) -> Result<(), ControlError> {
        let failing = self.failing.lock().expect("outbox lock poisoned");
        if failing.contains(&email.recipient) {
            return Err(ControlError::Mail(format!(
                "recipient {} rejected",
                email.recipient
            )));
        }
        drop(failing);
        self.messages
            .lock()
            .expect("outbox lock poisoned")
            .push(email.clone());
        Ok(())
    }
}
