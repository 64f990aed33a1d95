//! Seams to the host platform's notification channels. The emailer and
//! printer services build messages/documents here and hand them to a
//! pluggable transport or renderer.

pub mod outbox;
pub mod text;

use uuid::Uuid;

use crate::errors::ControlError;

/// One outbound reminder email covering every to-be-sent line of a
/// (partner, policy) group.
#[derive(Debug, Clone)]
pub struct DunningEmail {
    pub partner_id: Uuid,
    pub policy_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub line_ids: Vec<Uuid>,
}

/// One row of a dunning document, describing a single reminder line.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub invoice_number: String,
    pub date_due: chrono::NaiveDate,
    pub amount_due: f64,
    pub level_name: String,
}

/// A combined dunning document for one (partner, policy) group.
#[derive(Debug, Clone)]
pub struct DunningDocument {
    pub partner_name: String,
    pub policy_name: String,
    pub entries: Vec<DocumentEntry>,
}

/// Outbound mail channel. Implementations decide delivery; the emailer
/// only advances lines whose send call returned Ok.
pub trait MailTransport: Send + Sync {
    fn send(&self, email: &DunningEmail) -> Result<(), ControlError>;
}

/// Report engine seam turning a dunning document into its rendered form.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &DunningDocument) -> Result<String, ControlError>;
}

pub use outbox::OutboxMailer;
pub use text::TextRenderer;
