//! Groups to-be-sent lines per (partner, policy), renders one reminder
//! email per group, and advances only the lines whose dispatch
//! succeeded.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{info, warn};
use uuid::Uuid;

use crate::control::{Channel, ControlBook, ControlLine, LineState};
use crate::dispatch::{DunningEmail, MailTransport};
use crate::errors::ControlError;

use super::ServiceResult;

/// Line counts from one emailer invocation. Failed lines stay
/// `to_be_sent` so a later attempt can pick them up again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct EmailerService;

impl EmailerService {
    pub fn email_lines(
        book: &mut ControlBook,
        ids: &[Uuid],
        transport: &dyn MailTransport,
    ) -> ServiceResult<EmailReport> {
        for id in ids {
            if book.line(*id).is_none() {
                return Err(ControlError::InvalidRef(format!("unknown line {id}")).into());
            }
        }

        // Only email-channel lines queued for sending participate;
        // everything else in the selection is skipped silently. Letter
        // lines go through the printer instead.
        let mut groups: BTreeMap<(Uuid, Uuid), Vec<Uuid>> = BTreeMap::new();
        for id in ids {
            if let Some(line) = book.line(*id) {
                if line.state == LineState::ToBeSent && line.channel == Channel::Email {
                    groups
                        .entry((line.partner_id, line.policy_id))
                        .or_default()
                        .push(line.id);
                }
            }
        }

        let mut report = EmailReport::default();
        for ((partner_id, policy_id), line_ids) in groups {
            match build_email(book, partner_id, policy_id, &line_ids) {
                Ok(email) => match transport.send(&email) {
                    Ok(()) => {
                        for id in &line_ids {
                            if let Some(line) = book.line_mut(*id) {
                                line.state = LineState::Sent;
                            }
                        }
                        report.sent += line_ids.len();
                    }
                    Err(err) => {
                        warn!(%partner_id, %policy_id, error = %err, "dunning email rejected");
                        report.failed += line_ids.len();
                    }
                },
                Err(err) => {
                    warn!(%partner_id, %policy_id, error = %err, "dunning email not built");
                    report.failed += line_ids.len();
                }
            }
        }
        if report.sent > 0 {
            book.touch();
        }
        info!(sent = report.sent, failed = report.failed, "emailer finished");
        Ok(report)
    }
}

fn build_email(
    book: &ControlBook,
    partner_id: Uuid,
    policy_id: Uuid,
    line_ids: &[Uuid],
) -> Result<DunningEmail, ControlError> {
    let partner = book
        .partner(partner_id)
        .ok_or_else(|| ControlError::InvalidRef(format!("unknown partner {partner_id}")))?;
    let recipient = partner
        .email
        .clone()
        .ok_or_else(|| ControlError::Mail(format!("partner {} has no email", partner.name)))?;
    let policy = book
        .policy(policy_id)
        .ok_or_else(|| ControlError::InvalidRef(format!("unknown policy {policy_id}")))?;

    let lines: Vec<&ControlLine> = line_ids.iter().filter_map(|id| book.line(*id)).collect();
    // The sternest level in the group provides the message template.
    let top = lines
        .iter()
        .max_by_key(|line| line.level_index)
        .ok_or_else(|| ControlError::Mail("empty email group".into()))?;
    let template = book
        .policy(policy_id)
        .and_then(|p| p.level(top.level_index))
        .map(|level| level.custom_text.clone())
        .unwrap_or_default();

    let mut body = String::new();
    if !template.is_empty() {
        body.push_str(&template);
        body.push_str("\n\n");
    }
    for line in &lines {
        let number = book
            .invoice(line.invoice_id)
            .map(|inv| inv.number.clone())
            .unwrap_or_else(|| line.invoice_id.to_string());
        let _ = writeln!(
            body,
            "{}  due {}  {:.2}",
            number, line.date_due, line.balance_due
        );
    }

    Ok(DunningEmail {
        partner_id,
        policy_id,
        recipient,
        subject: format!("Payment reminder - {}", policy.name),
        body,
        line_ids: line_ids.to_vec(),
    })
}
