//! Renders combined dunning documents per (partner, policy) group.
//! Read-only: printing never changes line state.

use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use crate::control::{ControlBook, ControlLine};
use crate::dispatch::{DocumentEntry, DocumentRenderer, DunningDocument};
use crate::errors::ControlError;

use super::{ServiceError, ServiceResult};

pub struct PrinterService;

impl PrinterService {
    /// Renders one combined document per (partner, policy) group of the
    /// selected lines, in a stable order.
    pub fn print_lines(
        book: &ControlBook,
        ids: &[Uuid],
        renderer: &dyn DocumentRenderer,
    ) -> ServiceResult<Vec<String>> {
        if ids.is_empty() {
            return Err(ServiceError::Invalid(
                "No credit control lines selected".into(),
            ));
        }
        for id in ids {
            if book.line(*id).is_none() {
                return Err(ControlError::InvalidRef(format!("unknown line {id}")).into());
            }
        }

        let mut groups: BTreeMap<(Uuid, Uuid), Vec<&ControlLine>> = BTreeMap::new();
        for id in ids {
            if let Some(line) = book.line(*id) {
                groups
                    .entry((line.partner_id, line.policy_id))
                    .or_default()
                    .push(line);
            }
        }

        let mut documents = Vec::with_capacity(groups.len());
        for ((partner_id, policy_id), lines) in groups {
            let partner_name = book
                .partner(partner_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| partner_id.to_string());
            let policy = book.policy(policy_id);
            let policy_name = policy
                .map(|p| p.name.clone())
                .unwrap_or_else(|| policy_id.to_string());

            let entries = lines
                .iter()
                .map(|line| DocumentEntry {
                    invoice_number: book
                        .invoice(line.invoice_id)
                        .map(|inv| inv.number.clone())
                        .unwrap_or_else(|| line.invoice_id.to_string()),
                    date_due: line.date_due,
                    amount_due: line.amount_due,
                    level_name: policy
                        .and_then(|p| p.level(line.level_index))
                        .map(|level| level.name.clone())
                        .unwrap_or_default(),
                })
                .collect();

            let document = DunningDocument {
                partner_name,
                policy_name,
                entries,
            };
            documents.push(renderer.render(&document).map_err(ServiceError::from)?);
        }
        info!(documents = documents.len(), lines = ids.len(), "printed lines");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::policy::{Channel, Policy, PolicyLevel};
    use crate::control::{LineState, Partner};
    use crate::dispatch::TextRenderer;
    use chrono::NaiveDate;

    fn sample_book() -> (ControlBook, Vec<Uuid>) {
        let mut book = ControlBook::new("Printer");
        let mut policy = Policy::new("Reminders");
        policy
            .push_level(PolicyLevel::new("First", 15, Channel::Letter))
            .unwrap();
        let policy_id = book.add_policy(policy);
        let partner_id = book.add_partner(Partner::new("Acme"));
        let level_id = book.policy(policy_id).unwrap().levels[0].id;
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let line = ControlLine::new(
            Uuid::new_v4(),
            partner_id,
            policy_id,
            level_id,
            0,
            date,
            date,
            99.0,
            Channel::Letter,
        );
        let ids = vec![book.add_line(line)];
        (book, ids)
    }

    #[test]
    fn printing_never_mutates_line_state() {
        let (book, ids) = sample_book();
        let before: Vec<LineState> = book.lines.iter().map(|l| l.state).collect();
        let documents = PrinterService::print_lines(&book, &ids, &TextRenderer::new()).unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].contains("Acme"));
        let after: Vec<LineState> = book.lines.iter().map(|l| l.state).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let (book, _) = sample_book();
        let err = PrinterService::print_lines(&book, &[], &TextRenderer::new())
            .expect_err("empty selection must fail");
        assert!(matches!(err, ServiceError::Invalid(_)));
    }
}
