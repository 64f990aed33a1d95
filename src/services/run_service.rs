//! Credit control run lifecycle: creation, date validation, and line
//! generation.

use std::fmt::Write as _;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::control::run::{evaluate, ControlRun, RunState};
use crate::control::ControlBook;
use crate::errors::ControlError;

use super::{ServiceError, ServiceResult};

pub struct RunService;

impl RunService {
    /// Creates a draft run for the given date and policies. A policy
    /// named more than once participates once.
    pub fn create_run(
        book: &mut ControlBook,
        date: NaiveDate,
        policy_ids: Vec<Uuid>,
    ) -> ServiceResult<Uuid> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(policy_ids.len());
        for policy_id in policy_ids {
            if book.policy(policy_id).is_none() {
                return Err(ServiceError::from(ControlError::InvalidRef(format!(
                    "unknown policy {policy_id}"
                ))));
            }
            if !unique.contains(&policy_id) {
                unique.push(policy_id);
            }
        }
        let id = book.add_run(ControlRun::new(date, unique));
        Ok(id)
    }

    /// Rejects a run date that precedes the most recent completed run of
    /// any of its policies. Runs must move forward in time per policy so
    /// an already-evaluated period is never revisited.
    pub fn check_run_date(
        book: &ControlBook,
        date: NaiveDate,
        policy_ids: &[Uuid],
    ) -> ServiceResult<()> {
        for policy_id in policy_ids {
            if let Some(last) = book.last_run_date(*policy_id) {
                if date < last {
                    let policy = book
                        .policy(*policy_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| policy_id.to_string());
                    return Err(ServiceError::from(ControlError::RunDateBeforeLast {
                        policy,
                        date,
                        last,
                    }));
                }
            }
        }
        Ok(())
    }

    /// Evaluates the run's policies against the book's open invoices,
    /// committing new lines, the report, and the Done state together.
    /// Returns the ids of the generated lines.
    pub fn generate_credit_lines(book: &mut ControlBook, run_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let run = book
            .run(run_id)
            .ok_or_else(|| ControlError::InvalidRef(format!("unknown run {run_id}")))?;
        if run.state == RunState::Done {
            return Err(ServiceError::Invalid(
                "Credit control lines have already been generated for this run".into(),
            ));
        }
        let date = run.date;
        let policy_ids = run.policy_ids.clone();

        Self::check_run_date(book, date, &policy_ids)?;

        let policies: Vec<_> = policy_ids
            .iter()
            .filter_map(|id| book.policy(*id))
            .collect();
        for policy in &policies {
            policy.validate()?;
        }
        let outcome = evaluate(date, &policies, &book.invoices, &book.partners, &book.lines);

        let mut report = String::new();
        for summary in &outcome.summaries {
            let _ = writeln!(
                report,
                "Policy \"{}\" has generated {} Credit Control Lines.",
                summary.policy_name, summary.generated
            );
            info!(
                policy = %summary.policy_name,
                generated = summary.generated,
                %date,
                "credit control run evaluated policy"
            );
        }

        let line_ids: Vec<Uuid> = outcome.lines.iter().map(|line| line.id).collect();
        for line in outcome.lines {
            book.add_line(line);
        }
        for partner_id in outcome.blocked_partners {
            if let Some(partner) = book.partner_mut(partner_id) {
                if !partner.blocked {
                    info!(partner = %partner.name, "account blocked by credit control");
                    partner.blocked = true;
                }
            }
        }
        if let Some(run) = book.run_mut(run_id) {
            run.report = report;
            run.state = RunState::Done;
        }
        book.touch();
        Ok(line_ids)
    }
}
