use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoice::{Invoice, Partner};
use super::line::ControlLine;
use super::policy::Policy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Draft,
    Done,
}

/// A dated batch evaluation of policies against open invoices. Draft
/// until its lines are generated, Done and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRun {
    pub id: Uuid,
    pub date: NaiveDate,
    pub policy_ids: Vec<Uuid>,
    pub state: RunState,
    #[serde(default)]
    pub report: String,
}

impl ControlRun {
    pub fn new(date: NaiveDate, policy_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            policy_ids,
            state: RunState::Draft,
            report: String::new(),
        }
    }
}

/// Per-policy tally of lines produced by one evaluation.
#[derive(Debug, Clone)]
pub struct PolicySummary {
    pub policy_id: Uuid,
    pub policy_name: String,
    pub generated: usize,
}

/// Everything an evaluation produced, computed before any state is
/// committed so a run either lands whole or not at all.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    pub lines: Vec<ControlLine>,
    pub summaries: Vec<PolicySummary>,
    /// Partners that reached a level carrying the block-account flag.
    pub blocked_partners: Vec<Uuid>,
}

/// Evaluates `policies` at `run_date` against the given receivables.
///
/// For each open invoice governed by a policy, at most one new line is
/// emitted per run: the next uncovered level of the escalation ladder,
/// once enough time has elapsed. The first level is clocked from the
/// invoice due date; later levels are clocked from the previous line's
/// date, spaced by the gap between the two levels' delays. Re-running
/// at a date that crosses no new spacing therefore emits nothing.
pub fn evaluate(
    run_date: NaiveDate,
    policies: &[&Policy],
    invoices: &[Invoice],
    partners: &[Partner],
    existing: &[ControlLine],
) -> EvaluationOutcome {
    let mut outcome = EvaluationOutcome::default();

    for policy in policies {
        let mut generated = 0usize;
        for invoice in invoices.iter().filter(|inv| inv.is_open()) {
            if !policy_governs(policy, invoice, partners) {
                continue;
            }
            if let Some(line) = next_line(policy, invoice, run_date, existing, &outcome.lines) {
                let blocks = policy
                    .level(line.level_index)
                    .map_or(false, |level| level.block_account);
                if blocks && !outcome.blocked_partners.contains(&line.partner_id) {
                    outcome.blocked_partners.push(line.partner_id);
                }
                outcome.lines.push(line);
                generated += 1;
            }
        }
        outcome.summaries.push(PolicySummary {
            policy_id: policy.id,
            policy_name: policy.name.clone(),
            generated,
        });
    }

    outcome
}

/// A partner with an assigned policy is only evaluated by that policy;
/// otherwise coverage falls back to the invoice's receivable account.
fn policy_governs(policy: &Policy, invoice: &Invoice, partners: &[Partner]) -> bool {
    let partner = partners.iter().find(|p| p.id == invoice.partner_id);
    match partner.and_then(|p| p.policy_id) {
        Some(assigned) => assigned == policy.id,
        None => policy.covers_account(invoice.account_id),
    }
}

fn next_line(
    policy: &Policy,
    invoice: &Invoice,
    run_date: NaiveDate,
    existing: &[ControlLine],
    fresh: &[ControlLine],
) -> Option<ControlLine> {
    // Lines emitted earlier in this same evaluation count toward
    // coverage too, so a policy listed twice cannot double-emit.
    let covered: Vec<&ControlLine> = existing
        .iter()
        .chain(fresh.iter())
        .filter(|line| line.invoice_id == invoice.id && line.policy_id == policy.id)
        .collect();
    let next_index = covered.len();
    let level = policy.level(next_index)?;

    let due = if next_index == 0 {
        invoice.days_overdue(run_date) >= level.delay_days
    } else {
        let previous = covered
            .iter()
            .max_by_key(|line| line.level_index)
            .map(|line| line.date)?;
        let spacing = level.delay_days - policy.levels[next_index - 1].delay_days;
        (run_date - previous).num_days() >= spacing
    };
    if !due {
        return None;
    }

    Some(ControlLine::new(
        invoice.id,
        invoice.partner_id,
        policy.id,
        level.id,
        next_index,
        run_date,
        invoice.date_due,
        invoice.residual,
        level.channel,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::policy::{Channel, PolicyLevel};
    use chrono::Duration;

    fn three_level_policy(account_id: Uuid) -> Policy {
        let mut policy = Policy::new("3 time policy");
        policy.assign_account(account_id);
        for (name, delay) in [("First", 15), ("Second", 30), ("Final", 60)] {
            policy
                .push_level(PolicyLevel::new(name, delay, Channel::Email))
                .unwrap();
        }
        policy
    }

    fn open_invoice(partner: &Partner, account_id: Uuid, due: NaiveDate) -> Invoice {
        let mut invoice = Invoice::new("INV-1", partner.id, account_id, due, 500.0);
        invoice.post();
        invoice
    }

    #[test]
    fn no_line_before_first_threshold() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(14);
        let outcome = evaluate(run_date, &[&policy], &[invoice], &[partner.clone()], &[]);
        assert!(outcome.lines.is_empty());
        assert_eq!(outcome.summaries[0].generated, 0);
    }

    #[test]
    fn deep_overdue_invoice_escalates_one_level_per_run() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(365);
        let outcome = evaluate(
            run_date,
            &[&policy],
            &[invoice],
            std::slice::from_ref(&partner),
            &[],
        );
        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.lines[0].level_index, 0);
        assert_eq!(outcome.lines[0].balance_due, 500.0);
    }

    #[test]
    fn same_date_rerun_emits_nothing() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(200);
        let first = evaluate(
            run_date,
            &[&policy],
            std::slice::from_ref(&invoice),
            std::slice::from_ref(&partner),
            &[],
        );
        assert_eq!(first.lines.len(), 1);

        let second = evaluate(
            run_date,
            &[&policy],
            &[invoice],
            &[partner],
            &first.lines,
        );
        assert!(second.lines.is_empty());
    }

    #[test]
    fn partner_policy_assignment_overrides_account_coverage() {
        let account = Uuid::new_v4();
        let covering = three_level_policy(account);
        let other = Policy::new("Other policy");
        let partner = Partner::new("Partner").with_policy(other.id);
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(90);
        let outcome = evaluate(run_date, &[&covering], &[invoice], &[partner], &[]);
        assert!(outcome.lines.is_empty(), "assigned policy must win");
    }

    #[test]
    fn paid_invoice_is_never_evaluated() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let mut invoice = open_invoice(&partner, account, due);
        invoice.register_payment(500.0);

        let run_date = due + Duration::days(90);
        let outcome = evaluate(run_date, &[&policy], &[invoice], &[partner], &[]);
        assert!(outcome.lines.is_empty());
    }

    #[test]
    fn ladder_stops_at_last_level() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let mut existing: Vec<ControlLine> = Vec::new();
        let mut run_date = due + Duration::days(100);
        for _ in 0..5 {
            let outcome = evaluate(
                run_date,
                &[&policy],
                std::slice::from_ref(&invoice),
                std::slice::from_ref(&partner),
                &existing,
            );
            existing.extend(outcome.lines);
            run_date += Duration::days(100);
        }
        assert_eq!(existing.len(), 3, "line count is capped by level count");
    }

    #[test]
    fn listing_the_same_policy_twice_emits_one_line() {
        let account = Uuid::new_v4();
        let policy = three_level_policy(account);
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(200);
        let outcome = evaluate(
            run_date,
            &[&policy, &policy],
            &[invoice],
            &[partner],
            &[],
        );
        assert_eq!(outcome.lines.len(), 1, "one line per (invoice, level)");
        assert_eq!(outcome.lines[0].level_index, 0);
    }

    #[test]
    fn blocking_level_reports_the_partner() {
        let account = Uuid::new_v4();
        let mut policy = Policy::new("Blocking");
        policy.assign_account(account);
        policy
            .push_level(
                PolicyLevel::new("Final notice", 15, Channel::Letter).blocking(),
            )
            .unwrap();
        let partner = Partner::new("Partner");
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let invoice = open_invoice(&partner, account, due);

        let run_date = due + Duration::days(30);
        let outcome = evaluate(
            run_date,
            &[&policy],
            &[invoice],
            std::slice::from_ref(&partner),
            &[],
        );
        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.blocked_partners, vec![partner.id]);
    }
}
