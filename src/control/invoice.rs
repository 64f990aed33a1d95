use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESIDUAL_EPSILON: f64 = 1e-6;

/// A customer the receivables belong to. When a policy is assigned
/// directly it takes precedence over account coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub policy_id: Option<Uuid>,
    /// Set when a run reaches a level carrying the block-account flag;
    /// consumers refuse new business with the partner until cleared.
    #[serde(default)]
    pub blocked: bool,
}

impl Partner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            policy_id: None,
            blocked: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_policy(mut self, policy_id: Uuid) -> Self {
        self.policy_id = Some(policy_id);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvoiceState {
    Draft,
    Posted,
    Paid,
}

/// Read-model of an outstanding receivable as provided by the host
/// accounting system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub partner_id: Uuid,
    pub account_id: Uuid,
    pub date_due: NaiveDate,
    pub amount_total: f64,
    pub residual: f64,
    pub state: InvoiceState,
}

impl Invoice {
    pub fn new(
        number: impl Into<String>,
        partner_id: Uuid,
        account_id: Uuid,
        date_due: NaiveDate,
        amount_total: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            partner_id,
            account_id,
            date_due,
            amount_total,
            residual: amount_total,
            state: InvoiceState::Draft,
        }
    }

    pub fn post(&mut self) {
        if self.state == InvoiceState::Draft {
            self.state = InvoiceState::Posted;
        }
    }

    /// Registers a payment against the open balance; the invoice flips
    /// to Paid once nothing remains. Sub-cent float dust left by a
    /// sequence of partial payments counts as settled.
    pub fn register_payment(&mut self, amount: f64) {
        self.residual = (self.residual - amount).max(0.0);
        if self.residual <= RESIDUAL_EPSILON {
            self.residual = 0.0;
            self.state = InvoiceState::Paid;
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == InvoiceState::Posted && self.residual > 0.0
    }

    pub fn days_overdue(&self, at: NaiveDate) -> i64 {
        (at - self.date_due).num_days()
    }
}
