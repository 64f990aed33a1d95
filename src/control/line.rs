use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::policy::Channel;

/// Lifecycle of a generated reminder line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    Draft,
    ToBeSent,
    Sent,
    Ignored,
}

impl LineState {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "draft" => Some(Self::Draft),
            "to_be_sent" => Some(Self::ToBeSent),
            "sent" => Some(Self::Sent),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ToBeSent => "to_be_sent",
            Self::Sent => "sent",
            Self::Ignored => "ignored",
        }
    }
}

/// One reminder record for an invoice at a policy level, produced by a
/// credit control run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub partner_id: Uuid,
    pub policy_id: Uuid,
    pub level_id: Uuid,
    pub level_index: usize,
    /// Date of the run that produced the line.
    pub date: NaiveDate,
    pub date_due: NaiveDate,
    pub amount_due: f64,
    pub balance_due: f64,
    pub channel: Channel,
    pub state: LineState,
}

impl ControlLine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoice_id: Uuid,
        partner_id: Uuid,
        policy_id: Uuid,
        level_id: Uuid,
        level_index: usize,
        date: NaiveDate,
        date_due: NaiveDate,
        balance_due: f64,
        channel: Channel,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_id,
            partner_id,
            policy_id,
            level_id,
            level_index,
            date,
            date_due,
            amount_due: balance_due,
            balance_due,
            channel,
            state: LineState::Draft,
        }
    }
}
