use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoice::{Invoice, Partner};
use super::line::ControlLine;
use super::policy::Policy;
use super::run::{ControlRun, RunState};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// In-memory aggregate of everything credit control operates on:
/// partners, invoices, policies, completed runs, and generated lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlBook {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub runs: Vec<ControlRun>,
    #[serde(default)]
    pub lines: Vec<ControlLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "ControlBook::schema_version_default")]
    pub schema_version: u8,
}

impl ControlBook {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            partners: Vec::new(),
            invoices: Vec::new(),
            policies: Vec::new(),
            runs: Vec::new(),
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_partner(&mut self, partner: Partner) -> Uuid {
        let id = partner.id;
        self.partners.push(partner);
        self.touch();
        id
    }

    pub fn add_invoice(&mut self, invoice: Invoice) -> Uuid {
        let id = invoice.id;
        self.invoices.push(invoice);
        self.touch();
        id
    }

    pub fn add_policy(&mut self, policy: Policy) -> Uuid {
        let id = policy.id;
        self.policies.push(policy);
        self.touch();
        id
    }

    pub fn add_run(&mut self, run: ControlRun) -> Uuid {
        let id = run.id;
        self.runs.push(run);
        self.touch();
        id
    }

    pub fn add_line(&mut self, line: ControlLine) -> Uuid {
        let id = line.id;
        self.lines.push(line);
        self.touch();
        id
    }

    pub fn partner(&self, id: Uuid) -> Option<&Partner> {
        self.partners.iter().find(|partner| partner.id == id)
    }

    pub fn partner_mut(&mut self, id: Uuid) -> Option<&mut Partner> {
        self.partners.iter_mut().find(|partner| partner.id == id)
    }

    pub fn invoice(&self, id: Uuid) -> Option<&Invoice> {
        self.invoices.iter().find(|invoice| invoice.id == id)
    }

    pub fn invoice_mut(&mut self, id: Uuid) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|invoice| invoice.id == id)
    }

    pub fn policy(&self, id: Uuid) -> Option<&Policy> {
        self.policies.iter().find(|policy| policy.id == id)
    }

    pub fn policy_by_name(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|policy| policy.name == name)
    }

    pub fn run(&self, id: Uuid) -> Option<&ControlRun> {
        self.runs.iter().find(|run| run.id == id)
    }

    pub fn run_mut(&mut self, id: Uuid) -> Option<&mut ControlRun> {
        self.runs.iter_mut().find(|run| run.id == id)
    }

    pub fn line(&self, id: Uuid) -> Option<&ControlLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn line_mut(&mut self, id: Uuid) -> Option<&mut ControlLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }

    pub fn lines_for_invoice(&self, invoice_id: Uuid) -> Vec<&ControlLine> {
        self.lines
            .iter()
            .filter(|line| line.invoice_id == invoice_id)
            .collect()
    }

    /// Date of the most recent completed run that includes `policy_id`.
    pub fn last_run_date(&self, policy_id: Uuid) -> Option<NaiveDate> {
        self.runs
            .iter()
            .filter(|run| run.state == RunState::Done && run.policy_ids.contains(&policy_id))
            .map(|run| run.date)
            .max()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
