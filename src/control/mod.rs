//! Credit control domain models: policies, receivables, runs, lines.

pub mod book;
pub mod invoice;
pub mod line;
pub mod policy;
pub mod run;

pub use book::{ControlBook, CURRENT_SCHEMA_VERSION};
pub use invoice::{Invoice, InvoiceState, Partner};
pub use line::{ControlLine, LineState};
pub use policy::{Channel, Policy, PolicyLevel};
pub use run::{evaluate, ControlRun, EvaluationOutcome, PolicySummary, RunState};
