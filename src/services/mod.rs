//! Request-scoped operations over a [`ControlBook`](crate::control::ControlBook):
//! run generation, bulk marking, and the email/print dispatch flows.

pub mod emailer_service;
pub mod marker_service;
pub mod printer_service;
pub mod run_service;

pub use emailer_service::{EmailReport, EmailerService};
pub use marker_service::MarkerService;
pub use printer_service::PrinterService;
pub use run_service::RunService;

use crate::errors::ControlError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("{0}")]
    Invalid(String),
}
