#![doc(test(attr(deny(warnings))))]

//! Credit control primitives: dunning policies, dated control runs over
//! open receivables, and the marker/emailer/printer operations that move
//! the generated reminder lines through their lifecycle.

pub mod config;
pub mod control;
pub mod dispatch;
pub mod errors;
pub mod services;
pub mod storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("credit_control=info".parse().unwrap());
        fmt().with_env_filter(filter).init();
        tracing::info!("Credit control tracing initialized.");
    });
}
