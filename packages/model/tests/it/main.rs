//! Integration tests for the arbor model.
//!
//! Organized as a single test binary; modules follow the behaviour they
//! cover rather than the source layout:
//! - scenarios: the reference scenarios for insert/undo, schema, data
//!   changes and references by identifier
//! - undo_redo: history round trips, macros, limits
//! - events: notification order and completeness
//! - schema: tag constraints through the model API
//! - document: persistence on disk
//! - concurrency: hand-off from worker threads

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arbor_model=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod concurrency;
mod document;
mod events;
mod helpers;
mod scenarios;
mod schema;
mod undo_redo;
