//! rxpad — a digital prescription pad.
//!
//! One clinician fills one form (patient details, an ordered medicine
//! list, free-text instructions) and exports it as a PDF prescription.
//! The presentation layer owns the input widgets; this crate owns the
//! form state, its mutation surface, and the document exporter.

pub mod config;
pub mod export;
pub mod form;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initializes tracing for an embedding application.
///
/// Honours `RUST_LOG` when set, otherwise falls back to the crate
/// default filter. Call once at startup, before the first session.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
