pub mod config;
pub mod models;
pub mod protocols;
pub mod triage;

pub use models::{Protocol, ProtocolCategory, ProtocolError, Responses, SymptomMap, UrgencyTier};
pub use protocols::{CallBrief, InMemoryProtocolStore, ProtocolStore};
pub use triage::{evaluate, DefaultTriageEngine, TriageEngine, TriageError, TriagePolicy, TriageResult};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
