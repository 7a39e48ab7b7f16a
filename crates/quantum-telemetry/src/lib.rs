//! # Quantum Telemetry
//!
//! Structured logging for Quantum-Chain subsystems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::for_subsystem("18", "tx-service");
//!     init_logging(&config).expect("Failed to init logging");
//!
//!     quantum_telemetry::log_tx_event!(info, "18", "Tx broadcast", tx_hash);
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `quantum-chain` | Service name in logs |
//! | `QC_LOG_LEVEL` | `info` | Log level filter |
//! | `QC_SUBSYSTEM_ID` | `00` | Subsystem identifier |
//! | `QC_JSON_LOGS` | `false` | JSON output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
