//! HTTP endpoints for running mailprobe under an orchestrator.
//!
//! # Endpoints
//!
//! - **`/health/live`** - 200 while the process can answer at all
//! - **`/health/ready`**, **`/.well-known/ready`** - 200 once the target
//!   monitors are running and shutdown has not begun
//! - **`/metrics`** - per-target probe counters in the Prometheus text format
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mailprobe_health::{HealthChecker, HealthConfig, HealthServer};
//! use mailprobe_metrics::ProbeMetrics;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let checker = Arc::new(HealthChecker::new());
//! let metrics = Arc::new(ProbeMetrics::new()?);
//! let server = HealthServer::new(&HealthConfig::default(), checker, metrics).await?;
//!
//! // server.serve(shutdown_receiver).await?;
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod error;
mod server;

pub use checker::{HealthChecker, HealthStatus};
pub use config::HealthConfig;
pub use error::HealthError;
pub use server::HealthServer;
