//! Rust core of the BCI accessibility app.
//!
//! The EEG work happens on a separate bridge server; this crate starts
//! calibration, training and detection sessions on it and polls their
//! progress, turning each poll into an observer callback.
//!
//! ```no_run
//! use bci_bridge_engine::config::ClientConfig;
//! use bci_bridge_engine::engine::session::SessionCoordinator;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let coordinator = SessionCoordinator::with_http(ClientConfig::default())?;
//! coordinator.on_trigger(|_, confidence| println!("trigger {:.2}", confidence));
//! if coordinator.initialize().await && coordinator.start_detection().await {
//!     // ... later
//!     coordinator.stop_detection().await;
//! }
//! coordinator.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod source;
