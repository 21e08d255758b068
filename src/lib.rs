//! Core library for the fleet-recon command line application.
//!
//! The library reconciles a technician's tracking workbook against the cloud
//! device-management inventory and the directory's computer export. IO
//! adapters live under [`io`], data representations inside [`model`], the
//! comparison logic in [`engine`] on top of [`index`], and the run
//! orchestration under [`workflow`]. [`annotate`] and [`report`] turn a
//! [`model::ReconciliationResult`] into workbook markers and readable text.

pub mod annotate;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod io;
pub mod model;
pub mod report;
pub mod workflow;

pub use config::ReconConfig;
pub use engine::reconcile;
pub use error::{Result, ToolError};
pub use model::ReconciliationResult;
