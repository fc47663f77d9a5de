// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for posture checks.
//!
//! This module contains the command-line interface logic, including argument parsing
//! and the `predict` and `evaluate` commands.

/// CLI arguments.
pub mod args;

/// Landmark file evaluation.
pub mod evaluate;

/// Console output helpers.
pub mod logging;

/// Prediction logic.
pub mod predict;
