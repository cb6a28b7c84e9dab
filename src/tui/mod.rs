//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a lending-desk interface for:
//! - Dashboard with model status and session tally
//! - Loan application input
//! - Risk assessment with recommendation

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::LendingTheme;
