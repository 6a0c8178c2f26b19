// Numan Thabit 2025
#![forbid(unsafe_code)]
//! Generator for the OpenCloud Grafana dashboards.

pub mod config;
pub mod dashboards;
pub mod lint;
pub mod output;

pub use config::{CliArgs, Config};
pub use dashboards::{DashboardKind, Datasources};
pub use lint::{lint, LintIssue};
pub use output::{render, write_all, write_dashboard, OutputError};
