// Numan Thabit 2025
//! The OpenCloud dashboard set. Each submodule assembles one document.

mod activitylog;
mod logs;
mod overview;
mod proxy;
mod requests;
mod uploads;
mod user_activity;

use clap::ValueEnum;
use grafana_kit::{
    options::{LogsDedupStrategy, LogsSortOrder},
    Dashboard, DataSourceRef, LogsBuilder, ThresholdError,
};

pub const DEFAULT_PROMETHEUS_UID: &str = "prometheus";
pub const DEFAULT_LOKI_UID: &str = "loki";

/// Datasources the generated panels point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasources {
    pub prometheus: DataSourceRef,
    pub loki: DataSourceRef,
}

impl Datasources {
    pub fn new(prometheus_uid: &str, loki_uid: &str) -> Self {
        Self {
            prometheus: DataSourceRef::prometheus(prometheus_uid),
            loki: DataSourceRef::loki(loki_uid),
        }
    }
}

impl Default for Datasources {
    fn default() -> Self {
        Self::new(DEFAULT_PROMETHEUS_UID, DEFAULT_LOKI_UID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DashboardKind {
    Overview,
    Requests,
    Uploads,
    Proxy,
    Logs,
    UserActivity,
    Activitylog,
}

impl DashboardKind {
    pub const ALL: [DashboardKind; 7] = [
        DashboardKind::Overview,
        DashboardKind::Requests,
        DashboardKind::Uploads,
        DashboardKind::Proxy,
        DashboardKind::Logs,
        DashboardKind::UserActivity,
        DashboardKind::Activitylog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DashboardKind::Overview => "overview",
            DashboardKind::Requests => "requests",
            DashboardKind::Uploads => "uploads",
            DashboardKind::Proxy => "proxy",
            DashboardKind::Logs => "logs",
            DashboardKind::UserActivity => "user-activity",
            DashboardKind::Activitylog => "activitylog",
        }
    }

    pub fn uid(self) -> &'static str {
        match self {
            DashboardKind::Overview => "opencloud-overview",
            DashboardKind::Requests => "opencloud-requests",
            DashboardKind::Uploads => "opencloud-uploads",
            DashboardKind::Proxy => "opencloud-proxy",
            DashboardKind::Logs => "opencloud-logs",
            DashboardKind::UserActivity => "opencloud-user-activity",
            DashboardKind::Activitylog => "activitylog-debug",
        }
    }

    /// Assemble the dashboard. Fails only when a checked threshold ramp is malformed.
    pub fn build(self, ds: &Datasources) -> Result<Dashboard, ThresholdError> {
        let dashboard = match self {
            DashboardKind::Overview => overview::build(ds),
            DashboardKind::Requests => requests::build(ds),
            DashboardKind::Uploads => uploads::build(ds)?,
            DashboardKind::Proxy => proxy::build(ds),
            DashboardKind::Logs => logs::build(ds),
            DashboardKind::UserActivity => user_activity::build(ds),
            DashboardKind::Activitylog => activitylog::build(ds),
        };
        Ok(dashboard)
    }
}

/// Newest-first log stream with labels, details and wrapping turned on.
fn log_stream(ds: &Datasources, expr: &str) -> LogsBuilder {
    LogsBuilder::new()
        .datasource(ds.loki.clone())
        .loki(expr, "")
        .dedup_strategy(LogsDedupStrategy::None)
        .enable_log_details(true)
        .prettify_log_message(true)
        .show_common_labels(false)
        .show_labels(true)
        .show_time(true)
        .sort_order(LogsSortOrder::Descending)
        .wrap_log_message(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_clap() {
        for kind in DashboardKind::ALL {
            let parsed = DashboardKind::from_str(kind.name(), false).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn built_uid_matches_kind() {
        let ds = Datasources::default();
        for kind in DashboardKind::ALL {
            assert_eq!(kind.build(&ds).unwrap().uid.as_deref(), Some(kind.uid()));
        }
    }
}
