// Numan Thabit 2025
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use grafana_kit::{Dashboard, ThresholdError};
use thiserror::Error;
use tracing::{debug, info};

use crate::dashboards::{DashboardKind, Datasources};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize dashboard: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to build {name} dashboard: {source}")]
    Build {
        name: &'static str,
        #[source]
        source: ThresholdError,
    },
    #[error("dashboard {title:?} has no uid to name its file after")]
    MissingUid { title: String },
}

/// Serialize a dashboard the way Grafana's import dialog expects it.
pub fn render(dashboard: &Dashboard, compact: bool) -> Result<String, OutputError> {
    let json = if compact {
        serde_json::to_string(dashboard)?
    } else {
        serde_json::to_string_pretty(dashboard)?
    };
    Ok(json)
}

/// Write `<uid>.json` into `dir`, creating the directory if needed.
pub fn write_dashboard(
    dir: &Path,
    dashboard: &Dashboard,
    compact: bool,
) -> Result<PathBuf, OutputError> {
    let uid = dashboard
        .uid
        .as_deref()
        .ok_or_else(|| OutputError::MissingUid {
            title: dashboard.title.clone(),
        })?;
    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(format!("{uid}.json"));
    let mut body = render(dashboard, compact)?;
    body.push('\n');
    fs::write(&path, body.as_bytes()).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), bytes = body.len(), "wrote dashboard");
    Ok(path)
}

/// Build and write every dashboard, returning the written paths in build order.
pub fn write_all(
    dir: &Path,
    datasources: &Datasources,
    compact: bool,
) -> Result<Vec<PathBuf>, OutputError> {
    let mut written = Vec::with_capacity(DashboardKind::ALL.len());
    for kind in DashboardKind::ALL {
        let dashboard = kind.build(datasources).map_err(|source| OutputError::Build {
            name: kind.name(),
            source,
        })?;
        written.push(write_dashboard(dir, &dashboard, compact)?);
    }
    info!(dir = %dir.display(), count = written.len(), "dashboards written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_kit::DashboardBuilder;

    #[test]
    fn compact_render_is_single_line() {
        let dashboard = DashboardBuilder::new("Tiny").uid("tiny").build();
        let compact = render(&dashboard, true).unwrap();
        assert!(!compact.contains('\n'));
        let pretty = render(&dashboard, false).unwrap();
        assert!(pretty.lines().count() > 1);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
        );
    }

    #[test]
    fn writes_file_named_after_uid() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let dashboard = DashboardBuilder::new("Tiny").uid("tiny").build();
        let path = write_dashboard(&dir, &dashboard, false).unwrap();
        assert_eq!(path, dir.join("tiny.json"));
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["uid"], "tiny");
    }

    #[test]
    fn dashboard_without_uid_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dashboard = DashboardBuilder::new("Anonymous").build();
        let err = write_dashboard(tmp.path(), &dashboard, true).unwrap_err();
        assert!(matches!(err, OutputError::MissingUid { .. }));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
