// Numan Thabit 2025
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use tracing::info;

use crate::dashboards::{Datasources, DEFAULT_LOKI_UID, DEFAULT_PROMETHEUS_UID};

const DEFAULT_CONFIG_PATH: &str = "dashboards.toml";

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
#[command(rename_all = "kebab-case")]
pub struct CliArgs {
    /// Path to a TOML configuration file.
    #[arg(long, value_name = "PATH", env = "OPENCLOUD_DASHBOARDS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// UID of the Prometheus datasource panels should query.
    #[arg(long, global = true)]
    pub prometheus_uid: Option<String>,

    /// UID of the Loki datasource panels should query.
    #[arg(long, global = true)]
    pub loki_uid: Option<String>,

    /// Write `<uid>.json` files here instead of printing to stdout.
    #[arg(long, value_name = "DIR", global = true)]
    pub out_dir: Option<PathBuf>,

    /// Emit single-line JSON.
    #[arg(long, default_value_t = false, global = true)]
    pub compact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prometheus_uid: String,
    pub loki_uid: String,
    pub output_dir: Option<PathBuf>,
    pub compact: bool,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    prometheus_uid: Option<String>,
    loki_uid: Option<String>,
    output_dir: Option<PathBuf>,
    compact: Option<bool>,
}

impl Config {
    pub fn from_cli(cli: &CliArgs) -> Result<Self> {
        let file_cfg =
            load_file_config(cli.config.as_deref()).context("failed to load config file")?;
        let config = merge(cli, file_cfg);
        config.validate()?;
        config.log_summary();
        Ok(config)
    }

    pub fn datasources(&self) -> Datasources {
        Datasources::new(&self.prometheus_uid, &self.loki_uid)
    }

    fn validate(&self) -> Result<()> {
        if self.prometheus_uid.trim().is_empty() {
            bail!("prometheus_uid must not be empty");
        }
        if self.loki_uid.trim().is_empty() {
            bail!("loki_uid must not be empty");
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                bail!("output_dir must not be empty when specified");
            }
        }
        Ok(())
    }

    fn log_summary(&self) {
        info!(
            prometheus_uid = %self.prometheus_uid,
            loki_uid = %self.loki_uid,
            output_dir = ?self.output_dir,
            compact = self.compact,
            config_path = ?self.config_path,
            "opencloud-dashboards configuration"
        );
    }
}

fn merge(cli: &CliArgs, file_cfg: Option<(PathBuf, FileConfig)>) -> Config {
    let (cfg_path, file_cfg) = file_cfg.unzip();
    let file_cfg = file_cfg.unwrap_or_default();

    Config {
        prometheus_uid: pick(
            cli.prometheus_uid.clone(),
            file_cfg.prometheus_uid,
            DEFAULT_PROMETHEUS_UID.to_string(),
        ),
        loki_uid: pick(
            cli.loki_uid.clone(),
            file_cfg.loki_uid,
            DEFAULT_LOKI_UID.to_string(),
        ),
        output_dir: cli.out_dir.clone().or(file_cfg.output_dir),
        compact: cli.compact || file_cfg.compact.unwrap_or(false),
        config_path: cfg_path,
    }
}

fn pick<T>(cli: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(file).unwrap_or(default)
}

fn load_file_config(path: Option<&Path>) -> Result<Option<(PathBuf, FileConfig)>> {
    if let Some(path) = path {
        return read_config(path).map(|cfg| Some((path.to_path_buf(), cfg)));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        return read_config(&default_path).map(|cfg| Some((default_path, cfg)));
    }

    Ok(None)
}

fn read_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(toml_src: &str) -> Option<(PathBuf, FileConfig)> {
        Some((PathBuf::from("test.toml"), toml::from_str(toml_src).unwrap()))
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = merge(&CliArgs::default(), None);
        assert_eq!(config.prometheus_uid, DEFAULT_PROMETHEUS_UID);
        assert_eq!(config.loki_uid, DEFAULT_LOKI_UID);
        assert_eq!(config.output_dir, None);
        assert!(!config.compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cli_beats_file_beats_default() {
        let cli = CliArgs {
            loki_uid: Some("loki-cli".into()),
            ..CliArgs::default()
        };
        let config = merge(
            &cli,
            file("prometheus_uid = \"prom-file\"\nloki_uid = \"loki-file\"\ncompact = true\n"),
        );
        assert_eq!(config.prometheus_uid, "prom-file");
        assert_eq!(config.loki_uid, "loki-cli");
        assert!(config.compact);
        assert_eq!(config.config_path, Some(PathBuf::from("test.toml")));
    }

    #[test]
    fn blank_uid_is_rejected() {
        let cli = CliArgs {
            prometheus_uid: Some("  ".into()),
            ..CliArgs::default()
        };
        let err = merge(&cli, None).validate().expect_err("blank uid");
        assert!(err.to_string().contains("prometheus_uid"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_file_config(Some(Path::new("/nonexistent/dashboards.toml")))
            .expect_err("missing file");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn datasources_follow_configured_uids() {
        let config = merge(
            &CliArgs::default(),
            file("prometheus_uid = \"mimir\"\noutput_dir = \"out\"\n"),
        );
        let ds = config.datasources();
        assert_eq!(ds.prometheus.uid, "mimir");
        assert_eq!(ds.loki.uid, DEFAULT_LOKI_UID);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
    }
}
