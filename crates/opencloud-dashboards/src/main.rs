// Numan Thabit 2025
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use opencloud_dashboards::{
    config::{CliArgs, Config},
    lint, render, write_all, write_dashboard, DashboardKind,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "opencloud-dashboards",
    version,
    about = "Generate the OpenCloud Grafana dashboards"
)]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every dashboard name with its uid.
    List,
    /// Emit one dashboard, or all of them with --all.
    Generate {
        #[arg(value_enum, required_unless_present = "all", conflicts_with = "all")]
        name: Option<DashboardKind>,
        #[arg(long)]
        all: bool,
    },
    /// Build every dashboard and report structural problems.
    Check,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List => list(),
        Command::Generate { name, all } => {
            let config = Config::from_cli(&cli.args)?;
            match name {
                Some(kind) if !all => generate_one(&config, kind),
                _ => generate_all(&config),
            }
        }
        Command::Check => check(&Config::from_cli(&cli.args)?),
    }
}

fn list() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for kind in DashboardKind::ALL {
        writeln!(stdout, "{}\t{}", kind.name(), kind.uid())
            .context("failed to write to stdout")?;
    }
    Ok(())
}

fn generate_one(config: &Config, kind: DashboardKind) -> Result<()> {
    let dashboard = kind
        .build(&config.datasources())
        .with_context(|| format!("failed to build dashboard {}", kind.name()))?;
    info!(
        dashboard = kind.name(),
        uid = kind.uid(),
        panels = dashboard.all_panels().count(),
        "dashboard built"
    );
    match &config.output_dir {
        Some(dir) => {
            let path = write_dashboard(dir, &dashboard, config.compact)
                .with_context(|| format!("failed to write dashboard {}", kind.name()))?;
            info!(path = %path.display(), "dashboard written");
        }
        None => {
            let json = render(&dashboard, config.compact)
                .with_context(|| format!("failed to render dashboard {}", kind.name()))?;
            writeln!(io::stdout().lock(), "{json}").context("failed to write to stdout")?;
        }
    }
    Ok(())
}

fn generate_all(config: &Config) -> Result<()> {
    let datasources = config.datasources();
    if let Some(dir) = &config.output_dir {
        write_all(dir, &datasources, config.compact)
            .with_context(|| format!("failed to write dashboards to {}", dir.display()))?;
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    for kind in DashboardKind::ALL {
        let dashboard = kind
            .build(&datasources)
            .with_context(|| format!("failed to build dashboard {}", kind.name()))?;
        let json = render(&dashboard, config.compact)
            .with_context(|| format!("failed to render dashboard {}", kind.name()))?;
        writeln!(stdout, "{json}").context("failed to write to stdout")?;
    }
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    let datasources = config.datasources();
    let mut total = 0usize;
    for kind in DashboardKind::ALL {
        let dashboard = kind
            .build(&datasources)
            .with_context(|| format!("failed to build dashboard {}", kind.name()))?;
        let issues = lint(&dashboard);
        for issue in &issues {
            warn!(dashboard = kind.name(), %issue, "lint issue");
        }
        total += issues.len();
    }
    if total > 0 {
        bail!("{total} lint issue(s) found");
    }
    info!(dashboards = DashboardKind::ALL.len(), "all dashboards passed lint");
    Ok(())
}
