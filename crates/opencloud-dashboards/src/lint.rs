// Numan Thabit 2025
//! Structural checks over a finished dashboard.
//!
//! The builders accept anything; this pass catches what Grafana would render
//! wrongly or silently: broken threshold ramps, colliding panel ids, repeated
//! reference ids inside a panel, queries sent to the wrong kind of datasource
//! and panels hanging off the grid.

use std::collections::{BTreeMap, HashSet};

use grafana_kit::{
    schema::{GridPos, GRID_COLUMNS},
    Dashboard, DashboardPanel, Panel, ThresholdError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LintIssue {
    #[error("panel {panel}: invalid thresholds: {source}")]
    Thresholds {
        panel: String,
        #[source]
        source: ThresholdError,
    },
    #[error("panel id {id} is used {count} times")]
    DuplicatePanelId { id: u32, count: usize },
    #[error("panel {panel} has no id")]
    MissingPanelId { panel: String },
    #[error("panel {panel}: refId {ref_id} appears more than once")]
    DuplicateRefId { panel: String, ref_id: String },
    #[error(
        "panel {panel}: refId {ref_id} is a {language} query on a {datasource} datasource"
    )]
    DatasourceMismatch {
        panel: String,
        ref_id: String,
        language: &'static str,
        datasource: String,
    },
    #[error("panel {panel}: x={x} w={w} does not fit the {columns}-column grid")]
    OffGrid {
        panel: String,
        x: u32,
        w: u32,
        columns: u32,
    },
}

/// Run every check and return the issues found, in dashboard order.
pub fn lint(dashboard: &Dashboard) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let mut id_counts: BTreeMap<u32, usize> = BTreeMap::new();

    for entry in &dashboard.panels {
        match entry {
            DashboardPanel::Panel(panel) => check_panel(panel, &mut id_counts, &mut issues),
            DashboardPanel::Row(row) => {
                *id_counts.entry(row.id).or_default() += 1;
                check_grid(&format!("row {:?}", row.title), row.grid_pos, &mut issues);
                for panel in &row.panels {
                    check_panel(panel, &mut id_counts, &mut issues);
                }
            }
        }
    }

    issues.extend(
        id_counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(id, count)| LintIssue::DuplicatePanelId { id, count }),
    );
    issues
}

fn check_panel(
    panel: &Panel,
    id_counts: &mut BTreeMap<u32, usize>,
    issues: &mut Vec<LintIssue>,
) {
    let label = panel_label(panel);
    match panel.id {
        Some(id) => *id_counts.entry(id).or_default() += 1,
        None => issues.push(LintIssue::MissingPanelId {
            panel: label.clone(),
        }),
    }

    if let Some(thresholds) = &panel.field_config.defaults.thresholds {
        if let Err(source) = thresholds.validate() {
            issues.push(LintIssue::Thresholds {
                panel: label.clone(),
                source,
            });
        }
    }

    let mut seen = HashSet::new();
    for target in &panel.targets {
        if !seen.insert(target.ref_id.as_str()) {
            issues.push(LintIssue::DuplicateRefId {
                panel: label.clone(),
                ref_id: target.ref_id.to_string(),
            });
        }
        if let (Some(language), Some(source)) = (target.language, &panel.datasource) {
            if language.datasource_kind() != source.kind {
                issues.push(LintIssue::DatasourceMismatch {
                    panel: label.clone(),
                    ref_id: target.ref_id.to_string(),
                    language: language.datasource_kind(),
                    datasource: source.kind.clone(),
                });
            }
        }
    }

    if let Some(pos) = panel.grid_pos {
        check_grid(&label, pos, issues);
    }
}

fn check_grid(label: &str, pos: GridPos, issues: &mut Vec<LintIssue>) {
    if pos.w == 0 || pos.x + pos.w > GRID_COLUMNS {
        issues.push(LintIssue::OffGrid {
            panel: label.to_string(),
            x: pos.x,
            w: pos.w,
            columns: GRID_COLUMNS,
        });
    }
}

fn panel_label(panel: &Panel) -> String {
    match panel.id {
        Some(id) => id.to_string(),
        None => format!("{:?}", panel.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_kit::{
        green_yellow_red, DashboardBuilder, DataSourceRef, RowBuilder, StatBuilder, ThresholdStep,
        Thresholds, ThresholdsMode,
    };

    #[test]
    fn clean_dashboard_has_no_issues() {
        let dashboard = DashboardBuilder::new("ok")
            .with_row(RowBuilder::new("Row").id(100).at(0))
            .with_panel(
                StatBuilder::new()
                    .id(110)
                    .grid_pos(4, 24, 0, 1)
                    .prom("up", "up")
                    .prom("down", "down")
                    .thresholds(green_yellow_red(1.0, 5.0))
                    .build(),
            )
            .build();
        assert!(lint(&dashboard).is_empty());
    }

    #[test]
    fn reports_ids_shared_with_nested_panels() {
        let dashboard = DashboardBuilder::new("dup")
            .with_panel(StatBuilder::new().id(10).build())
            .with_row(
                RowBuilder::new("Nested")
                    .id(20)
                    .collapsed(true)
                    .with_panel(StatBuilder::new().id(10).build()),
            )
            .build();
        assert_eq!(lint(&dashboard), [LintIssue::DuplicatePanelId { id: 10, count: 2 }]);
    }

    #[test]
    fn reports_broken_ramp_and_grid_overflow() {
        let broken = Thresholds {
            mode: ThresholdsMode::Absolute,
            steps: vec![
                ThresholdStep::base("green"),
                ThresholdStep::at(10.0, "yellow"),
                ThresholdStep::at(5.0, "red"),
            ],
        };
        let dashboard = DashboardBuilder::new("bad")
            .with_panel(
                StatBuilder::new()
                    .id(1)
                    .grid_pos(4, 8, 20, 0)
                    .thresholds(broken)
                    .build(),
            )
            .build();
        let issues = lint(&dashboard);
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], LintIssue::Thresholds { .. }));
        assert_eq!(
            issues[1].to_string(),
            "panel 1: x=20 w=8 does not fit the 24-column grid"
        );
    }

    #[test]
    fn reports_duplicate_ref_ids() {
        let mut panel = StatBuilder::new().id(5).prom("a", "").prom("b", "").build();
        panel.targets[1].ref_id = panel.targets[0].ref_id.clone();
        let dashboard = DashboardBuilder::new("refs").with_panel(panel).build();
        assert_eq!(
            lint(&dashboard),
            [LintIssue::DuplicateRefId {
                panel: "5".into(),
                ref_id: "A".into(),
            }]
        );
    }

    #[test]
    fn panels_without_ids_are_flagged_by_title() {
        let dashboard = DashboardBuilder::new("anon")
            .with_panel(StatBuilder::new().title("Orphan").build())
            .build();
        assert_eq!(lint(&dashboard)[0].to_string(), "panel \"Orphan\" has no id");
    }

    #[test]
    fn loki_query_on_prometheus_panel_is_flagged() {
        let dashboard = DashboardBuilder::new("mixed")
            .with_panel(
                StatBuilder::new()
                    .id(7)
                    .datasource(DataSourceRef::prometheus("prometheus"))
                    .prom("sum(up)", "")
                    .loki(r#"sum(count_over_time({service="opencloud"} [5m]))"#, "")
                    .build(),
            )
            .build();
        assert_eq!(
            lint(&dashboard),
            [LintIssue::DatasourceMismatch {
                panel: "7".into(),
                ref_id: "B".into(),
                language: "loki",
                datasource: "prometheus".into(),
            }]
        );
    }
}
