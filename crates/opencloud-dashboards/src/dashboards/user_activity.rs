// Numan Thabit 2025
//! Authentication events, the audit trail and per-user log correlation.

use grafana_kit::{
    options::{
        LegendDisplayMode, LegendPlacement, PieChartLegendOptions, PieChartLegendValues,
        PieChartType, ReduceDataOptions, VizLegendOptions, VizTooltipOptions,
    },
    regexp_color_override,
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    Dashboard, DashboardBuilder, FieldOverride, PieChartBuilder, RowBuilder, TableBuilder,
    TimeseriesBuilder, Transformation, VariableBuilder,
};

use super::{log_stream, Datasources};

const AUDIT_ACTIONS: &str = "All : .+,file_read,file_create,file_delete,file_rename,file_trash,file_version,share_created,share_removed,share_updated,space_created,space_deleted,space_disabled,space_enabled,space_shared,space_unshared,user_created,user_deleted,user_feature_changed,group_member_added,group_member_removed,container_created,container_deleted";

fn event_bars(ds: &Datasources, id: u32) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .draw_style(GraphDrawStyle::Bars)
        .fill_opacity(80)
        .stacking(StackingConfig::normal().group("A"))
        .line_width(1)
        .point_size(5)
        .show_points(VisibilityMode::Never)
        .unit("short")
        .legend(VizLegendOptions::table_right().calcs(&["sum"]))
        .tooltip(VizTooltipOptions::multi_desc())
}

fn sized_column(name: &str, width: u32) -> FieldOverride {
    FieldOverride::by_name(name)
        .property("custom.width", width)
        .property("displayName", name)
}

pub fn build(ds: &Datasources) -> Dashboard {
    DashboardBuilder::new("OpenCloud User Activity")
        .uid("opencloud-user-activity")
        .description("User activity tracking: authentication events, audit trail, and detailed logs. Use Search to filter by email, UUID, or filename.")
        .tags(&["opencloud", "users", "audit", "activity"])
        .timezone("browser")
        .refresh("auto")
        .time("now-24h", "now")
        .with_variable(
            VariableBuilder::textbox("search")
                .label("Search (Email, UUID, Filename)")
                .current("", "")
                .build(),
        )
        .with_variable(
            VariableBuilder::custom("action")
                .label("Audit Action")
                .values(AUDIT_ACTIONS)
                .multi(true)
                .include_all(true)
                .all_value(".+")
                .current("All", ".+")
                .build(),
        )
        .with_row(RowBuilder::new("Authentication").id(100).at(0))
        .with_panel(
            event_bars(ds, 110)
                .title("Login Attempts")
                .description("HTTP requests to the login endpoint from proxy access logs, grouped by status code. Spikes in 4xx indicate failed login attempts.")
                .grid_pos(8, 12, 0, 1)
                .loki(
                    r#"sum by (status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | uri=~"/signin/v1/identifier/_/logon" |~ "(?i)$search" [$__auto]))"#,
                    "{{status}}",
                )
                .with_override(regexp_color_override("2..", "green"))
                .with_override(regexp_color_override("3..", "blue"))
                .with_override(regexp_color_override("4..", "red"))
                .build(),
        )
        .with_panel(
            log_stream(
                ds,
                r#"{service="opencloud"} | json | service_extracted=~"idm|idp" |~ "(?i)(invalid credentials|failed|unauthorized)" |~ "(?i)$search""#,
            )
            .id(120)
            .title("Failed Logins")
            .description("IDM log entries for invalid credentials. Shows username and source IP of failed authentication attempts.")
            .grid_pos(8, 12, 12, 1)
            .build(),
        )
        .with_panel(
            log_stream(
                ds,
                r#"{service="opencloud"} | json | service_extracted="proxy" | uri=~"/graph/v1.0/me.*" |~ "(?i)$search""#,
            )
            .id(130)
            .title("Self-Service Events")
            .description("User self-service requests: profile updates, password changes. Filtered from proxy access logs on /graph/v1.0/me endpoints.")
            .grid_pos(8, 24, 0, 9)
            .build(),
        )
        .with_row(RowBuilder::new("Audit Activity").id(200).at(17))
        .with_panel(
            event_bars(ds, 210)
                .title("Audit Events over Time")
                .description("Audit events grouped by action type. Shows file operations, sharing, space management, and user management activity over time.")
                .grid_pos(8, 16, 0, 18)
                .loki(
                    r#"sum by (Action) (count_over_time({service="opencloud"} | json | service_extracted="audit" | Action=~"$action" |~ "(?i)$search" [$__auto]))"#,
                    "{{Action}}",
                )
                .with_override(regexp_color_override("file_read", "blue"))
                .with_override(regexp_color_override("file_create", "green"))
                .with_override(regexp_color_override("file_delete|file_trash", "red"))
                .with_override(regexp_color_override("share_.*", "purple"))
                .with_override(regexp_color_override("space_.*", "orange"))
                .with_override(regexp_color_override("user_.*|group_.*", "yellow"))
                .build(),
        )
        .with_panel(
            PieChartBuilder::new()
                .id(220)
                .title("Action Distribution")
                .description("Distribution of audit event types over the selected time range.")
                .datasource(ds.loki.clone())
                .grid_pos(8, 8, 16, 18)
                .loki(
                    r#"sum by (Action) (count_over_time({service="opencloud"} | json | service_extracted="audit" | Action=~"$action" |~ "(?i)$search" [$__range]))"#,
                    "{{Action}}",
                )
                .pie_type(PieChartType::Pie)
                .legend(
                    PieChartLegendOptions::new(LegendDisplayMode::Table, LegendPlacement::Right)
                        .values(&[PieChartLegendValues::Value, PieChartLegendValues::Percent]),
                )
                .reduce_options(ReduceDataOptions::calcs(&["sum"]).all_fields())
                .build(),
        )
        .with_panel(
            TableBuilder::new()
                .id(230)
                .title("Last Audit Events")
                .description("Recent audit events with action type, message, and user details. Use Search variable to filter by email, UUID, or filename.")
                .datasource(ds.loki.clone())
                .grid_pos(8, 24, 0, 26)
                .loki_instant(
                    r#"topk(50, sum by (Action, Message) (count_over_time({service="opencloud"} | json | service_extracted="audit" | Action=~"$action" |~ "(?i)$search" [$__range])))"#,
                    "",
                )
                .with_transformation(Transformation::sort_by_desc("Value"))
                .with_override(FieldOverride::by_name("Time").property("custom.hidden", true))
                .with_override(sized_column("Action", 200))
                .with_override(sized_column("Message", 500))
                .with_override(FieldOverride::by_name("Value").property("displayName", "Count"))
                .build(),
        )
        .with_panel(
            log_stream(
                ds,
                r#"{service="opencloud"} | json | service_extracted="audit" | Action=~"$action" |~ "(?i)$search""#,
            )
            .id(240)
            .title("Raw Audit Logs")
            .description("Raw audit log stream. Use Search variable and Action filter to narrow results.")
            .grid_pos(10, 24, 0, 34)
            .build(),
        )
        .with_row(RowBuilder::new("Detailed Logs").id(300).at(44))
        .with_panel(
            log_stream(ds, r#"{service="opencloud"} |~ "(?i)$search""#)
                .id(310)
                .title("All OpenCloud Logs")
                .description("Unfiltered OpenCloud logs. Only filtered by Search variable. Use for correlation when investigating specific user activity.")
                .grid_pos(12, 24, 0, 45)
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_back_a_full_day() {
        let dashboard = build(&Datasources::default());
        assert_eq!(dashboard.time.from, "now-24h");
        assert_eq!(dashboard.variables()[0].name, "search");
        assert_eq!(dashboard.variables()[1].all_value.as_deref(), Some(".+"));
    }

    #[test]
    fn audit_overrides_match_by_regexp() {
        let dashboard = build(&Datasources::default());
        let events = dashboard.all_panels().find(|p| p.id == Some(210)).unwrap();
        let value = serde_json::to_value(&events.field_config.overrides).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(6));
        assert_eq!(value[2]["matcher"]["id"], "byRegexp");
        assert_eq!(value[2]["matcher"]["options"], "file_delete|file_trash");
    }

    #[test]
    fn log_panels_share_stream_settings() {
        let dashboard = build(&Datasources::default());
        let logs: Vec<_> = dashboard.all_panels().filter(|p| p.kind == "logs").collect();
        assert_eq!(logs.len(), 4);
        for panel in logs {
            let options = serde_json::to_value(&panel.options).unwrap();
            assert_eq!(options["sortOrder"], "Descending");
            assert_eq!(options["wrapLogMessage"], true);
            assert!(panel.targets[0].legend_format.is_none());
        }
    }
}
