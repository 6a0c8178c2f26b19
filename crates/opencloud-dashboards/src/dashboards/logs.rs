// Numan Thabit 2025
//! Log monitoring across every OpenCloud service, filtered by service,
//! component, level and free-text search.

use grafana_kit::{
    color_override, green_yellow_orange, green_yellow_orange_red, green_yellow_red,
    options::{
        BigValueColorMode, BigValueGraphMode, BigValueJustifyMode, BigValueTextMode,
        LegendDisplayMode, LegendPlacement, PieChartLegendOptions, PieChartType,
        ReduceDataOptions, VizLegendOptions, VizOrientation, VizTooltipOptions,
    },
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    single_color, Dashboard, DashboardBuilder, FieldColor, GaugeBuilder, PieChartBuilder,
    RowBuilder, StatBuilder, Thresholds, TimeseriesBuilder, Transformation, VariableBuilder,
    VariableModel, VariableRefresh, VariableSort,
};

use super::{log_stream, Datasources};

const COMPONENTS: &str = "proxy,storage-system,storage-users,storage-shares,storage-publiclink,auth-service,auth-app,auth-basic,auth-machine,frontend,gateway,graph,groups,users,idm,idp,nats,notifications,ocdav,ocm,postprocessing,sharing,activitylog,settings,thumbnails,app-provider,app-registry,clientlog,antivirus,search,sse,webfinger,collaboration,userlog,eventhistory,invitations,policies,audit";

fn label_variable(ds: &Datasources, name: &str, label: &str, default: &str) -> VariableModel {
    VariableBuilder::query(name)
        .label(label)
        .datasource(ds.loki.clone())
        .definition(format!("label_values({name})"))
        .refresh(VariableRefresh::OnTimeRangeChanged)
        .multi(true)
        .include_all(true)
        .all_value(".+")
        .current(default, default)
        .sort(VariableSort::AlphabeticalAsc)
        .build()
}

fn counter(ds: &Datasources, id: u32, x: u32, y: u32, thresholds: Thresholds) -> StatBuilder {
    StatBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .grid_pos(3, 4, x, y)
        .unit("short")
        .color_scheme(FieldColor::thresholds())
        .thresholds(thresholds)
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::Area)
        .reduce_options(ReduceDataOptions::calcs(&["sum"]).all_fields())
}

fn share_pie(ds: &Datasources, id: u32, x: u32) -> PieChartBuilder {
    PieChartBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .grid_pos(6, 6, x, 8)
        .pie_type(PieChartType::Pie)
        .legend(PieChartLegendOptions::new(LegendDisplayMode::List, LegendPlacement::Right))
        .reduce_options(ReduceDataOptions::calcs(&["sum"]).all_fields())
}

fn stacked_volume(ds: &Datasources, id: u32) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .stacking(StackingConfig::normal().group("A"))
        .line_width(1)
        .point_size(5)
        .show_points(VisibilityMode::Never)
        .unit("short")
        .legend(VizLegendOptions::list())
        .tooltip(VizTooltipOptions::multi_desc())
}

pub fn build(ds: &Datasources) -> Dashboard {
    DashboardBuilder::new("OpenCloud Logs")
        .uid("opencloud-logs")
        .description("Log monitoring for all OpenCloud services and components with flexible filtering")
        .tags(&["opencloud", "logs", "loki"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_variable(label_variable(ds, "service", "Service", "opencloud"))
        .with_variable(
            VariableBuilder::custom("component")
                .label("Component")
                .values(COMPONENTS)
                .multi(true)
                .include_all(true)
                .all_value(".+")
                .current("proxy", "proxy")
                .build(),
        )
        .with_variable(label_variable(ds, "level", "Log Level", "info"))
        .with_variable(VariableBuilder::textbox("search").label("Search").current("", "").build())
        .with_row(RowBuilder::new("Overview").id(100).at(0))
        .with_panel(
            stacked_volume(ds, 110)
                .title("Log Volume by Level")
                .description("Log volume over time grouped by log level. Spikes in error/warn indicate issues.")
                .grid_pos(6, 16, 0, 1)
                .loki(
                    r#"sum by (level) (count_over_time({service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__auto]))"#,
                    "{{level}}",
                )
                .draw_style(GraphDrawStyle::Bars)
                .fill_opacity(80)
                .with_override(color_override("error", "red"))
                .with_override(color_override("warn", "orange"))
                .with_override(color_override("warning", "orange"))
                .with_override(color_override("info", "blue"))
                .with_override(color_override("debug", "gray"))
                .build(),
        )
        .with_panel(
            counter(ds, 120, 16, 1, green_yellow_red(10.0, 100.0))
                .title("Error Count")
                .description("Total errors in selected time range")
                .loki(
                    r#"sum(count_over_time({service=~"$service", level="error"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__range]))"#,
                    "",
                )
                .build(),
        )
        .with_panel(
            counter(ds, 130, 20, 1, green_yellow_orange(50.0, 200.0))
                .title("Warning Count")
                .description("Total warnings in selected time range")
                .loki(
                    r#"sum(count_over_time({service=~"$service", level=~"warn|warning"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__range]))"#,
                    "",
                )
                .build(),
        )
        .with_panel(
            counter(ds, 140, 16, 4, single_color("blue"))
                .title("Total Logs")
                .description("Total log lines in selected time range")
                .loki(
                    r#"sum(count_over_time({service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__range]))"#,
                    "",
                )
                .build(),
        )
        .with_panel(
            GaugeBuilder::new()
                .id(150)
                .title("Error Rate")
                .description("Percentage of error logs")
                .datasource(ds.loki.clone())
                .grid_pos(3, 4, 20, 4)
                .loki(
                    r#"sum(count_over_time({service=~"$service", level="error"} | json | service_extracted=~"$component" [$__range])) / sum(count_over_time({service=~"$service"} | json | service_extracted=~"$component" [$__range])) * 100"#,
                    "",
                )
                .unit("percent")
                .min(0.0)
                .max(100.0)
                .color_scheme(FieldColor::thresholds())
                .thresholds(green_yellow_orange_red(1.0, 5.0, 10.0))
                .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]).all_fields())
                .show_threshold_labels(false)
                .show_threshold_markers(true)
                .build(),
        )
        .with_row(RowBuilder::new("Distribution").id(200).at(7))
        .with_panel(
            share_pie(ds, 210, 0)
                .title("Logs by Service")
                .description("Log distribution by Docker Compose service")
                .loki(
                    r#"sum by (service) (count_over_time({service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__range]))"#,
                    "{{service}}",
                )
                .build(),
        )
        .with_panel(
            share_pie(ds, 220, 6)
                .title("Logs by Component")
                .description("Log distribution by OpenCloud internal component")
                .loki(
                    r#"sum by (service_extracted) (count_over_time({service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__range]))"#,
                    "{{service_extracted}}",
                )
                .build(),
        )
        .with_panel(
            StatBuilder::new()
                .id(230)
                .title("Top Components by Errors")
                .description("Components with most errors - sorted by error count")
                .datasource(ds.loki.clone())
                .grid_pos(6, 6, 12, 8)
                .loki_instant(
                    r#"topk(5, sum by (service_extracted) (count_over_time({service=~"$service", level="error"} | json | service_extracted=~"$component" [$__range])))"#,
                    "",
                )
                .unit("short")
                .color_scheme(FieldColor::thresholds())
                .thresholds(green_yellow_orange_red(1000.0, 10000.0, 50000.0))
                .color_mode(BigValueColorMode::Value)
                .graph_mode(BigValueGraphMode::None)
                .justify_mode(BigValueJustifyMode::Auto)
                .orientation(VizOrientation::Horizontal)
                .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]).all_fields())
                .show_percent_change(false)
                .text_mode(BigValueTextMode::ValueAndName)
                .wide_layout(true)
                .with_transformation(Transformation::rename_by_regex(
                    r#".*service_extracted="([^"]+)".*"#,
                    "$1",
                ))
                .build(),
        )
        .with_panel(
            stacked_volume(ds, 240)
                .title("Log Volume by Component")
                .description("Log volume over time grouped by OpenCloud component")
                .grid_pos(6, 6, 18, 8)
                .loki(
                    r#"sum by (service_extracted) (count_over_time({service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search" [$__auto]))"#,
                    "{{service_extracted}}",
                )
                .draw_style(GraphDrawStyle::Line)
                .fill_opacity(20)
                .build(),
        )
        .with_row(RowBuilder::new("Detailed Logs").id(300).at(14))
        .with_panel(
            log_stream(
                ds,
                r#"{service=~"$service", level=~"$level"} | json | service_extracted=~"$component" |~ "(?i)$search""#,
            )
            .id(310)
            .title("Logs")
            .description("Live log stream. Use filters above to narrow results.")
            .grid_pos(12, 24, 0, 15)
            .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_kit::variable::VariableKind;
    use serde_json::json;

    #[test]
    fn query_variables_refresh_on_time_range() {
        let dashboard = build(&Datasources::default());
        let kinds: Vec<(&str, VariableKind)> = dashboard
            .variables()
            .iter()
            .map(|v| (v.name.as_str(), v.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                ("service", VariableKind::Query),
                ("component", VariableKind::Custom),
                ("level", VariableKind::Query),
                ("search", VariableKind::Textbox),
            ]
        );
        let level = serde_json::to_value(&dashboard.variables()[2]).unwrap();
        assert_eq!(level["query"], "label_values(level)");
        assert_eq!(level["refresh"], 2);
        assert_eq!(level["current"], json!({ "text": "info", "value": "info" }));
    }

    #[test]
    fn search_box_starts_empty() {
        let dashboard = build(&Datasources::default());
        let search = serde_json::to_value(&dashboard.variables()[3]).unwrap();
        assert_eq!(search["current"], json!({ "selected": false, "text": "", "value": "" }));
    }

    #[test]
    fn top_components_strip_label_syntax() {
        let dashboard = build(&Datasources::default());
        let stat = dashboard.all_panels().find(|p| p.id == Some(230)).unwrap();
        assert_eq!(stat.transformations[0].id, "renameByRegex");
        assert_eq!(stat.transformations[0].options["renamePattern"], "$1");
        assert_eq!(stat.targets[0].instant, Some(true));
    }
}
