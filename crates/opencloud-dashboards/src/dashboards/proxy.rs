// Numan Thabit 2025
//! HTTP access log analysis for the reverse proxy, driven entirely by Loki.

use grafana_kit::{
    green_red, green_yellow_orange, green_yellow_orange_red,
    options::{
        BigValueColorMode, BigValueGraphMode, LegendDisplayMode, LegendPlacement,
        PieChartLegendOptions, PieChartLegendValues, PieChartType, ReduceDataOptions,
        VizLegendOptions, VizTooltipOptions,
    },
    regexp_color_override,
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    single_color, Dashboard, DashboardBuilder, FieldColor, FieldOverride, PieChartBuilder,
    RowBuilder, StatBuilder, TableBuilder, Thresholds, TimeseriesBuilder, Transformation,
    VariableBuilder, VariableModel,
};

use super::{log_stream, Datasources};

fn variables() -> [VariableModel; 3] {
    [
        VariableBuilder::custom("method")
            .label("HTTP Method")
            .values("GET,POST,PUT,DELETE,PATCH,HEAD,OPTIONS,PROPFIND,PROPPATCH,MKCOL,COPY,MOVE,LOCK,UNLOCK,REPORT")
            .multi(true)
            .include_all(true)
            .all_value(".+")
            .current("GET", "GET")
            .build(),
        VariableBuilder::custom("status_filter")
            .label("Status")
            .values("All : .+,2xx : 2..,3xx : 3..,4xx : 4..,5xx : 5..")
            .multi(false)
            .include_all(false)
            .current("All", ".+")
            .build(),
        VariableBuilder::textbox("path")
            .label("Path (regex)")
            .current(".*", ".*")
            .build(),
    ]
}

fn headline(ds: &Datasources, id: u32, x: u32, thresholds: Thresholds, calc: &str) -> StatBuilder {
    StatBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .grid_pos(4, 8, x, 1)
        .color_scheme(FieldColor::thresholds())
        .thresholds(thresholds)
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::Area)
        .reduce_options(ReduceDataOptions::calcs(&[calc]).all_fields())
}

/// Stacked per-status bars with a summed table legend.
fn status_bars(ds: &Datasources, id: u32) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .draw_style(GraphDrawStyle::Bars)
        .fill_opacity(80)
        .stacking(StackingConfig::normal().group("A"))
        .line_width(1)
        .unit("short")
        .legend(VizLegendOptions::table_right().calcs(&["sum"]))
        .tooltip(VizTooltipOptions::multi_desc())
}

/// Instant top-N table sorted by count, timestamp column hidden.
fn top_table(ds: &Datasources, id: u32, expr: &str) -> TableBuilder {
    TableBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .loki_instant(expr, "")
        .unit("short")
        .color_scheme(FieldColor::thresholds())
        .thresholds(single_color("green"))
        .with_transformation(Transformation::sort_by_desc("Value"))
        .with_override(FieldOverride::by_name("Time").property("custom.hidden", true))
}

fn labelled_column(name: &str, width: u32, display: &str) -> FieldOverride {
    FieldOverride::by_name(name)
        .property("custom.width", width)
        .property("displayName", display)
}

fn error_paths(
    ds: &Datasources,
    id: u32,
    x: u32,
    expr: &str,
    thresholds: Thresholds,
) -> TableBuilder {
    TableBuilder::new()
        .id(id)
        .datasource(ds.loki.clone())
        .grid_pos(6, 12, x, 37)
        .loki_instant(expr, "{{uri}} ({{status}})")
        .color_scheme(FieldColor::thresholds())
        .thresholds(thresholds)
        .with_transformation(Transformation::sort_by_desc("Value"))
        .with_override(FieldOverride::by_name("uri").property("custom.width", 400))
}

pub fn build(ds: &Datasources) -> Dashboard {
    let [method, status_filter, path] = variables();
    DashboardBuilder::new("OpenCloud Proxy - HTTP Access Logs")
        .uid("opencloud-proxy")
        .description("HTTP access log analysis for the OpenCloud proxy component with request metrics, error tracking, and path analysis")
        .tags(&["opencloud", "proxy", "http", "access-logs"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_variable(method)
        .with_variable(status_filter)
        .with_variable(path)
        .with_row(RowBuilder::new("Overview").id(100).at(0))
        .with_panel(
            headline(ds, 110, 0, single_color("blue"), "sum")
                .title("Total Requests")
                .description("Total HTTP requests in selected time range")
                .loki(
                    r#"sum(count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__range]))"#,
                    "",
                )
                .unit("short")
                .build(),
        )
        .with_panel(
            headline(ds, 120, 8, green_yellow_orange_red(1.0, 5.0, 10.0), "lastNotNull")
                .title("Error Rate")
                .description("Percentage of 4xx/5xx responses")
                .loki(
                    r#"sum(count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"[45].." [$__range])) / sum(count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" [$__range])) * 100"#,
                    "",
                )
                .unit("percent")
                .build(),
        )
        .with_panel(
            headline(ds, 130, 16, single_color("green"), "mean")
                .title("Request Rate")
                .description("Requests per second")
                .loki(
                    r#"sum(rate({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__auto]))"#,
                    "",
                )
                .unit("reqps")
                .build(),
        )
        .with_row(RowBuilder::new("Traffic Analysis").id(200).at(5))
        .with_panel(
            status_bars(ds, 210)
                .title("Requests Over Time by Status")
                .description("Request volume grouped by HTTP status code")
                .grid_pos(8, 24, 0, 6)
                .loki(
                    r#"sum by (status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__auto]))"#,
                    "{{status}}",
                )
                .point_size(5)
                .show_points(VisibilityMode::Never)
                .with_override(regexp_color_override("2..", "green"))
                .with_override(regexp_color_override("3..", "blue"))
                .with_override(regexp_color_override("4..", "orange"))
                .with_override(regexp_color_override("5..", "red"))
                .build(),
        )
        .with_row(RowBuilder::new("Top Lists").id(300).at(14))
        .with_panel(
            top_table(
                ds,
                310,
                r#"topk(10, sum by (uri) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | __error__="" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__range])))"#,
            )
            .title("Top 10 Paths")
            .description("Most frequently accessed paths")
            .grid_pos(8, 12, 0, 15)
            .with_override(labelled_column("uri", 350, "Path"))
            .with_override(FieldOverride::by_name("Value").property("displayName", "Requests"))
            .build(),
        )
        .with_panel(
            top_table(
                ds,
                320,
                r#"topk(10, sum by (remote_addr) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__range])))"#,
            )
            .title("Top 10 Client IPs")
            .description("Most active client IP addresses")
            .grid_pos(8, 12, 12, 15)
            .with_override(labelled_column("remote_addr", 200, "Client IP"))
            .with_override(FieldOverride::by_name("Value").property("displayName", "Requests"))
            .build(),
        )
        .with_row(RowBuilder::new("HTTP Methods").id(400).at(23))
        .with_panel(
            PieChartBuilder::new()
                .id(410)
                .title("Requests by Method")
                .description("Distribution of HTTP methods")
                .datasource(ds.loki.clone())
                .grid_pos(6, 8, 0, 24)
                .loki(
                    r#"sum by (method) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__range]))"#,
                    "{{method}}",
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
            TimeseriesBuilder::new()
                .id(420)
                .title("Method Distribution Over Time")
                .description("HTTP methods over time")
                .datasource(ds.loki.clone())
                .grid_pos(6, 16, 8, 24)
                .loki(
                    r#"sum by (method) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter" [$__auto]))"#,
                    "{{method}}",
                )
                .draw_style(GraphDrawStyle::Line)
                .fill_opacity(20)
                .stacking(StackingConfig::normal().group("A"))
                .line_width(2)
                .point_size(5)
                .show_points(VisibilityMode::Never)
                .unit("short")
                .legend(VizLegendOptions::list())
                .tooltip(VizTooltipOptions::multi_desc())
                .build(),
        )
        .with_row(RowBuilder::new("Error Analysis").id(500).at(30))
        .with_panel(
            status_bars(ds, 510)
                .title("4xx Client Errors")
                .description("Client errors (400-499) over time")
                .grid_pos(6, 12, 0, 31)
                .loki(
                    r#"sum by (status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"4.." [$__auto]))"#,
                    "{{status}}",
                )
                .with_override(regexp_color_override("40[0134]", "orange"))
                .with_override(regexp_color_override("4(0[5-9]|[1-9].)", "yellow"))
                .build(),
        )
        .with_panel(
            status_bars(ds, 520)
                .title("5xx Server Errors")
                .description("Server errors (500-599) over time - investigate immediately!")
                .grid_pos(6, 12, 12, 31)
                .loki(
                    r#"sum by (status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"5.." [$__auto]))"#,
                    "{{status}}",
                )
                .color_scheme(FieldColor::fixed("red"))
                .build(),
        )
        .with_panel(
            error_paths(
                ds,
                530,
                0,
                r#"topk(20, sum by (uri, status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | status=~"4.." [$__range])))"#,
                green_yellow_orange(10.0, 50.0),
            )
            .title("Top Error Paths (4xx)")
            .description("Paths with most client errors")
            .build(),
        )
        .with_panel(
            error_paths(
                ds,
                540,
                12,
                r#"topk(20, sum by (uri, status) (count_over_time({service="opencloud"} | json | service_extracted="proxy" | status=~"5.." [$__range])))"#,
                green_red(1.0),
            )
            .title("Top Error Paths (5xx)")
            .description("Paths with most server errors - high priority!")
            .build(),
        )
        .with_row(RowBuilder::new("Detailed Logs").id(600).at(43))
        .with_panel(
            log_stream(
                ds,
                r#"{service="opencloud"} | json | service_extracted="proxy" | method=~"$method" | uri=~"$path" | status=~"$status_filter""#,
            )
            .id(610)
            .title("Access Logs")
            .description("HTTP access logs from proxy component")
            .grid_pos(10, 24, 0, 44)
            .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_variables_are_declared_in_order() {
        let dashboard = build(&Datasources::default());
        let names: Vec<&str> = dashboard.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["method", "status_filter", "path"]);
        let value = serde_json::to_value(&dashboard.templating).unwrap();
        assert_eq!(value["list"][0]["allValue"], ".+");
        assert_eq!(value["list"][2]["type"], "textbox");
    }

    #[test]
    fn every_panel_reads_loki() {
        let dashboard = build(&Datasources::new("prom", "logs"));
        for panel in dashboard.all_panels() {
            let ds = panel.datasource.as_ref().unwrap();
            assert_eq!((ds.kind.as_str(), ds.uid.as_str()), ("loki", "logs"));
        }
    }

    #[test]
    fn top_tables_are_instant_and_sorted() {
        let dashboard = build(&Datasources::default());
        let table = dashboard.all_panels().find(|p| p.id == Some(310)).unwrap();
        let value = serde_json::to_value(table).unwrap();
        assert_eq!(value["targets"][0]["instant"], true);
        assert!(value["targets"][0].get("legendFormat").is_none());
        assert_eq!(
            value["transformations"][0],
            json!({ "id": "sortBy", "options": { "fields": {}, "sort": [{ "desc": true, "field": "Value" }] } })
        );
        assert_eq!(
            value["fieldConfig"]["overrides"][1]["properties"],
            json!([{ "id": "custom.width", "value": 350 }, { "id": "displayName", "value": "Path" }])
        );
    }
}
