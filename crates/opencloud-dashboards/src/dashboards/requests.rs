// Numan Thabit 2025
//! Performance drill-down: latency distribution, per-service load, resource correlation.

use grafana_kit::{
    color_override, green_yellow_red,
    options::{
        BarGaugeDisplayMode, BigValueColorMode, BigValueGraphMode, FilterValueRange,
        HeatmapColorMode, HeatmapColorOptions, HeatmapColorScale, ReduceDataOptions,
        TooltipDisplayMode, VizLegendOptions, VizOrientation, VizTooltipOptions,
    },
    prom_query,
    schema::{AxisPlacement, GraphDrawStyle, StackingConfig, VisibilityMode},
    single_color, BarGaugeBuilder, Dashboard, DashboardBuilder, FieldColor, FieldOverride,
    HeatmapBuilder, RowBuilder, StatBuilder, Thresholds, TimeseriesBuilder,
};

use super::Datasources;

const REQUESTS_RATE: &str = "sum(rate(opencloud_proxy_requests_total[5m]))";
const ERRORS_RATE: &str = "sum(rate(opencloud_proxy_errors_total[5m]))";

/// Services compared in the bar gauges, as `(metric, legend)`.
const SERVICE_COUNTERS: [(&str, &str); 6] = [
    ("opencloud_frontend_http_requests_total", "Frontend HTTP"),
    ("ocis_ocdav_http_requests_total", "WebDAV"),
    ("opencloud_gateway_grpc_requests_total", "Gateway gRPC"),
    ("opencloud_storage_users_grpc_requests_total", "Storage Users gRPC"),
    ("opencloud_sharing_grpc_requests_total", "Sharing gRPC"),
    ("opencloud_users_grpc_requests_total", "Users gRPC"),
];

fn latency_quantile(q: &str) -> String {
    format!(
        "histogram_quantile({q}, sum(rate(opencloud_proxy_duration_seconds_bucket[5m])) by (le))"
    )
}

fn indicator(ds: &Datasources, id: u32, x: u32, thresholds: Thresholds) -> StatBuilder {
    StatBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .grid_pos(4, 4, x, 1)
        .color_scheme(FieldColor::thresholds())
        .thresholds(thresholds)
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::Area)
}

fn trend(ds: &Datasources, id: u32) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .draw_style(GraphDrawStyle::Line)
        .line_width(2)
        .point_size(5)
        .tooltip(VizTooltipOptions::multi_desc())
}

fn series_override(name: &str, color: &str, unit: &str, right_axis: bool) -> FieldOverride {
    let mut field_override = FieldOverride::by_name(name).fixed_color(color);
    if right_axis {
        field_override = field_override.property("custom.axisPlacement", "right");
    }
    field_override.property("unit", unit)
}

fn service_bars(ds: &Datasources, id: u32, x: u32, range: bool) -> BarGaugeBuilder {
    let builder = BarGaugeBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .grid_pos(6, 12, x, 26);
    SERVICE_COUNTERS
        .iter()
        .fold(builder, |builder, (metric, legend)| {
            let expr = if range {
                format!("sum(increase({metric}[$__range]))")
            } else {
                format!("sum({metric})")
            };
            builder.prom(&expr, legend)
        })
        .unit("short")
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
        .orientation(VizOrientation::Horizontal)
        .display_mode(BarGaugeDisplayMode::Gradient)
        .show_unfilled(true)
}

fn latency_heatmap(ds: &Datasources) -> HeatmapBuilder {
    HeatmapBuilder::new()
        .id(210)
        .title("Latency Heatmap")
        .description("Latency distribution visualization. Darker colors = more requests at that latency. Look for: consistent band (good), spreading pattern (degradation), bimodal distribution (two different request types). Hover for exact counts.")
        .datasource(ds.prometheus.clone())
        .grid_pos(8, 24, 0, 6)
        .with_query(|refs| {
            prom_query(
                refs,
                "sum(increase(opencloud_proxy_duration_seconds_bucket[1m])) by (le)",
                Some("{{le}}"),
            )
            .format("heatmap")
        })
        .calculate(false)
        .cell_gap(1)
        .color(HeatmapColorOptions {
            mode: HeatmapColorMode::Scheme,
            scheme: "Oranges".to_string(),
            fill: "dark-orange".to_string(),
            scale: HeatmapColorScale::Exponential,
            exponent: 0.5,
            steps: 64,
            reverse: false,
        })
        .filter_values(FilterValueRange {
            le: Some(1e-9),
            ge: None,
        })
        .rows_layout("auto")
        .show_legend()
        .tooltip_mode(TooltipDisplayMode::Single)
        .show_y_histogram()
        .y_axis("s", AxisPlacement::Left, false)
        .exemplars_color("rgba(255,0,255,0.7)")
}

pub fn build(ds: &Datasources) -> Dashboard {
    DashboardBuilder::new("OpenCloud Request Details")
        .uid("opencloud-requests")
        .description("Performance analysis dashboard. Use this to investigate latency issues, identify slow services, and correlate load with resource usage. Start here when users report slowness.")
        .tags(&["opencloud", "requests", "performance"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_row(RowBuilder::new("Key Indicators").id(100).at(0))
        .with_panel(
            indicator(ds, 110, 0, single_color("green"))
                .title("Total Requests/s")
                .description("Total HTTP requests per second across all services. Baseline for understanding current load. Compare with historical values to identify traffic patterns or anomalies.")
                .prom(REQUESTS_RATE, "Total")
                .unit("reqps")
                .build(),
        )
        .with_panel(
            indicator(ds, 120, 4, green_yellow_red(1.0, 5.0))
                .title("Error Rate")
                .description("Percentage of failed requests. Should be <1% under normal conditions. Spikes here warrant immediate investigation in Loki logs.")
                .prom(&format!("{ERRORS_RATE} / {REQUESTS_RATE} * 100"), "Error %")
                .unit("percent")
                .build(),
        )
        .with_panel(
            indicator(ds, 130, 8, green_yellow_red(0.1, 0.5))
                .title("P50 Latency")
                .description("Median response time - what the typical user experiences. Should be <100ms for snappy UI. Higher values indicate general slowness affecting everyone.")
                .prom(&latency_quantile("0.50"), "P50")
                .unit("s")
                .build(),
        )
        .with_panel(
            indicator(ds, 140, 12, green_yellow_red(0.5, 2.0))
                .title("P95 Latency")
                .description("95th percentile - slow requests affecting 5% of users. Gap between P50 and P95 shows consistency. Large gap = some requests are much slower than others.")
                .prom(&latency_quantile("0.95"), "P95")
                .unit("s")
                .build(),
        )
        .with_panel(
            indicator(ds, 150, 16, green_yellow_red(1.0, 5.0))
                .title("P99 Latency")
                .description("99th percentile - worst case for almost all users. Very high P99 with normal P50 indicates occasional slow operations (large file ops, complex searches, or resource contention).")
                .prom(&latency_quantile("0.99"), "P99")
                .unit("s")
                .build(),
        )
        .with_panel(
            indicator(ds, 160, 20, green_yellow_red(1.0, 10.0))
                .title("Errors/s")
                .description("Absolute error count per second. More useful than % when traffic is low. Even 1 error/s during low traffic periods could be 50% error rate.")
                .prom(ERRORS_RATE, "Errors")
                .unit("short")
                .build(),
        )
        .with_row(RowBuilder::new("Latency Analysis").id(200).at(5))
        .with_panel(latency_heatmap(ds).build())
        .with_panel(
            trend(ds, 220)
                .title("Latency Percentiles Over Time")
                .description("Track how latency changes over time. Parallel lines = consistent performance. Diverging lines = some requests getting slower. Sudden jumps correlate with deployments, traffic spikes, or external issues.")
                .grid_pos(8, 12, 0, 14)
                .prom(&latency_quantile("0.50"), "P50")
                .prom(&latency_quantile("0.90"), "P90")
                .prom(&latency_quantile("0.95"), "P95")
                .prom(&latency_quantile("0.99"), "P99")
                .unit("s")
                .fill_opacity(10)
                .show_points(VisibilityMode::Never)
                .legend(VizLegendOptions::list())
                .with_override(color_override("P50", "green"))
                .with_override(color_override("P90", "yellow"))
                .with_override(color_override("P95", "orange"))
                .with_override(color_override("P99", "red"))
                .build(),
        )
        .with_panel(
            trend(ds, 230)
                .title("Request Rate vs Errors")
                .description("Does load cause errors? If errors spike when requests spike, system is overwhelmed. If errors spike without request spike, something else is wrong (disk full, external service down, bug).")
                .grid_pos(8, 12, 12, 14)
                .prom(REQUESTS_RATE, "Requests/s")
                .prom(ERRORS_RATE, "Errors/s")
                .fill_opacity(10)
                .show_points(VisibilityMode::Never)
                .legend(VizLegendOptions::list())
                .with_override(series_override("Requests/s", "green", "reqps", false))
                .with_override(series_override("Errors/s", "red", "short", true))
                .build(),
        )
        .with_row(
            RowBuilder::new("Service Breakdown")
                .id(300)
                .at(22)
                .collapsed(true)
                .with_panel(
                    trend(ds, 310)
                        .title("HTTP Requests by Service")
                        .description("External-facing HTTP services. Frontend = web UI/API. WebDAV = file sync clients (desktop/mobile apps). OCM = Open Cloud Mesh federation. Helps identify which interface is under load.")
                        .grid_pos(8, 12, 0, 23)
                        .prom("sum(rate(opencloud_frontend_http_requests_total[5m]))", "Frontend")
                        .prom("sum(rate(ocis_ocdav_http_requests_total[5m]))", "WebDAV")
                        .prom("sum(rate(opencloud_ocm_http_requests_total[5m]))", "OCM")
                        .prom(
                            "sum(rate(opencloud_storage_system_http_requests_total[5m]))",
                            "Storage System",
                        )
                        .unit("reqps")
                        .fill_opacity(20)
                        .show_points(VisibilityMode::Never)
                        .stacking(StackingConfig::normal())
                        .legend(VizLegendOptions::list())
                        .build(),
                )
                .with_panel(
                    trend(ds, 320)
                        .title("gRPC Requests by Service")
                        .description("Internal microservice communication. Gateway = central router. Users/Groups = identity lookups. Sharing = share operations. High traffic on one service may indicate bottleneck or inefficient queries.")
                        .grid_pos(8, 12, 12, 23)
                        .prom("sum(rate(opencloud_gateway_grpc_requests_total[5m]))", "Gateway")
                        .prom("sum(rate(opencloud_users_grpc_requests_total[5m]))", "Users")
                        .prom("sum(rate(opencloud_groups_grpc_requests_total[5m]))", "Groups")
                        .prom("sum(rate(opencloud_sharing_grpc_requests_total[5m]))", "Sharing")
                        .prom(
                            "sum(rate(opencloud_storage_users_grpc_requests_total[5m]))",
                            "Storage Users",
                        )
                        .prom(
                            "sum(rate(opencloud_auth_service_grpc_requests_total[5m]))",
                            "Auth Service",
                        )
                        .unit("reqps")
                        .fill_opacity(20)
                        .show_points(VisibilityMode::Never)
                        .stacking(StackingConfig::normal())
                        .legend(VizLegendOptions::list())
                        .build(),
                ),
        )
        .with_row(
            RowBuilder::new("Endpoint Analysis")
                .id(400)
                .at(23)
                .collapsed(true)
                .with_panel(
                    trend(ds, 410)
                        .title("Microservice Latency by Endpoint")
                        .description("Average latency per internal API endpoint. Shows top 10 slowest. Useful for identifying which specific operations are slow. RoleService, PermissionService calls happen on every request - keep them fast.")
                        .grid_pos(8, 24, 0, 24)
                        .prom(
                            "topk(10, sum by (micro_endpoint) (rate(micro_request_duration_seconds_sum[5m])) / sum by (micro_endpoint) (rate(micro_request_duration_seconds_count[5m])))",
                            "{{micro_endpoint}}",
                        )
                        .unit("s")
                        .fill_opacity(0)
                        .show_points(VisibilityMode::Auto)
                        .legend(VizLegendOptions::table_right())
                        .build(),
                ),
        )
        .with_row(
            RowBuilder::new("Resource Correlation")
                .id(500)
                .at(24)
                .collapsed(true)
                .with_panel(
                    trend(ds, 510)
                        .title("Request Rate vs Memory")
                        .description("Correlation analysis for memory leaks. Memory should stay relatively stable regardless of load. If heap grows with requests and doesn't drop back after load decreases, investigate memory leak. Goroutines should also stay bounded.")
                        .grid_pos(8, 24, 0, 25)
                        .prom(REQUESTS_RATE, "Requests/s")
                        .prom(
                            r#"sum(go_memstats_heap_alloc_bytes{job="opencloud"})"#,
                            "Heap Memory",
                        )
                        .prom(r#"sum(go_goroutines{job="opencloud"})"#, "Goroutines")
                        .fill_opacity(10)
                        .show_points(VisibilityMode::Never)
                        .legend(VizLegendOptions::list())
                        .with_override(series_override("Requests/s", "green", "reqps", false))
                        .with_override(series_override("Heap Memory", "blue", "bytes", true))
                        .with_override(series_override("Goroutines", "purple", "short", true))
                        .build(),
                ),
        )
        .with_row(
            RowBuilder::new("Service Totals")
                .id(600)
                .at(25)
                .collapsed(true)
                .with_panel(
                    service_bars(ds, 610, 0, true)
                        .title("Service Requests (selected range)")
                        .description("Request counts for the selected time range. Shows which services were most active in your selected window. Useful for investigating specific time periods.")
                        .build(),
                )
                .with_panel(
                    service_bars(ds, 620, 12, false)
                        .title("Service Totals (since start)")
                        .description("Cumulative request counts since container restart. Shows overall traffic distribution over entire uptime. Useful for capacity planning and understanding service load ratios.")
                        .build(),
                ),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_kit::DashboardPanel;
    use serde_json::json;

    #[test]
    fn detail_rows_start_collapsed() {
        let dashboard = build(&Datasources::default());
        let collapsed: Vec<u32> = dashboard
            .rows()
            .filter(|row| row.collapsed)
            .map(|row| row.id)
            .collect();
        assert_eq!(collapsed, [300, 400, 500, 600]);
        let nested: usize = dashboard.rows().map(|row| row.panels.len()).sum();
        assert_eq!(nested, 6);
    }

    #[test]
    fn heatmap_reads_prebucketed_series() {
        let dashboard = build(&Datasources::default());
        let heatmap = dashboard
            .panels
            .iter()
            .find_map(|entry| match entry {
                DashboardPanel::Panel(panel) if panel.kind == "heatmap" => Some(panel),
                _ => None,
            })
            .unwrap();
        let value = serde_json::to_value(heatmap).unwrap();
        assert_eq!(value["targets"][0]["format"], "heatmap");
        assert_eq!(value["targets"][0]["legendFormat"], "{{le}}");
        assert_eq!(value["options"]["calculate"], false);
        assert_eq!(value["options"]["filterValues"], json!({ "le": 1e-9 }));
        assert_eq!(value["options"]["yAxis"]["axisPlacement"], "left");
    }

    #[test]
    fn range_and_total_bars_share_services() {
        let dashboard = build(&Datasources::default());
        let bars: Vec<_> = dashboard.all_panels().filter(|p| p.kind == "bargauge").collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].targets[5].expr,
            "sum(increase(opencloud_users_grpc_requests_total[$__range]))"
        );
        assert_eq!(bars[1].targets[5].expr, "sum(opencloud_users_grpc_requests_total)");
        assert_eq!(bars[1].targets[5].ref_id, "F");
    }
}
