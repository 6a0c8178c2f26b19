// Numan Thabit 2025
//! Quick health check: request rate, error rate, latency, transfers.

use grafana_kit::{
    color_override, green_yellow_red,
    options::{
        BigValueColorMode, BigValueGraphMode, BigValueTextMode, ReduceDataOptions,
        VizLegendOptions, VizTooltipOptions,
    },
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    Dashboard, DashboardBuilder, FieldColor, FieldOverride, GaugeBuilder, StatBuilder,
    TimeseriesBuilder,
};

use super::Datasources;

const REQUESTS_RATE: &str = "sum(rate(opencloud_proxy_requests_total[5m]))";
const ERRORS_RATE: &str = "sum(rate(opencloud_proxy_errors_total[5m]))";

fn latency_quantile(q: &str) -> String {
    format!(
        "histogram_quantile({q}, sum(rate(opencloud_proxy_duration_seconds_bucket[5m])) by (le))"
    )
}

fn headline_stat(ds: &Datasources) -> StatBuilder {
    StatBuilder::new()
        .datasource(ds.prometheus.clone())
        .color_scheme(FieldColor::thresholds())
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::Area)
}

fn line_chart(ds: &Datasources) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .datasource(ds.prometheus.clone())
        .draw_style(GraphDrawStyle::Line)
        .point_size(5)
        .show_points(VisibilityMode::Never)
        .tooltip(VizTooltipOptions::multi_desc())
        .legend(VizLegendOptions::list())
}

pub fn build(ds: &Datasources) -> Dashboard {
    DashboardBuilder::new("OpenCloud Overview")
        .uid("opencloud-overview")
        .description("Quick health check for OpenCloud. Shows key metrics at a glance: request rate, error rate, latency, and active transfers.")
        .tags(&["opencloud", "overview"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_panel(
            headline_stat(ds)
                .id(10)
                .title("Requests/s")
                .description("HTTP requests per second at the OpenCloud proxy. Measures current system load. Normal: 1-50 req/s for small teams. Yellow >100, Red >500 indicates high load or possible attack.")
                .grid_pos(4, 6, 0, 0)
                .prom(REQUESTS_RATE, "Requests/s")
                .unit("reqps")
                .thresholds(green_yellow_red(100.0, 500.0))
                .build(),
        )
        .with_panel(
            GaugeBuilder::new()
                .id(20)
                .title("Error Rate")
                .description("Percentage of failed requests (5xx errors, timeouts). Green <1% is normal. Yellow 1-5% indicates issues. Red >5% requires immediate investigation - check logs in Loki dashboard.")
                .datasource(ds.prometheus.clone())
                .grid_pos(4, 6, 6, 0)
                .prom(&format!("{ERRORS_RATE} / {REQUESTS_RATE} * 100"), "Error %")
                .unit("percent")
                .min(0.0)
                .max(10.0)
                .color_scheme(FieldColor::thresholds())
                .thresholds(green_yellow_red(1.0, 5.0))
                .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
                .show_threshold_labels(false)
                .show_threshold_markers(true)
                .build(),
        )
        .with_panel(
            headline_stat(ds)
                .id(30)
                .title("P95 Latency")
                .description("95% of all requests complete faster than this value. Reflects user experience for most users. Green <500ms is good. Yellow 0.5-2s is acceptable. Red >2s means noticeable delays for users.")
                .grid_pos(4, 6, 12, 0)
                .prom(&latency_quantile("0.95"), "P95")
                .unit("s")
                .thresholds(green_yellow_red(0.5, 2.0))
                .build(),
        )
        .with_panel(
            headline_stat(ds)
                .id(40)
                .title("Goroutines")
                .description("Number of active goroutines in the OpenCloud process. Normal: 500-1500. Steadily increasing value without decline may indicate a goroutine leak. Yellow >2000, Red >5000 requires investigation.")
                .grid_pos(4, 6, 18, 0)
                .prom(r#"sum(go_goroutines{job="opencloud"})"#, "Goroutines")
                .unit("short")
                .thresholds(green_yellow_red(2000.0, 5000.0))
                .build(),
        )
        .with_panel(
            line_chart(ds)
                .id(50)
                .title("Request Rate & Errors")
                .description("Correlation between load and errors over time. Green line = requests (left axis), red line = errors (right axis). Do errors rise proportionally with requests? System is overloaded. Errors without request spike indicate other problems.")
                .grid_pos(8, 24, 0, 4)
                .prom(REQUESTS_RATE, "Requests/s")
                .prom(ERRORS_RATE, "Errors/s")
                .line_width(2)
                .fill_opacity(10)
                .with_override(
                    FieldOverride::by_name("Errors/s")
                        .fixed_color("red")
                        .property("custom.axisPlacement", "right")
                        .property("custom.fillOpacity", 0)
                        .property("custom.lineWidth", 2),
                )
                .with_override(color_override("Requests/s", "green"))
                .build(),
        )
        .with_panel(
            line_chart(ds)
                .id(60)
                .title("Latency Percentiles")
                .description("Response times by percentile: P50 (median, green) = typical user. P95 (yellow) = slow requests. P99 (red) = worst case. Large gap between P50 and P99 indicates outliers - check Request Details dashboard.")
                .grid_pos(8, 12, 0, 12)
                .prom(&latency_quantile("0.50"), "P50")
                .prom(&latency_quantile("0.95"), "P95")
                .prom(&latency_quantile("0.99"), "P99")
                .unit("s")
                .line_width(2)
                .fill_opacity(0)
                .with_override(color_override("P50", "green"))
                .with_override(color_override("P95", "yellow"))
                .with_override(color_override("P99", "red"))
                .build(),
        )
        .with_panel(
            line_chart(ds)
                .id(70)
                .title("Active Transfers")
                .description("Active file transfers: Uploads (blue), Downloads (purple), Processing (orange). Processing = files being processed after upload (antivirus, indexing). High processing values may indicate slow ClamAV.")
                .grid_pos(8, 12, 12, 12)
                .prom("sum(reva_upload_active)", "Uploads")
                .prom("sum(reva_download_active)", "Downloads")
                .prom("sum(reva_upload_processing)", "Processing")
                .unit("short")
                .line_width(2)
                .fill_opacity(20)
                .with_override(color_override("Uploads", "blue"))
                .with_override(color_override("Downloads", "purple"))
                .with_override(color_override("Processing", "orange"))
                .build(),
        )
        .with_panel(
            line_chart(ds)
                .id(80)
                .title("Upload Pipeline")
                .description("Upload lifecycle per minute: Initiated → Transfer Complete → Scanned (antivirus) → Finalized or Aborted. Gap between stages shows drop-off. Many Aborted = problem with uploads or antivirus.")
                .grid_pos(8, 16, 0, 20)
                .prom("sum(rate(reva_upload_sessions_initiated[5m])) * 60", "Initiated")
                .prom("sum(rate(reva_upload_sessions_scanned[5m])) * 60", "Scanned")
                .prom("sum(rate(reva_upload_sessions_finalized[5m])) * 60", "Finalized")
                .prom("sum(rate(reva_upload_sessions_aborted[5m])) * 60", "Aborted")
                .unit("short")
                .line_width(1)
                .fill_opacity(30)
                .stacking(StackingConfig::normal())
                .with_override(color_override("Initiated", "blue"))
                .with_override(color_override("Scanned", "yellow"))
                .with_override(color_override("Finalized", "green"))
                .with_override(color_override("Aborted", "red"))
                .build(),
        )
        .with_panel(
            headline_stat(ds)
                .id(90)
                .title("Event Queues")
                .description("Async processing queues. Postprocessing = upload post-processing (antivirus, thumbnails). Search = search index updates. Values >0 are normal during activity but should not keep increasing. Yellow >10, Red >100 = backlog building up.")
                .grid_pos(4, 8, 16, 20)
                .prom("sum(opencloud_postprocessing_events_unprocessed)", "Postprocessing")
                .prom("sum(opencloud_search_events_unprocessed)", "Search")
                .unit("short")
                .thresholds(green_yellow_red(10.0, 100.0))
                .text_mode(BigValueTextMode::Auto)
                .build(),
        )
        .with_panel(
            headline_stat(ds)
                .id(100)
                .title("Memory Usage")
                .description("Heap memory usage of OpenCloud process. Normal: 50-200 MB. Yellow >512 MB, Red >1 GB. Steadily increasing value without decline after GC indicates memory leak. If issues persist: restart container.")
                .grid_pos(4, 8, 16, 24)
                .prom(r#"sum(go_memstats_heap_alloc_bytes{job="opencloud"})"#, "Heap")
                .unit("bytes")
                .thresholds(green_yellow_red(536_870_912.0, 1_073_741_824.0))
                .build(),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_rate_gauge_is_bounded() {
        let value = serde_json::to_value(build(&Datasources::default())).unwrap();
        let gauge = &value["panels"][1];
        assert_eq!(gauge["type"], "gauge");
        assert_eq!(gauge["fieldConfig"]["defaults"]["min"], 0);
        assert_eq!(gauge["fieldConfig"]["defaults"]["max"], 10);
        assert_eq!(
            gauge["targets"][0]["expr"],
            "sum(rate(opencloud_proxy_errors_total[5m])) / sum(rate(opencloud_proxy_requests_total[5m])) * 100"
        );
    }

    #[test]
    fn dual_axis_override_moves_errors_right() {
        let value = serde_json::to_value(build(&Datasources::default())).unwrap();
        let overrides = &value["panels"][4]["fieldConfig"]["overrides"];
        assert_eq!(overrides[0]["matcher"]["options"], "Errors/s");
        assert_eq!(
            overrides[0]["properties"][1],
            json!({ "id": "custom.axisPlacement", "value": "right" })
        );
        assert_eq!(overrides[1]["properties"].as_array().map(Vec::len), Some(1));
    }
}
