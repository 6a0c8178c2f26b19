// Numan Thabit 2025
//! Upload lifecycle, ClamAV scanning and the async processing queues.

use grafana_kit::{
    color_override, green_yellow_red,
    options::{
        BarGaugeDisplayMode, BigValueColorMode, BigValueGraphMode, BigValueTextMode,
        ReduceDataOptions, VizLegendOptions, VizOrientation, VizTooltipOptions,
    },
    red_yellow_green,
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    BarGaugeBuilder, Dashboard, DashboardBuilder, FieldColor, GaugeBuilder, RowBuilder,
    StatBuilder, ThresholdError, Thresholds, TimeseriesBuilder,
};

use super::Datasources;

/// Yellow/red ramp over a non-green base color.
fn tinted_ramp(base: &str, yellow: f64, red: f64) -> Result<Thresholds, ThresholdError> {
    Thresholds::custom(base, &[(yellow, "yellow"), (red, "red")])
}

fn gauge_stat(ds: &Datasources, id: u32, x: u32, thresholds: Thresholds) -> StatBuilder {
    StatBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .grid_pos(4, 4, x, 1)
        .unit("short")
        .color_scheme(FieldColor::thresholds())
        .thresholds(thresholds)
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::Area)
}

/// Per-stage session counts, either over the selected range or since start.
fn stage_counts(
    ds: &Datasources,
    id: u32,
    x: u32,
    stages: &[(&str, &str)],
    range: bool,
) -> StatBuilder {
    let builder = StatBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .grid_pos(4, 12, x, 15);
    stages
        .iter()
        .fold(builder, |builder, (metric, legend)| {
            let expr = if range {
                format!("sum(increase(reva_upload_sessions_{metric}[$__range]))")
            } else {
                format!("sum(reva_upload_sessions_{metric})")
            };
            builder.prom(&expr, legend)
        })
        .unit("short")
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::None)
        .text_mode(BigValueTextMode::ValueAndName)
        .with_override(color_override("Finalized", "green"))
        .with_override(color_override("Aborted", "red"))
}

fn flow(ds: &Datasources, id: u32) -> TimeseriesBuilder {
    TimeseriesBuilder::new()
        .id(id)
        .datasource(ds.prometheus.clone())
        .draw_style(GraphDrawStyle::Line)
        .line_width(2)
        .point_size(5)
        .tooltip(VizTooltipOptions::multi_desc())
        .legend(VizLegendOptions::list())
}

fn duration_percentiles(ds: &Datasources, id: u32, x: u32, histogram: &str) -> TimeseriesBuilder {
    ["0.50", "0.95", "0.99"]
        .iter()
        .zip(["P50", "P95", "P99"])
        .fold(flow(ds, id).grid_pos(6, 8, x, 21), |builder, (q, legend)| {
            builder.prom(
                &format!("histogram_quantile({q}, sum(rate({histogram}_bucket[5m])) by (le))"),
                legend,
            )
        })
        .unit("s")
        .fill_opacity(10)
        .show_points(VisibilityMode::Auto)
        .with_override(color_override("P50", "green"))
        .with_override(color_override("P95", "yellow"))
        .with_override(color_override("P99", "red"))
}

fn stage_ratio(stage: &str) -> String {
    format!(
        "(sum(increase(reva_upload_sessions_{stage}[$__range])) / sum(increase(reva_upload_sessions_initiated[$__range]))) * 100"
    )
}

pub fn build(ds: &Datasources) -> Result<Dashboard, ThresholdError> {
    let processing_ramp = tinted_ramp("blue", 20.0, 100.0)?;
    let download_ramp = tinted_ramp("purple", 50.0, 200.0)?;

    let dashboard = DashboardBuilder::new("OpenCloud Upload Pipeline")
        .uid("opencloud-uploads")
        .description("Deep dive into file uploads, antivirus scanning with ClamAV, and async processing queues. Use this dashboard to troubleshoot upload failures and identify bottlenecks.")
        .tags(&["opencloud", "uploads", "antivirus"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_row(RowBuilder::new("Key Indicators").id(100).at(0))
        .with_panel(
            gauge_stat(ds, 110, 0, green_yellow_red(10.0, 50.0))
                .title("Active Uploads")
                .description("Currently active file uploads. Shows how many files are being uploaded right now. High values during off-hours may indicate backup jobs or sync clients. Yellow >10, Red >50.")
                .prom("sum(reva_upload_active)", "Active")
                .build(),
        )
        .with_panel(
            gauge_stat(ds, 120, 4, processing_ramp)
                .title("Processing")
                .description("Files in post-upload processing (antivirus scan, thumbnail generation, search indexing). High values indicate ClamAV is slow or backlog is building. Should return to 0 shortly after uploads complete.")
                .prom("sum(reva_upload_processing)", "Processing")
                .build(),
        )
        .with_panel(
            gauge_stat(ds, 130, 8, download_ramp)
                .title("Active Downloads")
                .description("Currently active file downloads. High values indicate heavy read activity. Downloads are less resource-intensive than uploads since no post-processing is needed.")
                .prom("sum(reva_download_active)", "Downloads")
                .build(),
        )
        .with_panel(
            GaugeBuilder::new()
                .id(140)
                .title("Upload Success Rate")
                .description("Percentage of uploads that complete successfully (finalized / initiated). Green >98% is healthy. Yellow 90-98% needs attention. Red <90% indicates serious issues - check antivirus logs or storage.")
                .datasource(ds.prometheus.clone())
                .grid_pos(4, 4, 12, 1)
                .prom(
                    "(sum(increase(reva_upload_sessions_finalized[5m])) / sum(increase(reva_upload_sessions_initiated[5m]))) * 100",
                    "Success %",
                )
                .unit("percent")
                .min(0.0)
                .max(100.0)
                .color_scheme(FieldColor::thresholds())
                .thresholds(red_yellow_green(90.0, 98.0))
                .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
                .show_threshold_labels(false)
                .show_threshold_markers(true)
                .build(),
        )
        .with_panel(
            gauge_stat(ds, 150, 16, green_yellow_red(10.0, 50.0))
                .title("Postprocessing Queue")
                .description("Events waiting to be processed after upload (antivirus, thumbnails). Should normally be 0-5. Growing queue indicates processing can't keep up - check ClamAV performance or disk I/O.")
                .prom("sum(opencloud_postprocessing_events_unprocessed)", "Unprocessed")
                .build(),
        )
        .with_panel(
            gauge_stat(ds, 160, 20, green_yellow_red(10.0, 50.0))
                .title("Search Queue")
                .description("Events waiting to update the search index. New files need to be indexed for search. Growing queue may indicate search service issues. Check search logs if persistently high.")
                .prom("sum(opencloud_search_events_unprocessed)", "Unprocessed")
                .build(),
        )
        .with_row(RowBuilder::new("Upload Pipeline").id(200).at(5))
        .with_panel(
            flow(ds, 210)
                .title("Upload Pipeline Flow")
                .description("Upload session lifecycle per minute: Initiated (upload started) → Transfer Complete (all bytes received) → Scanned (ClamAV check) → Finalized (success) or Aborted (failed). Watch for gaps between stages - indicates where uploads get stuck.")
                .grid_pos(8, 24, 0, 6)
                .prom("sum(rate(reva_upload_sessions_initiated[5m])) * 60", "Initiated")
                .prom(
                    "sum(rate(reva_upload_sessions_bytes_received[5m])) * 60",
                    "Transfer Complete",
                )
                .prom("sum(rate(reva_upload_sessions_scanned[5m])) * 60", "Scanned (AV)")
                .prom("sum(rate(reva_upload_sessions_finalized[5m])) * 60", "Finalized")
                .prom("sum(rate(reva_upload_sessions_aborted[5m])) * 60", "Aborted")
                .prom("sum(rate(reva_upload_sessions_restarted[5m])) * 60", "Restarted")
                .prom(
                    "sum(rate(opencloud_postprocessing_finished[5m])) * 60",
                    "Postprocessing Done",
                )
                .unit("short")
                .fill_opacity(20)
                .show_points(VisibilityMode::Never)
                .with_override(color_override("Initiated", "blue"))
                .with_override(color_override("Transfer Complete", "light-blue"))
                .with_override(color_override("Scanned (AV)", "yellow"))
                .with_override(color_override("Finalized", "green"))
                .with_override(color_override("Aborted", "red"))
                .with_override(color_override("Restarted", "orange"))
                .with_override(color_override("Postprocessing Done", "semi-dark-green"))
                .build(),
        )
        .with_row(RowBuilder::new("Upload Statistics").id(300).at(14))
        .with_panel(
            stage_counts(
                ds,
                310,
                0,
                &[
                    ("initiated", "Initiated"),
                    ("bytes_received", "Transfer Complete"),
                    ("scanned", "Scanned"),
                    ("finalized", "Finalized"),
                    ("aborted", "Aborted"),
                ],
                true,
            )
            .title("Uploads in Selected Range")
            .description("Upload counts for the time range selected above (e.g., 'Last 1 hour'). Shows activity in your selected window. Compare stages to identify where uploads fail: Initiated → Transfer Complete → Scanned → Finalized.")
            .build(),
        )
        .with_panel(
            stage_counts(
                ds,
                320,
                12,
                &[
                    ("initiated", "Initiated"),
                    ("bytes_received", "Transfer Complete"),
                    ("scanned", "Scanned"),
                    ("finalized", "Finalized"),
                    ("aborted", "Aborted"),
                    ("deleted", "Deleted"),
                ],
                false,
            )
            .title("Upload Totals (since start)")
            .description("Cumulative upload counts since container restart. Shows overall system health over entire uptime. Useful for success rate calculation: Finalized/Initiated. If Transfer Complete < Initiated: network issues. If Scanned < Finalized: AV bypass.")
            .build(),
        )
        .with_row(
            RowBuilder::new("Transfer Activity")
                .id(400)
                .at(19)
                .collapsed(true)
                .with_panel(
                    flow(ds, 410)
                        .title("Active Transfers Over Time")
                        .description("Concurrent transfers stacked over time. Uploads (blue), Downloads (purple), Processing (orange), Assimilation (green = PosixFS metadata sync). Helps identify peak usage times and correlate with performance issues.")
                        .grid_pos(8, 12, 0, 20)
                        .prom("sum(reva_upload_active)", "Uploads")
                        .prom("sum(reva_download_active)", "Downloads")
                        .prom("sum(reva_upload_processing)", "Processing")
                        .prom("sum(reva_assimilation_active_tasks)", "Assimilation")
                        .unit("short")
                        .fill_opacity(30)
                        .show_points(VisibilityMode::Never)
                        .stacking(StackingConfig::normal())
                        .with_override(color_override("Uploads", "blue"))
                        .with_override(color_override("Downloads", "purple"))
                        .with_override(color_override("Processing", "orange"))
                        .with_override(color_override("Assimilation", "light-green"))
                        .build(),
                )
                .with_panel(
                    flow(ds, 420)
                        .title("Event Queue Depth")
                        .description("Async event queue backlog over time. Unprocessed = waiting to be handled. Redelivered = events that failed and are being retried. Rising redelivered count indicates persistent failures - check service logs.")
                        .grid_pos(8, 12, 12, 20)
                        .prom(
                            "sum(opencloud_postprocessing_events_unprocessed)",
                            "Postprocessing Unprocessed",
                        )
                        .prom(
                            "sum(opencloud_postprocessing_events_redelivered)",
                            "Postprocessing Redelivered",
                        )
                        .prom(
                            "sum(opencloud_postprocessing_events_outstanding_acks)",
                            "Postprocessing Outstanding Acks",
                        )
                        .prom("sum(opencloud_search_events_unprocessed)", "Search Unprocessed")
                        .prom("sum(opencloud_search_events_redelivered)", "Search Redelivered")
                        .unit("short")
                        .fill_opacity(20)
                        .show_points(VisibilityMode::Never)
                        .with_override(color_override("Postprocessing Unprocessed", "yellow"))
                        .with_override(color_override("Postprocessing Redelivered", "orange"))
                        .with_override(color_override("Postprocessing Outstanding Acks", "red"))
                        .with_override(color_override("Search Unprocessed", "blue"))
                        .with_override(color_override("Search Redelivered", "purple"))
                        .build(),
                ),
        )
        .with_row(
            RowBuilder::new("Processing Performance")
                .id(500)
                .at(20)
                .collapsed(true)
                .with_panel(
                    duration_percentiles(
                        ds,
                        510,
                        0,
                        "opencloud_thumbnails_getthumbnail_duration_seconds",
                    )
                        .title("Thumbnail Generation")
                        .description("Time to generate image/document thumbnails. P50 (green) = typical. P95 (yellow) = slow. P99 (red) = worst case. Slow thumbnails affect file browser responsiveness. Large files or complex documents take longer.")
                        .build(),
                )
                .with_panel(
                    duration_percentiles(ds, 520, 8, "opencloud_postprocessing_duration_seconds")
                        .title("Postprocessing Duration")
                        .description("Time to complete async postprocessing (antivirus, thumbnails, search indexing). P50 = typical. P95 = slow. P99 = worst case. High values indicate processing bottlenecks.")
                        .build(),
                )
                .with_panel(
                    BarGaugeBuilder::new()
                        .id(530)
                        .title("Drop-off Analysis (selected range)")
                        .description("Upload success rates for selected time range. Shows % of uploads completing each stage. All bars should be near 100%. Low 'Transfer Complete' = network issues. Low 'AV Scanned' = ClamAV rejections. Low 'Finalized' = post-processing failures.")
                        .datasource(ds.prometheus.clone())
                        .grid_pos(6, 8, 16, 21)
                        .prom(&stage_ratio("bytes_received"), "Transfer Complete")
                        .prom(&stage_ratio("scanned"), "AV Scanned")
                        .prom(&stage_ratio("finalized"), "Finalized")
                        .unit("percent")
                        .min(0.0)
                        .max(100.0)
                        .color_scheme(FieldColor::thresholds())
                        .thresholds(red_yellow_green(80.0, 95.0))
                        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]))
                        .orientation(VizOrientation::Horizontal)
                        .display_mode(BarGaugeDisplayMode::Gradient)
                        .show_unfilled(true)
                        .build(),
                ),
        )
        .build();
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_kit::DashboardPanel;

    fn top_level(dashboard: &Dashboard, id: u32) -> &grafana_kit::Panel {
        dashboard
            .panels
            .iter()
            .find_map(|entry| match entry {
                DashboardPanel::Panel(panel) if panel.id == Some(id) => Some(panel),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn tinted_ramps_are_valid_and_start_off_green() {
        let dashboard = build(&Datasources::default()).unwrap();
        let processing = top_level(&dashboard, 120);
        let thresholds = processing.field_config.defaults.thresholds.as_ref().unwrap();
        assert!(thresholds.validate().is_ok());
        assert_eq!(thresholds.colors().collect::<Vec<_>>(), ["blue", "yellow", "red"]);

        let downloads = top_level(&dashboard, 130);
        let thresholds = downloads.field_config.defaults.thresholds.as_ref().unwrap();
        assert_eq!(thresholds.steps[0].color, "purple");
        assert_eq!(thresholds.steps[2].value, Some(200.0));
    }

    #[test]
    fn tinted_ramp_rejects_out_of_order_cuts() {
        assert!(matches!(
            tinted_ramp("blue", 100.0, 20.0),
            Err(ThresholdError::NotIncreasing { index: 2, .. })
        ));
        assert_eq!(
            tinted_ramp("purple", 50.0, 200.0).unwrap(),
            Thresholds::custom("purple", &[(50.0, "yellow"), (200.0, "red")]).unwrap()
        );
    }

    #[test]
    fn totals_panel_counts_deleted_sessions() {
        let dashboard = build(&Datasources::default()).unwrap();
        let totals = top_level(&dashboard, 320);
        assert_eq!(totals.targets.len(), 6);
        assert_eq!(totals.targets[5].expr, "sum(reva_upload_sessions_deleted)");
        let range = top_level(&dashboard, 310);
        assert_eq!(
            range.targets[1].expr,
            "sum(increase(reva_upload_sessions_bytes_received[$__range]))"
        );
    }

    #[test]
    fn percentile_panels_query_their_histogram() {
        let dashboard = build(&Datasources::default()).unwrap();
        let thumbnails = dashboard.all_panels().find(|p| p.id == Some(510)).unwrap();
        assert_eq!(
            thumbnails.targets[2].expr,
            "histogram_quantile(0.99, sum(rate(opencloud_thumbnails_getthumbnail_duration_seconds_bucket[5m])) by (le))"
        );
        assert_eq!(thumbnails.targets[2].legend_format.as_deref(), Some("P99"));
    }
}
