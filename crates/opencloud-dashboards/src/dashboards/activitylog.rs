// Numan Thabit 2025
//! Debug view for the activitylog service and NATS/JetStream event processing.

use grafana_kit::{
    color_override, green_red, green_yellow, green_yellow_orange, green_yellow_red,
    options::{
        BigValueColorMode, BigValueGraphMode, BigValueJustifyMode, BigValueTextMode,
        LogsSortOrder, ReduceDataOptions, VizLegendOptions,
    },
    schema::{GraphDrawStyle, StackingConfig, VisibilityMode},
    Dashboard, DashboardBuilder, GridPos, LogsBuilder, Panel, RowBuilder, StatBuilder,
    Thresholds, TimeseriesBuilder,
};

use super::Datasources;

fn stat_panel(
    ds: &Datasources,
    id: u32,
    title: &str,
    expr: &str,
    thresholds: Thresholds,
    pos: GridPos,
) -> Panel {
    StatBuilder::new()
        .id(id)
        .title(title)
        .datasource(ds.loki.clone())
        .grid_pos(pos.h, pos.w, pos.x, pos.y)
        .loki(expr, "")
        .color_mode(BigValueColorMode::Value)
        .graph_mode(BigValueGraphMode::None)
        .justify_mode(BigValueJustifyMode::Auto)
        .text_mode(BigValueTextMode::Auto)
        .reduce_options(ReduceDataOptions::calcs(&["lastNotNull"]).all_fields())
        .unit("short")
        .thresholds(thresholds)
        .build()
}

// Labels stay hidden here and dedup is left to Grafana's default.
fn logs_panel(ds: &Datasources, id: u32, title: &str, expr: &str, pos: GridPos) -> Panel {
    LogsBuilder::new()
        .id(id)
        .title(title)
        .datasource(ds.loki.clone())
        .grid_pos(pos.h, pos.w, pos.x, pos.y)
        .loki(expr, "")
        .show_time(true)
        .show_labels(false)
        .show_common_labels(false)
        .wrap_log_message(true)
        .prettify_log_message(true)
        .enable_log_details(true)
        .sort_order(LogsSortOrder::Descending)
        .build()
}

pub fn build(ds: &Datasources) -> Dashboard {
    DashboardBuilder::new("OpenCloud Activitylog Debug")
        .uid("activitylog-debug")
        .description("Monitor activitylog service, NATS, and event processing for upstream issue tracking")
        .tags(&["opencloud", "activitylog", "nats", "debug"])
        .timezone("browser")
        .refresh("auto")
        .time("now-1h", "now")
        .with_row(RowBuilder::new("NATS / JetStream (Loki)").id(100).at(0))
        .with_panel(stat_panel(
            ds,
            110,
            "NATS Errors (24h)",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"nats"` | json | level=`error` [24h]))"#,
            green_red(1.0),
            GridPos::new(4, 6, 0, 1),
        ))
        .with_panel(stat_panel(
            ds,
            120,
            "NATS Warnings (24h)",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"nats"` | json | level=`warn` [24h]))"#,
            green_yellow_orange(1.0, 10.0),
            GridPos::new(4, 6, 6, 1),
        ))
        .with_panel(stat_panel(
            ds,
            130,
            "NATS Config Warnings (24h)",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `nats configuration` [24h]))"#,
            green_yellow(1.0),
            GridPos::new(4, 6, 12, 1),
        ))
        .with_panel(stat_panel(
            ds,
            140,
            "Filestore Warnings (24h)",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"nats"` |= `Filestore` [24h]))"#,
            green_yellow(1.0),
            GridPos::new(4, 6, 18, 1),
        ))
        .with_panel(logs_panel(
            ds,
            150,
            "NATS Service Logs",
            r#"{container="opencloud-opencloud-1"} |= `"service":"nats"` | json | level=~`error|warn`"#,
            GridPos::new(8, 24, 0, 5),
        ))
        .with_row(RowBuilder::new("Activitylog Errors (Loki)").id(200).at(13))
        .with_panel(stat_panel(
            ds,
            210,
            "Activitylog Errors (Last 24h)",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"activitylog"` |= `error` [24h]))"#,
            green_yellow_red(1.0, 10.0),
            GridPos::new(4, 6, 0, 14),
        ))
        .with_panel(stat_panel(
            ds,
            220,
            "Event Processing Errors",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"activitylog"` |= `could not process event` [24h]))"#,
            green_red(1.0),
            GridPos::new(4, 6, 6, 14),
        ))
        .with_panel(stat_panel(
            ds,
            230,
            "Store Errors",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"activitylog"` |~ `error.*(store|activities)` [24h]))"#,
            green_red(1.0),
            GridPos::new(4, 6, 12, 14),
        ))
        .with_panel(stat_panel(
            ds,
            240,
            "Unknown Events",
            r#"sum(count_over_time({container="opencloud-opencloud-1"} |= `"service":"activitylog"` |= `event not registered` [24h]))"#,
            green_yellow(1.0),
            GridPos::new(4, 6, 18, 14),
        ))
        .with_panel(
            TimeseriesBuilder::new()
                .id(250)
                .title("Error Rate Over Time")
                .datasource(ds.loki.clone())
                .grid_pos(6, 24, 0, 18)
                .loki(
                    r#"sum by (level) (count_over_time({container="opencloud-opencloud-1"} |= `"service":"activitylog"` | json | level=~`error|warn` [$__interval]))"#,
                    "{{level}}",
                )
                .draw_style(GraphDrawStyle::Bars)
                .fill_opacity(50)
                .stacking(StackingConfig::normal())
                .legend(VizLegendOptions::list())
                .show_points(VisibilityMode::Never)
                .with_override(color_override("error", "red"))
                .with_override(color_override("warn", "yellow"))
                .build(),
        )
        .with_panel(logs_panel(
            ds,
            260,
            "All Activitylog Errors",
            r#"{container="opencloud-opencloud-1"} |= `"service":"activitylog"` | json | level=~`error|warn`"#,
            GridPos::new(8, 24, 0, 24),
        ))
        .build()
}
