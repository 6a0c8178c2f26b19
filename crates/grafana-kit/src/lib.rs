// Numan Thabit 2025
#![forbid(unsafe_code)]
//! grafana-kit: typed Grafana dashboard model, builders and the small helpers
//! every dashboard leans on (threshold ramps, color overrides, per-panel ref ids).

pub mod dashboard;
pub mod error;
pub mod options;
pub mod overrides;
pub mod panel;
pub mod query;
pub mod refid;
pub mod schema;
pub mod thresholds;
pub mod variable;

pub use dashboard::{Dashboard, DashboardBuilder, DashboardPanel, RowBuilder, RowPanel};
pub use error::ThresholdError;
pub use overrides::{color_override, regexp_color_override, FieldOverride};
pub use panel::{
    BarGaugeBuilder, GaugeBuilder, HeatmapBuilder, LogsBuilder, Panel, PanelBuilder,
    PieChartBuilder, StatBuilder, TableBuilder, TimeseriesBuilder,
};
pub use query::{loki_instant_query, loki_query, prom_instant_query, prom_query, Target};
pub use refid::{RefId, RefIdAllocator};
pub use schema::{DataSourceRef, FieldColor, GridPos, Transformation};
pub use thresholds::{
    green_red, green_yellow, green_yellow_orange, green_yellow_orange_red, green_yellow_red,
    red_yellow_green, single_color, ThresholdStep, Thresholds, ThresholdsMode,
};
pub use variable::{VariableBuilder, VariableModel, VariableRefresh, VariableSort};
