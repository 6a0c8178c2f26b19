// Numan Thabit 2025
//! Per-visualization `options` blocks.

use serde::{Deserialize, Serialize};

use crate::schema::AxisPlacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BigValueColorMode {
    Value,
    Background,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BigValueGraphMode {
    None,
    Line,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BigValueJustifyMode {
    Auto,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigValueTextMode {
    Auto,
    Value,
    ValueAndName,
    Name,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VizOrientation {
    Auto,
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendDisplayMode {
    List,
    Table,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPlacement {
    Bottom,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipDisplayMode {
    Single,
    Multi,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogsDedupStrategy {
    None,
    Exact,
    Numbers,
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogsSortOrder {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieChartType {
    Pie,
    Donut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieChartLegendValues {
    Value,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarGaugeDisplayMode {
    Basic,
    Lcd,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapColorMode {
    Opacity,
    Scheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapColorScale {
    Linear,
    Exponential,
}

/// Which rows feed a single-value panel and how they are reduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceDataOptions {
    pub calcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<bool>,
}

impl ReduceDataOptions {
    pub fn calcs(calcs: &[&str]) -> Self {
        Self {
            calcs: calcs.iter().map(|c| c.to_string()).collect(),
            fields: None,
            values: None,
        }
    }

    /// Reduce every numeric field to one value each (`fields: ""`, `values: false`).
    pub fn all_fields(mut self) -> Self {
        self.fields = Some(String::new());
        self.values = Some(false);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VizLegendOptions {
    pub display_mode: LegendDisplayMode,
    pub placement: LegendPlacement,
    pub show_legend: bool,
    pub calcs: Vec<String>,
}

impl VizLegendOptions {
    pub fn new(display_mode: LegendDisplayMode, placement: LegendPlacement) -> Self {
        Self {
            display_mode,
            placement,
            show_legend: true,
            calcs: Vec::new(),
        }
    }

    pub fn list() -> Self {
        Self::new(LegendDisplayMode::List, LegendPlacement::Bottom)
    }

    pub fn table_right() -> Self {
        Self::new(LegendDisplayMode::Table, LegendPlacement::Right)
    }

    pub fn calcs(mut self, calcs: &[&str]) -> Self {
        self.calcs = calcs.iter().map(|c| c.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChartLegendOptions {
    pub display_mode: LegendDisplayMode,
    pub placement: LegendPlacement,
    pub show_legend: bool,
    pub values: Vec<PieChartLegendValues>,
    pub calcs: Vec<String>,
}

impl PieChartLegendOptions {
    pub fn new(display_mode: LegendDisplayMode, placement: LegendPlacement) -> Self {
        Self {
            display_mode,
            placement,
            show_legend: true,
            values: Vec::new(),
            calcs: Vec::new(),
        }
    }

    pub fn values(mut self, values: &[PieChartLegendValues]) -> Self {
        self.values = values.to_vec();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VizTooltipOptions {
    pub mode: TooltipDisplayMode,
    pub sort: SortOrder,
}

impl VizTooltipOptions {
    /// Shared tooltip listing every series, largest first.
    pub fn multi_desc() -> Self {
        Self {
            mode: TooltipDisplayMode::Multi,
            sort: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_options: Option<ReduceDataOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<BigValueColorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_mode: Option<BigValueGraphMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify_mode: Option<BigValueJustifyMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_mode: Option<BigValueTextMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<VizOrientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_percent_change: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wide_layout: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_options: Option<ReduceDataOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_threshold_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_threshold_markers: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<VizLegendOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<VizTooltipOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pie_type: Option<PieChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<PieChartLegendOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_options: Option<ReduceDataOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup_strategy: Option<LogsDedupStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_log_details: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prettify_log_message: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_common_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<LogsSortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_log_message: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarGaugeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_options: Option<ReduceDataOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<VizOrientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<BarGaugeDisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_unfilled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapColorOptions {
    pub mode: HeatmapColorMode,
    pub scheme: String,
    pub fill: String,
    pub scale: HeatmapColorScale,
    pub exponent: f64,
    pub steps: u32,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsHeatmapOptions {
    pub layout: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapLegend {
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapTooltip {
    pub mode: TooltipDisplayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_histogram: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxisConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_placement: Option<AxisPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemplarConfig {
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_gap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HeatmapColorOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_values: Option<FilterValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_frame: Option<RowsHeatmapOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<HeatmapLegend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<HeatmapTooltip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<YAxisConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemplars: Option<ExemplarConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enum_spellings() {
        assert_eq!(
            serde_json::to_value(BigValueTextMode::ValueAndName).unwrap(),
            json!("value_and_name")
        );
        assert_eq!(serde_json::to_value(SortOrder::Descending).unwrap(), json!("desc"));
        assert_eq!(
            serde_json::to_value(LogsSortOrder::Descending).unwrap(),
            json!("Descending")
        );
        assert_eq!(
            serde_json::to_value(BarGaugeDisplayMode::Gradient).unwrap(),
            json!("gradient")
        );
    }

    #[test]
    fn reduce_options_shapes() {
        assert_eq!(
            serde_json::to_value(ReduceDataOptions::calcs(&["lastNotNull"])).unwrap(),
            json!({ "calcs": ["lastNotNull"] })
        );
        assert_eq!(
            serde_json::to_value(ReduceDataOptions::calcs(&["sum"]).all_fields()).unwrap(),
            json!({ "calcs": ["sum"], "fields": "", "values": false })
        );
    }

    #[test]
    fn legend_defaults_to_visible() {
        let legend = VizLegendOptions::table_right().calcs(&["sum"]);
        assert_eq!(
            serde_json::to_value(legend).unwrap(),
            json!({ "displayMode": "table", "placement": "right", "showLegend": true, "calcs": ["sum"] })
        );
    }

    #[test]
    fn table_options_serialize_empty() {
        assert_eq!(serde_json::to_value(TableOptions::default()).unwrap(), json!({}));
    }
}
