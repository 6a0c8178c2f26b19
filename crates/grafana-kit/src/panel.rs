// Numan Thabit 2025
//! Visualization panels and their builders.
//!
//! `PanelBuilder<K>` is shared by every visualization; `K` is the options
//! block of the concrete kind. Each builder owns a fresh [`RefIdAllocator`], so
//! the targets of one panel are always tagged `A`, `B`, ... regardless of what
//! was built before it.

use serde::Serialize;

use crate::{
    options::*,
    overrides::FieldOverride,
    query::{self, Target},
    refid::RefIdAllocator,
    schema::{
        AxisPlacement, DataSourceRef, FieldColor, FieldConfigSource, GraphDrawStyle, GridPos,
        StackingConfig, Transformation, VisibilityMode,
    },
    thresholds::Thresholds,
};

/// Options block of one visualization kind.
pub trait PanelKind: Default {
    /// Value of the panel's `type` field.
    const TYPE: &'static str;

    fn into_options(self) -> PanelOptions;
}

/// Kinds that reduce a series to single values before display.
pub trait ReducesData {
    fn reduce_options_mut(&mut self) -> &mut Option<ReduceDataOptions>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PanelOptions {
    Stat(StatOptions),
    Gauge(GaugeOptions),
    Timeseries(TimeseriesOptions),
    PieChart(PieChartOptions),
    Table(TableOptions),
    Logs(LogsOptions),
    Heatmap(HeatmapOptions),
    BarGauge(BarGaugeOptions),
}

macro_rules! panel_kind {
    ($options:ty, $variant:ident, $type_name:literal) => {
        impl PanelKind for $options {
            const TYPE: &'static str = $type_name;

            fn into_options(self) -> PanelOptions {
                PanelOptions::$variant(self)
            }
        }
    };
}

panel_kind!(StatOptions, Stat, "stat");
panel_kind!(GaugeOptions, Gauge, "gauge");
panel_kind!(TimeseriesOptions, Timeseries, "timeseries");
panel_kind!(PieChartOptions, PieChart, "piechart");
panel_kind!(TableOptions, Table, "table");
panel_kind!(LogsOptions, Logs, "logs");
panel_kind!(HeatmapOptions, Heatmap, "heatmap");
panel_kind!(BarGaugeOptions, BarGauge, "bargauge");

macro_rules! reduces_data {
    ($($options:ty),*) => {
        $(impl ReducesData for $options {
            fn reduce_options_mut(&mut self) -> &mut Option<ReduceDataOptions> {
                &mut self.reduce_options
            }
        })*
    };
}

reduces_data!(StatOptions, GaugeOptions, PieChartOptions, BarGaugeOptions);

pub type StatBuilder = PanelBuilder<StatOptions>;
pub type GaugeBuilder = PanelBuilder<GaugeOptions>;
pub type TimeseriesBuilder = PanelBuilder<TimeseriesOptions>;
pub type PieChartBuilder = PanelBuilder<PieChartOptions>;
pub type TableBuilder = PanelBuilder<TableOptions>;
pub type LogsBuilder = PanelBuilder<LogsOptions>;
pub type HeatmapBuilder = PanelBuilder<HeatmapOptions>;
pub type BarGaugeBuilder = PanelBuilder<BarGaugeOptions>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_pos: Option<GridPos>,
    pub targets: Vec<Target>,
    pub field_config: FieldConfigSource,
    pub options: PanelOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<Transformation>,
}

#[derive(Debug)]
pub struct PanelBuilder<K> {
    panel: Panel,
    options: K,
    refs: RefIdAllocator,
}

impl<K: PanelKind> Default for PanelBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PanelKind> PanelBuilder<K> {
    pub fn new() -> Self {
        Self {
            panel: Panel {
                kind: K::TYPE,
                id: None,
                title: String::new(),
                description: None,
                datasource: None,
                grid_pos: None,
                targets: Vec::new(),
                field_config: FieldConfigSource::default(),
                options: PanelOptions::Table(TableOptions::default()),
                transformations: Vec::new(),
            },
            options: K::default(),
            refs: RefIdAllocator::new(),
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.panel.id = Some(id);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.panel.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.panel.description = Some(description.into());
        self
    }

    pub fn datasource(mut self, datasource: DataSourceRef) -> Self {
        self.panel.datasource = Some(datasource);
        self
    }

    pub fn grid_pos(mut self, h: u32, w: u32, x: u32, y: u32) -> Self {
        self.panel.grid_pos = Some(GridPos::new(h, w, x, y));
        self
    }

    /// Attach a target built against this panel's reference-id allocator.
    pub fn with_query(mut self, make: impl FnOnce(&mut RefIdAllocator) -> Target) -> Self {
        let target = make(&mut self.refs);
        self.panel.targets.push(target);
        self
    }

    pub fn prom(self, expr: &str, legend: &str) -> Self {
        self.with_query(|refs| query::prom_query(refs, expr, Some(legend)))
    }

    pub fn prom_instant(self, expr: &str, legend: &str) -> Self {
        self.with_query(|refs| query::prom_instant_query(refs, expr, Some(legend)))
    }

    pub fn loki(self, expr: &str, legend: &str) -> Self {
        self.with_query(|refs| query::loki_query(refs, expr, Some(legend)))
    }

    pub fn loki_instant(self, expr: &str, legend: &str) -> Self {
        self.with_query(|refs| query::loki_instant_query(refs, expr, Some(legend)))
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.panel.field_config.defaults.unit = Some(unit.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.panel.field_config.defaults.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.panel.field_config.defaults.max = Some(max);
        self
    }

    pub fn color_scheme(mut self, color: FieldColor) -> Self {
        self.panel.field_config.defaults.color = Some(color);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.panel.field_config.defaults.thresholds = Some(thresholds);
        self
    }

    pub fn with_override(mut self, field_override: FieldOverride) -> Self {
        self.panel.field_config.overrides.push(field_override);
        self
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.panel.transformations.push(transformation);
        self
    }

    pub fn build(self) -> Panel {
        let mut panel = self.panel;
        panel.options = self.options.into_options();
        panel
    }
}

impl<K: PanelKind + ReducesData> PanelBuilder<K> {
    pub fn reduce_options(mut self, reduce: ReduceDataOptions) -> Self {
        *self.options.reduce_options_mut() = Some(reduce);
        self
    }
}

impl PanelBuilder<StatOptions> {
    pub fn color_mode(mut self, mode: BigValueColorMode) -> Self {
        self.options.color_mode = Some(mode);
        self
    }

    pub fn graph_mode(mut self, mode: BigValueGraphMode) -> Self {
        self.options.graph_mode = Some(mode);
        self
    }

    pub fn justify_mode(mut self, mode: BigValueJustifyMode) -> Self {
        self.options.justify_mode = Some(mode);
        self
    }

    pub fn text_mode(mut self, mode: BigValueTextMode) -> Self {
        self.options.text_mode = Some(mode);
        self
    }

    pub fn orientation(mut self, orientation: VizOrientation) -> Self {
        self.options.orientation = Some(orientation);
        self
    }

    pub fn show_percent_change(mut self, show: bool) -> Self {
        self.options.show_percent_change = Some(show);
        self
    }

    pub fn wide_layout(mut self, wide: bool) -> Self {
        self.options.wide_layout = Some(wide);
        self
    }
}

impl PanelBuilder<GaugeOptions> {
    pub fn show_threshold_labels(mut self, show: bool) -> Self {
        self.options.show_threshold_labels = Some(show);
        self
    }

    pub fn show_threshold_markers(mut self, show: bool) -> Self {
        self.options.show_threshold_markers = Some(show);
        self
    }
}

impl PanelBuilder<TimeseriesOptions> {
    pub fn draw_style(mut self, style: GraphDrawStyle) -> Self {
        self.panel.field_config.defaults.custom.draw_style = Some(style);
        self
    }

    pub fn line_width(mut self, width: u32) -> Self {
        self.panel.field_config.defaults.custom.line_width = Some(width);
        self
    }

    pub fn fill_opacity(mut self, opacity: u32) -> Self {
        self.panel.field_config.defaults.custom.fill_opacity = Some(opacity);
        self
    }

    pub fn point_size(mut self, size: u32) -> Self {
        self.panel.field_config.defaults.custom.point_size = Some(size);
        self
    }

    pub fn show_points(mut self, mode: VisibilityMode) -> Self {
        self.panel.field_config.defaults.custom.show_points = Some(mode);
        self
    }

    pub fn stacking(mut self, stacking: StackingConfig) -> Self {
        self.panel.field_config.defaults.custom.stacking = Some(stacking);
        self
    }

    pub fn legend(mut self, legend: VizLegendOptions) -> Self {
        self.options.legend = Some(legend);
        self
    }

    pub fn tooltip(mut self, tooltip: VizTooltipOptions) -> Self {
        self.options.tooltip = Some(tooltip);
        self
    }
}

impl PanelBuilder<PieChartOptions> {
    pub fn pie_type(mut self, pie_type: PieChartType) -> Self {
        self.options.pie_type = Some(pie_type);
        self
    }

    pub fn legend(mut self, legend: PieChartLegendOptions) -> Self {
        self.options.legend = Some(legend);
        self
    }
}

impl PanelBuilder<LogsOptions> {
    pub fn dedup_strategy(mut self, strategy: LogsDedupStrategy) -> Self {
        self.options.dedup_strategy = Some(strategy);
        self
    }

    pub fn enable_log_details(mut self, enable: bool) -> Self {
        self.options.enable_log_details = Some(enable);
        self
    }

    pub fn prettify_log_message(mut self, prettify: bool) -> Self {
        self.options.prettify_log_message = Some(prettify);
        self
    }

    pub fn show_common_labels(mut self, show: bool) -> Self {
        self.options.show_common_labels = Some(show);
        self
    }

    pub fn show_labels(mut self, show: bool) -> Self {
        self.options.show_labels = Some(show);
        self
    }

    pub fn show_time(mut self, show: bool) -> Self {
        self.options.show_time = Some(show);
        self
    }

    pub fn sort_order(mut self, order: LogsSortOrder) -> Self {
        self.options.sort_order = Some(order);
        self
    }

    pub fn wrap_log_message(mut self, wrap: bool) -> Self {
        self.options.wrap_log_message = Some(wrap);
        self
    }
}

impl PanelBuilder<HeatmapOptions> {
    /// Expect pre-bucketed data instead of computing buckets in the browser.
    pub fn calculate(mut self, calculate: bool) -> Self {
        self.options.calculate = Some(calculate);
        self
    }

    pub fn cell_gap(mut self, gap: u32) -> Self {
        self.options.cell_gap = Some(gap);
        self
    }

    pub fn color(mut self, color: HeatmapColorOptions) -> Self {
        self.options.color = Some(color);
        self
    }

    pub fn filter_values(mut self, range: FilterValueRange) -> Self {
        self.options.filter_values = Some(range);
        self
    }

    pub fn rows_layout(mut self, layout: impl Into<String>) -> Self {
        self.options.rows_frame = Some(RowsHeatmapOptions {
            layout: layout.into(),
        });
        self
    }

    pub fn show_legend(mut self) -> Self {
        self.options.legend = Some(HeatmapLegend { show: true });
        self
    }

    pub fn tooltip_mode(mut self, mode: TooltipDisplayMode) -> Self {
        let y_histogram = self.options.tooltip.take().and_then(|t| t.y_histogram);
        self.options.tooltip = Some(HeatmapTooltip { mode, y_histogram });
        self
    }

    pub fn show_y_histogram(mut self) -> Self {
        let tooltip = self.options.tooltip.get_or_insert(HeatmapTooltip {
            mode: TooltipDisplayMode::Single,
            y_histogram: None,
        });
        tooltip.y_histogram = Some(true);
        self
    }

    pub fn y_axis(mut self, unit: &str, placement: AxisPlacement, reverse: bool) -> Self {
        self.options.y_axis = Some(YAxisConfig {
            unit: Some(unit.to_string()),
            axis_placement: Some(placement),
            reverse: Some(reverse),
        });
        self
    }

    pub fn exemplars_color(mut self, color: impl Into<String>) -> Self {
        self.options.exemplars = Some(ExemplarConfig {
            color: color.into(),
        });
        self
    }
}

impl PanelBuilder<BarGaugeOptions> {
    pub fn orientation(mut self, orientation: VizOrientation) -> Self {
        self.options.orientation = Some(orientation);
        self
    }

    pub fn display_mode(mut self, mode: BarGaugeDisplayMode) -> Self {
        self.options.display_mode = Some(mode);
        self
    }

    pub fn show_unfilled(mut self, show: bool) -> Self {
        self.options.show_unfilled = Some(show);
        self
    }
}
