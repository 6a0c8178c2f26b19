// Numan Thabit 2025
//! Shared pieces of the dashboard JSON model.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{overrides::FieldOverride, thresholds::Thresholds};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: String,
}

impl DataSourceRef {
    pub fn new(kind: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uid: uid.into(),
        }
    }

    pub fn prometheus(uid: impl Into<String>) -> Self {
        Self::new("prometheus", uid)
    }

    pub fn loki(uid: impl Into<String>) -> Self {
        Self::new("loki", uid)
    }
}

/// Panel placement on the 24-column dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub h: u32,
    pub w: u32,
    pub x: u32,
    pub y: u32,
}

pub const GRID_COLUMNS: u32 = 24;

impl GridPos {
    pub const fn new(h: u32, w: u32, x: u32, y: u32) -> Self {
        Self { h, w, x, y }
    }

    /// Full-width, one-unit-high slot used by rows.
    pub const fn row(y: u32) -> Self {
        Self::new(1, GRID_COLUMNS, 0, y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

impl TimeRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Whole numbers go out as JSON integers so `10.0` renders as `10`.
pub(crate) fn serialize_number<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub(crate) fn serialize_opt_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_number(v, serializer),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldColorModeId {
    #[serde(rename = "thresholds")]
    Thresholds,
    #[serde(rename = "fixed")]
    Fixed,
    #[serde(rename = "palette-classic")]
    PaletteClassic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldColor {
    pub mode: FieldColorModeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_color: Option<String>,
}

impl FieldColor {
    pub fn thresholds() -> Self {
        Self {
            mode: FieldColorModeId::Thresholds,
            fixed_color: None,
        }
    }

    pub fn fixed(color: impl Into<String>) -> Self {
        Self {
            mode: FieldColorModeId::Fixed,
            fixed_color: Some(color.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDrawStyle {
    Line,
    Bars,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    Auto,
    Never,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingMode {
    None,
    Normal,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackingConfig {
    pub mode: StackingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl StackingConfig {
    pub fn normal() -> Self {
        Self {
            mode: StackingMode::Normal,
            group: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPlacement {
    Auto,
    Left,
    Right,
    Top,
    Bottom,
    Hidden,
}

/// Graph styling carried in `fieldConfig.defaults.custom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_style: Option<GraphDrawStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_points: Option<VisibilityMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacking: Option<StackingConfig>,
}

impl GraphFieldConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "GraphFieldConfig::is_empty")]
    pub custom: GraphFieldConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfigSource {
    pub defaults: FieldConfig,
    pub overrides: Vec<FieldOverride>,
}

/// Post-query data transformation (`sortBy`, `renameByRegex`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub id: String,
    pub options: Value,
}

impl Transformation {
    pub fn new(id: impl Into<String>, options: Value) -> Self {
        Self {
            id: id.into(),
            options,
        }
    }

    /// Sort table rows by `field`, largest first.
    pub fn sort_by_desc(field: &str) -> Self {
        Self::new(
            "sortBy",
            serde_json::json!({ "fields": {}, "sort": [{ "desc": true, "field": field }] }),
        )
    }

    pub fn rename_by_regex(regex: &str, rename_pattern: &str) -> Self {
        Self::new(
            "renameByRegex",
            serde_json::json!({ "regex": regex, "renamePattern": rename_pattern }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let cfg = FieldConfig {
            min: Some(0.0),
            max: Some(0.5),
            ..FieldConfig::default()
        };
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value, json!({ "min": 0, "max": 0.5 }));
    }

    #[test]
    fn empty_custom_block_is_omitted() {
        let value = serde_json::to_value(FieldConfig::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn fixed_color_shape() {
        let value = serde_json::to_value(FieldColor::fixed("red")).unwrap();
        assert_eq!(value, json!({ "mode": "fixed", "fixedColor": "red" }));
    }

    #[test]
    fn stacking_group_is_optional() {
        let plain = serde_json::to_value(StackingConfig::normal()).unwrap();
        assert_eq!(plain, json!({ "mode": "normal" }));
        let grouped = serde_json::to_value(StackingConfig::normal().group("A")).unwrap();
        assert_eq!(grouped, json!({ "mode": "normal", "group": "A" }));
    }

    #[test]
    fn sort_by_transformation_shape() {
        let value = serde_json::to_value(Transformation::sort_by_desc("Value")).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "sortBy",
                "options": { "fields": {}, "sort": [{ "desc": true, "field": "Value" }] }
            })
        );
    }
}
