// Numan Thabit 2025
//! Per-series field overrides.
//!
//! Regular-expression matchers are passed through untouched; Grafana compiles
//! and rejects them when the dashboard loads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatcherId {
    #[serde(rename = "byName")]
    ByName,
    #[serde(rename = "byRegexp")]
    ByRegexp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatcher {
    pub id: MatcherId,
    pub options: String,
}

/// One `{ id, value }` assignment such as `color` or `custom.width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicConfigValue {
    pub id: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOverride {
    pub matcher: FieldMatcher,
    pub properties: Vec<DynamicConfigValue>,
}

impl FieldOverride {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::matching(MatcherId::ByName, name.into())
    }

    pub fn by_regexp(pattern: impl Into<String>) -> Self {
        Self::matching(MatcherId::ByRegexp, pattern.into())
    }

    fn matching(id: MatcherId, options: String) -> Self {
        Self {
            matcher: FieldMatcher { id, options },
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(DynamicConfigValue {
            id: id.into(),
            value: value.into(),
        });
        self
    }

    pub fn fixed_color(self, color: &str) -> Self {
        self.property("color", json!({ "fixedColor": color, "mode": "fixed" }))
    }
}

/// Pin the series named exactly `name` to `color`.
pub fn color_override(name: &str, color: &str) -> FieldOverride {
    FieldOverride::by_name(name).fixed_color(color)
}

/// Pin every series whose name matches `pattern` to `color`.
pub fn regexp_color_override(pattern: &str, color: &str) -> FieldOverride {
    FieldOverride::by_regexp(pattern).fixed_color(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_override() {
        let o = color_override("Errors/s", "red");
        assert_eq!(o.matcher.id, MatcherId::ByName);
        assert_eq!(o.matcher.options, "Errors/s");
        assert_eq!(o.properties.len(), 1);
        assert_eq!(o.properties[0].id, "color");
        assert_eq!(
            o.properties[0].value,
            json!({ "fixedColor": "red", "mode": "fixed" })
        );
    }

    #[test]
    fn pattern_override() {
        let o = regexp_color_override("5..", "red");
        assert_eq!(o.matcher.id, MatcherId::ByRegexp);
        assert_eq!(o.matcher.options, "5..");
        assert_eq!(o.properties, color_override("x", "red").properties);
    }

    #[test]
    fn malformed_pattern_passes_through() {
        let o = regexp_color_override("4(0[5-9]|[1-9].", "yellow");
        assert_eq!(o.matcher.options, "4(0[5-9]|[1-9].");
    }

    #[test]
    fn identical_calls_are_independent() {
        let first = color_override("P50", "green");
        let mut second = color_override("P50", "green");
        assert_eq!(first, second);
        second.properties.push(DynamicConfigValue {
            id: "unit".into(),
            value: json!("s"),
        });
        assert_eq!(first.properties.len(), 1);
    }

    #[test]
    fn serialized_shape() {
        let value = serde_json::to_value(regexp_color_override("2..", "green")).unwrap();
        assert_eq!(
            value,
            json!({
                "matcher": { "id": "byRegexp", "options": "2.." },
                "properties": [{ "id": "color", "value": { "fixedColor": "green", "mode": "fixed" } }]
            })
        );
    }

    #[test]
    fn multi_property_override() {
        let o = FieldOverride::by_name("uri")
            .property("custom.width", 350)
            .property("displayName", "Path");
        let value = serde_json::to_value(o).unwrap();
        assert_eq!(
            value["properties"],
            json!([
                { "id": "custom.width", "value": 350 },
                { "id": "displayName", "value": "Path" }
            ])
        );
    }
}
