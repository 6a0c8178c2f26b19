// Numan Thabit 2025
//! Dashboard template variables (`$service`, `$search`, ...).

use serde::{Serialize, Serializer};

use crate::schema::DataSourceRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Custom,
    Textbox,
    Query,
}

/// When a query variable re-runs its query. Serialized as Grafana's integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRefresh {
    Never = 0,
    OnDashboardLoad = 1,
    OnTimeRangeChanged = 2,
}

impl Serialize for VariableRefresh {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSort {
    Disabled = 0,
    AlphabeticalAsc = 1,
    AlphabeticalDesc = 2,
    NumericalAsc = 3,
    NumericalDesc = 4,
}

impl Serialize for VariableSort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableModel {
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<VariableRefresh>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<VariableOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<VariableSort>,
}

#[derive(Debug, Clone)]
pub struct VariableBuilder {
    model: VariableModel,
}

impl VariableBuilder {
    fn new(kind: VariableKind, name: &str) -> Self {
        Self {
            model: VariableModel {
                kind,
                name: name.to_string(),
                label: None,
                datasource: None,
                query: None,
                refresh: None,
                multi: None,
                include_all: None,
                all_value: None,
                current: None,
                sort: None,
            },
        }
    }

    /// Fixed list of values, comma separated, `text : value` pairs allowed.
    pub fn custom(name: &str) -> Self {
        Self::new(VariableKind::Custom, name)
    }

    /// Free-text input.
    pub fn textbox(name: &str) -> Self {
        Self::new(VariableKind::Textbox, name)
    }

    /// Values fetched from a datasource query.
    pub fn query(name: &str) -> Self {
        Self::new(VariableKind::Query, name)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.model.label = Some(label.into());
        self
    }

    pub fn datasource(mut self, datasource: DataSourceRef) -> Self {
        self.model.datasource = Some(datasource);
        self
    }

    pub fn definition(mut self, query: impl Into<String>) -> Self {
        self.model.query = Some(query.into());
        self
    }

    /// Custom-variable spelling of [`VariableBuilder::definition`].
    pub fn values(self, values: impl Into<String>) -> Self {
        self.definition(values)
    }

    pub fn refresh(mut self, refresh: VariableRefresh) -> Self {
        self.model.refresh = Some(refresh);
        self
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.model.multi = Some(multi);
        self
    }

    pub fn include_all(mut self, include_all: bool) -> Self {
        self.model.include_all = Some(include_all);
        self
    }

    pub fn all_value(mut self, all_value: impl Into<String>) -> Self {
        self.model.all_value = Some(all_value.into());
        self
    }

    pub fn current(mut self, text: &str, value: &str) -> Self {
        let selected = (self.model.kind == VariableKind::Textbox).then_some(false);
        self.model.current = Some(VariableOption {
            selected,
            text: text.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn sort(mut self, sort: VariableSort) -> Self {
        self.model.sort = Some(sort);
        self
    }

    pub fn build(self) -> VariableModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_variable_shape() {
        let var = VariableBuilder::custom("status_filter")
            .label("Status")
            .values("All : .+,2xx : 2..")
            .multi(false)
            .include_all(false)
            .current("All", ".+")
            .build();
        assert_eq!(
            serde_json::to_value(var).unwrap(),
            json!({
                "type": "custom",
                "name": "status_filter",
                "label": "Status",
                "query": "All : .+,2xx : 2..",
                "multi": false,
                "includeAll": false,
                "current": { "text": "All", "value": ".+" }
            })
        );
    }

    #[test]
    fn textbox_current_is_unselected() {
        let var = VariableBuilder::textbox("path").current(".*", ".*").build();
        let value = serde_json::to_value(var).unwrap();
        assert_eq!(value["current"], json!({ "selected": false, "text": ".*", "value": ".*" }));
    }

    #[test]
    fn query_variable_uses_integer_codes() {
        let var = VariableBuilder::query("service")
            .datasource(DataSourceRef::loki("loki"))
            .definition("label_values(service)")
            .refresh(VariableRefresh::OnTimeRangeChanged)
            .sort(VariableSort::AlphabeticalAsc)
            .build();
        let value = serde_json::to_value(var).unwrap();
        assert_eq!(value["refresh"], 2);
        assert_eq!(value["sort"], 1);
        assert_eq!(value["datasource"]["type"], "loki");
    }
}
