// Numan Thabit 2025
use serde::Serialize;

use crate::{
    panel::Panel,
    schema::{GridPos, TimeRange},
    variable::VariableModel,
};

const SCHEMA_VERSION: u32 = 39;

/// Collapsible section header. Collapsed rows carry their panels inside them;
/// open rows are followed by their panels at the top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPanel {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: u32,
    pub title: String,
    pub grid_pos: GridPos,
    pub collapsed: bool,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardPanel {
    Panel(Panel),
    Row(RowPanel),
}

#[derive(Debug, Clone)]
pub struct RowBuilder {
    row: RowPanel,
}

impl RowBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            row: RowPanel {
                kind: "row",
                id: 0,
                title: title.into(),
                grid_pos: GridPos::row(0),
                collapsed: false,
                panels: Vec::new(),
            },
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.row.id = id;
        self
    }

    /// Place the row header at grid line `y`.
    pub fn at(mut self, y: u32) -> Self {
        self.row.grid_pos = GridPos::row(y);
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.row.collapsed = collapsed;
        self
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.row.panels.push(panel);
        self
    }

    pub fn build(self) -> RowPanel {
        self.row
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Templating {
    pub list: Vec<VariableModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub timezone: String,
    pub editable: bool,
    pub graph_tooltip: u8,
    pub time: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    pub fiscal_year_start_month: u8,
    pub schema_version: u32,
    pub templating: Templating,
    pub panels: Vec<DashboardPanel>,
}

impl Dashboard {
    /// Every visualization panel, including those nested in collapsed rows.
    pub fn all_panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter().flat_map(|entry| match entry {
            DashboardPanel::Panel(panel) => std::slice::from_ref(panel).iter(),
            DashboardPanel::Row(row) => row.panels.iter(),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowPanel> {
        self.panels.iter().filter_map(|entry| match entry {
            DashboardPanel::Row(row) => Some(row),
            DashboardPanel::Panel(_) => None,
        })
    }

    pub fn variables(&self) -> &[VariableModel] {
        &self.templating.list
    }
}

#[derive(Debug, Clone)]
pub struct DashboardBuilder {
    dashboard: Dashboard,
}

impl DashboardBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            dashboard: Dashboard {
                uid: None,
                title: title.into(),
                description: None,
                tags: Vec::new(),
                timezone: "browser".to_string(),
                editable: true,
                graph_tooltip: 0,
                time: TimeRange::new("now-6h", "now"),
                refresh: None,
                fiscal_year_start_month: 0,
                schema_version: SCHEMA_VERSION,
                templating: Templating { list: Vec::new() },
                panels: Vec::new(),
            },
        }
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.dashboard.uid = Some(uid.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.dashboard.description = Some(description.into());
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.dashboard.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.dashboard.timezone = timezone.into();
        self
    }

    pub fn refresh(mut self, refresh: impl Into<String>) -> Self {
        self.dashboard.refresh = Some(refresh.into());
        self
    }

    pub fn time(mut self, from: &str, to: &str) -> Self {
        self.dashboard.time = TimeRange::new(from, to);
        self
    }

    pub fn with_variable(mut self, variable: VariableModel) -> Self {
        self.dashboard.templating.list.push(variable);
        self
    }

    pub fn with_row(mut self, row: RowBuilder) -> Self {
        self.dashboard.panels.push(DashboardPanel::Row(row.build()));
        self
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.dashboard.panels.push(DashboardPanel::Panel(panel));
        self
    }

    pub fn build(self) -> Dashboard {
        self.dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{LogsBuilder, StatBuilder, TimeseriesBuilder};
    use serde_json::json;

    fn sample() -> Dashboard {
        DashboardBuilder::new("Sample")
            .uid("sample")
            .tags(&["opencloud"])
            .refresh("auto")
            .time("now-1h", "now")
            .with_row(RowBuilder::new("Overview").id(100).at(0))
            .with_panel(StatBuilder::new().id(110).title("Total").build())
            .with_row(
                RowBuilder::new("Details")
                    .id(200)
                    .at(5)
                    .collapsed(true)
                    .with_panel(TimeseriesBuilder::new().id(210).title("Series").build())
                    .with_panel(LogsBuilder::new().id(220).title("Logs").build()),
            )
            .build()
    }

    #[test]
    fn collapsed_rows_nest_their_panels() {
        let value = serde_json::to_value(sample()).unwrap();
        let panels = value["panels"].as_array().unwrap();
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0]["type"], "row");
        assert_eq!(panels[0]["panels"], json!([]));
        assert_eq!(panels[1]["type"], "stat");
        assert_eq!(panels[2]["collapsed"], true);
        assert_eq!(panels[2]["gridPos"], json!({ "h": 1, "w": 24, "x": 0, "y": 5 }));
        assert_eq!(panels[2]["panels"][1]["type"], "logs");
    }

    #[test]
    fn all_panels_flattens_rows() {
        let dashboard = sample();
        let ids: Vec<Option<u32>> = dashboard.all_panels().map(|p| p.id).collect();
        assert_eq!(ids, [Some(110), Some(210), Some(220)]);
        assert_eq!(dashboard.rows().count(), 2);
    }

    #[test]
    fn top_level_document_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["uid"], "sample");
        assert_eq!(value["timezone"], "browser");
        assert_eq!(value["refresh"], "auto");
        assert_eq!(value["time"], json!({ "from": "now-1h", "to": "now" }));
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["templating"], json!({ "list": [] }));
        assert!(value.get("description").is_none());
    }
}
