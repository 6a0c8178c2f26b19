// Numan Thabit 2025
//! Prometheus and Loki query targets.

use serde::{Deserialize, Serialize};

use crate::refid::{RefId, RefIdAllocator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    Prometheus,
    Loki,
}

impl QueryLanguage {
    /// Datasource `type` that can run this language.
    pub fn datasource_kind(self) -> &'static str {
        match self {
            QueryLanguage::Prometheus => "prometheus",
            QueryLanguage::Loki => "loki",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(skip)]
    pub language: Option<QueryLanguage>,
    pub expr: String,
    pub ref_id: RefId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Target {
    fn new(
        language: QueryLanguage,
        refs: &mut RefIdAllocator,
        expr: &str,
        legend: Option<&str>,
        instant: bool,
    ) -> Self {
        Self {
            language: Some(language),
            expr: expr.to_string(),
            ref_id: refs.next(),
            legend_format: legend.filter(|l| !l.is_empty()).map(str::to_string),
            instant: instant.then_some(true),
            format: None,
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

pub fn prom_query(refs: &mut RefIdAllocator, expr: &str, legend: Option<&str>) -> Target {
    Target::new(QueryLanguage::Prometheus, refs, expr, legend, false)
}

pub fn prom_instant_query(refs: &mut RefIdAllocator, expr: &str, legend: Option<&str>) -> Target {
    Target::new(QueryLanguage::Prometheus, refs, expr, legend, true)
}

pub fn loki_query(refs: &mut RefIdAllocator, expr: &str, legend: Option<&str>) -> Target {
    Target::new(QueryLanguage::Loki, refs, expr, legend, false)
}

pub fn loki_instant_query(refs: &mut RefIdAllocator, expr: &str, legend: Option<&str>) -> Target {
    Target::new(QueryLanguage::Loki, refs, expr, legend, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamps_successive_ref_ids() {
        let mut refs = RefIdAllocator::new();
        let a = prom_query(&mut refs, "up", Some("Up"));
        let b = loki_query(&mut refs, "{service=\"opencloud\"}", None);
        assert_eq!(a.ref_id, "A");
        assert_eq!(b.ref_id, "B");
        assert_eq!(a.language, Some(QueryLanguage::Prometheus));
        assert_eq!(b.language, Some(QueryLanguage::Loki));
        assert_eq!(QueryLanguage::Loki.datasource_kind(), "loki");
    }

    #[test]
    fn empty_legend_is_dropped() {
        let mut refs = RefIdAllocator::new();
        let t = loki_instant_query(&mut refs, "topk(10, x)", Some(""));
        assert_eq!(t.legend_format, None);
        assert_eq!(t.instant, Some(true));
    }

    #[test]
    fn serialized_shape() {
        let mut refs = RefIdAllocator::new();
        let t = prom_query(&mut refs, "sum(rate(x[5m])) by (le)", Some("{{le}}")).format("heatmap");
        assert_eq!(
            serde_json::to_value(t).unwrap(),
            json!({
                "expr": "sum(rate(x[5m])) by (le)",
                "refId": "A",
                "legendFormat": "{{le}}",
                "format": "heatmap"
            })
        );
    }
}
