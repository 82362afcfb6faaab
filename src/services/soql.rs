//! Socrata open-data queries (SoQL).

use anyhow::Result;
use serde_json::Value;

/// City of New Orleans 311 calls dataset.
pub const NOLA_311_ENDPOINT: &str = "https://data.nola.gov/resource/2jgv-pqrq.json";

/// A SoQL query, rendered as `$select`, `$where`, `$group`, `$order` and
/// `$limit` URL parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoqlQuery {
    select: String,
    filter: Option<String>,
    group: Option<String>,
    order: Option<String>,
    limit: Option<u32>,
}

impl SoqlQuery {
    pub fn select(select: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(clause.into());
        self
    }

    pub fn group_by(mut self, columns: impl Into<String>) -> Self {
        self.group = Some(columns.into());
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query parameters in a stable order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("$select", self.select.clone())];
        if let Some(filter) = &self.filter {
            params.push(("$where", filter.clone()));
        }
        if let Some(group) = &self.group {
            params.push(("$group", group.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("$order", order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("$limit", limit.to_string()));
        }
        params
    }
}

/// Abstraction over a Socrata dataset endpoint.
#[async_trait::async_trait]
pub trait OpenDataApi: Send + Sync {
    /// Runs `query` and returns the raw result rows.
    async fn query(&self, query: &SoqlQuery) -> Result<Vec<Value>>;
}

/// Reads a count column. Socrata returns aggregates as strings.
pub fn count_field(row: &Value, key: &str) -> u64 {
    match &row[key] {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

/// Reads a decimal column, string or number.
pub fn number_field(row: &Value, key: &str) -> Option<f64> {
    match &row[key] {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Reads a text column, treating numbers as text.
pub fn text_field(row: &Value, key: &str) -> Option<String> {
    match &row[key] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_order_and_optional_parts() {
        let query = SoqlQuery::select("request_status,count(*) as total")
            .filter("request_reason='Pothole'")
            .group_by("request_status")
            .order_by("total DESC")
            .limit(100);

        assert_eq!(
            query.params(),
            vec![
                ("$select", "request_status,count(*) as total".to_string()),
                ("$where", "request_reason='Pothole'".to_string()),
                ("$group", "request_status".to_string()),
                ("$order", "total DESC".to_string()),
                ("$limit", "100".to_string()),
            ]
        );

        assert_eq!(SoqlQuery::select("count(*)").params().len(), 1);
    }

    #[test]
    fn test_field_readers() {
        let row = json!({ "total": "42", "avg_days": "3.5", "district": 4, "empty": "" });

        assert_eq!(count_field(&row, "total"), 42);
        assert_eq!(count_field(&row, "missing"), 0);
        assert_eq!(number_field(&row, "avg_days"), Some(3.5));
        assert_eq!(text_field(&row, "district").as_deref(), Some("4"));
        assert_eq!(text_field(&row, "empty"), None);
    }
}
