use std::fmt;

use chrono::NaiveDate;

pub const MEALS_NAMESPACE: &str = "meals";
pub const WEEKLY_MEMOS_NAMESPACE: &str = "weekly_memos";

/// Composite cache key: a collection namespace plus the query parameters.
///
/// Invalidation works on whole namespaces, so two keys share fate exactly
/// when their namespaces match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    namespace: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(namespace: &'static str, params: Vec<String>) -> Self {
        Self { namespace, params }
    }

    pub fn meals_in_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(MEALS_NAMESPACE, vec![start.to_string(), end.to_string()])
    }

    pub fn weekly_memos(week_starts: &[NaiveDate]) -> Self {
        Self::new(
            WEEKLY_MEMOS_NAMESPACE,
            week_starts.iter().map(NaiveDate::to_string).collect(),
        )
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_key_identity() {
        let a = QueryKey::meals_in_range(d("2025-01-06"), d("2025-01-19"));
        let b = QueryKey::meals_in_range(d("2025-01-06"), d("2025-01-19"));
        let c = QueryKey::meals_in_range(d("2025-01-20"), d("2025-02-02"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.namespace(), c.namespace());
    }

    #[test]
    fn test_display() {
        let key = QueryKey::weekly_memos(&[d("2025-01-06"), d("2025-01-13")]);
        assert_eq!(key.to_string(), "weekly_memos:2025-01-06:2025-01-13");
        assert_eq!(key.params().len(), 2);
    }
}
