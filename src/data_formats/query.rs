use crate::errors::RequestError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Normalized pagination window applied to every listing and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub limit: i64,
    pub offset: i64,
}

impl Default for QueryWindow {
    fn default() -> Self {
        QueryWindow {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl QueryWindow {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(limit) if limit < 1 => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };
        let offset = offset.unwrap_or(0).max(0);
        QueryWindow { limit, offset }
    }

    /// Unparsable values fall back to the defaults.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit.map(|limit| limit.trim().parse().unwrap_or(DEFAULT_LIMIT));
        let offset = offset.map(|offset| offset.trim().parse().unwrap_or(0));
        QueryWindow::new(limit, offset)
    }
}

/// Query-string pairs in arrival order; the first occurrence of a key wins.
pub type QueryPairs = Vec<(String, String)>;

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
}

#[derive(Debug, Default)]
pub struct WindowParams {
    limit: Option<String>,
    offset: Option<String>,
}

impl WindowParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        WindowParams {
            limit: first_value(pairs, "limit"),
            offset: first_value(pairs, "offset"),
        }
    }

    pub fn window(&self) -> QueryWindow {
        QueryWindow::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

#[derive(Debug, Default)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl SearchParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        SearchParams {
            q: first_value(pairs, "q"),
            limit: first_value(pairs, "limit"),
            offset: first_value(pairs, "offset"),
        }
    }

    pub fn query(&self) -> Result<&str, RequestError> {
        match self.q.as_deref() {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(RequestError::InvalidArgument(
                "Query parameter 'q' is required".to_string(),
            )),
        }
    }

    pub fn window(&self) -> QueryWindow {
        QueryWindow::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        assert_eq!(QueryWindow::parse(None, None), QueryWindow::default());
        assert_eq!(QueryWindow::default().limit, 10);
        assert_eq!(QueryWindow::default().offset, 0);
    }

    #[test]
    fn limit_below_one_resets_to_default() {
        assert_eq!(QueryWindow::new(Some(0), None).limit, 10);
        assert_eq!(QueryWindow::new(Some(-3), None).limit, 10);
        assert_eq!(QueryWindow::new(Some(1), None).limit, 1);
    }

    #[test]
    fn limit_is_clamped_to_max() {
        assert_eq!(QueryWindow::new(Some(500), None).limit, 100);
        assert_eq!(QueryWindow::new(Some(100), None).limit, 100);
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        assert_eq!(QueryWindow::new(None, Some(-5)).offset, 0);
        assert_eq!(QueryWindow::new(None, Some(20)).offset, 20);
    }

    #[test]
    fn unparsable_values_use_defaults() {
        let window = QueryWindow::parse(Some("ten"), Some("later"));
        assert_eq!(window, QueryWindow::default());
        assert_eq!(QueryWindow::parse(Some("25"), Some("5")), QueryWindow::new(Some(25), Some(5)));
    }

    #[test]
    fn search_requires_a_query() {
        let params = SearchParams::default();
        assert!(matches!(params.query(), Err(RequestError::InvalidArgument(_))));
        let params = SearchParams {
            q: Some(String::new()),
            ..Default::default()
        };
        assert!(params.query().is_err());
        let params = SearchParams {
            q: Some("rust".to_string()),
            limit: Some("0".to_string()),
            offset: Some("-1".to_string()),
        };
        assert_eq!(params.query().unwrap(), "rust");
        assert_eq!(params.window(), QueryWindow::default());
    }

    fn pairs(raw: &[(&str, &str)]) -> QueryPairs {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let params =
            WindowParams::from_pairs(&pairs(&[("limit", "5"), ("limit", "6"), ("offset", "2")]));
        assert_eq!(params.window(), QueryWindow::new(Some(5), Some(2)));

        let params =
            SearchParams::from_pairs(&pairs(&[("q", "rust"), ("q", "go"), ("offset", "x")]));
        assert_eq!(params.query().unwrap(), "rust");
        assert_eq!(params.window(), QueryWindow::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let params = WindowParams::from_pairs(&pairs(&[("page", "3"), ("limit", "4")]));
        assert_eq!(params.window().limit, 4);
    }
}
