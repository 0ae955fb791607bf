use crate::filter::{apply_filter, FilterCategory};
use crate::lookup::QueryResult;
use chrono::{DateTime, Utc};

/// Placeholder shown when there is nothing to list.
pub const NO_RESULTS: &str = "未查询到结果";

/// Everything a session remembers between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Raw input, one IP per line.
    pub input_text: String,
    /// Results of the last full query, unfiltered.
    pub last_results: Vec<QueryResult>,
    pub active_filter: FilterCategory,
    /// Last rendered view, restored as-is on startup.
    pub rendered_view: String,
    /// When the state was last written to the store.
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn has_results(&self) -> bool {
        !self.last_results.is_empty()
    }

    /// Results visible under the active filter.
    pub fn visible_results(&self) -> Vec<QueryResult> {
        apply_filter(&self.last_results, self.active_filter)
    }
}

/// Render a result list the way the results panel shows it.
pub fn render_results(results: &[QueryResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    results
        .iter()
        .map(QueryResult::display_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LocationRecord;

    #[test]
    fn test_render_empty() {
        assert_eq!(render_results(&[]), NO_RESULTS);
    }

    #[test]
    fn test_render_mixed() {
        let results = vec![
            QueryResult::Success {
                record: LocationRecord {
                    ip: "1.1.1.1".into(),
                    country: "中国".into(),
                    province: "广东".into(),
                    city: "".into(),
                    isp: "电信".into(),
                },
            },
            QueryResult::failure("2.2.2.2", "timeout"),
        ];
        assert_eq!(
            render_results(&results),
            "1.1.1.1 => 中国-广东-电信\n2.2.2.2 => 查询失败: timeout"
        );
    }

    #[test]
    fn test_visible_results_follow_filter() {
        let mut state = SessionState {
            last_results: vec![QueryResult::failure("2.2.2.2", "timeout")],
            ..Default::default()
        };
        assert_eq!(state.visible_results().len(), 1);
        state.active_filter = FilterCategory::Mobile;
        assert!(state.visible_results().is_empty());
        assert!(state.has_results());
    }
}
