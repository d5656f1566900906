use serde::Serialize;

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Lenient parsing: absent or non-numeric values fall back to defaults, and the
    /// limit is clamped into `1..=max`.
    pub fn from_params(page: Option<&str>, limit: Option<&str>, default: usize, max: usize) -> Self {
        let page = page
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|limit| limit.clamp(1, max as i64) as usize)
            .unwrap_or(default)
            .clamp(1, max.max(1));

        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn describe(&self, total: usize) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
        }
    }
}

/// Pagination envelope returned alongside list payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_or_garbage_values() {
        let request = PageRequest::from_params(None, Some("lots"), 50, 100);
        assert_eq!(request, PageRequest { page: 1, limit: 50 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::from_params(None, Some("500"), 50, 100).limit, 100);
        assert_eq!(PageRequest::from_params(None, Some("0"), 20, 50).limit, 1);
        assert_eq!(PageRequest::from_params(None, Some("-4"), 20, 50).limit, 1);
    }

    #[test]
    fn describes_total_pages() {
        let request = PageRequest::from_params(Some("3"), Some("10"), 50, 100);
        assert_eq!(request.offset(), 20);

        let pagination = request.describe(21);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(request.describe(0).total_pages, 0);
    }
}
