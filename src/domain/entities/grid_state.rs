#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn is_desc(self) -> bool {
        matches!(self, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub order_key: String,
    pub data_key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    pub grid_id: String,
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub column_controls_enabled: bool,
    pub visible_columns: Vec<String>,
    pub total: usize,
    pub page_count: usize,
}

impl GridState {
    pub fn offset(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.page.saturating_sub(1) * self.page_size
    }

    pub fn limit(&self) -> Option<usize> {
        (self.page_size > 0).then_some(self.page_size)
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

pub fn clamp_page(requested: usize, total: usize, page_size: usize) -> usize {
    requested.clamp(1, page_count(total, page_size).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up_and_disables_on_zero() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(500, 0), 0);
    }

    #[test]
    fn clamp_page_stays_in_range() {
        for total in [0_usize, 1, 9, 10, 11, 237] {
            for page_size in [1_usize, 3, 10, 25] {
                let upper = page_count(total, page_size).max(1);
                for requested in [0_usize, 1, 2, 5, 50, usize::MAX] {
                    let page = clamp_page(requested, total, page_size);
                    assert!(
                        (1..=upper).contains(&page),
                        "page {page} out of range for total={total} size={page_size}"
                    );
                }
            }
        }
        assert_eq!(clamp_page(7, 0, 10), 1);
        assert_eq!(clamp_page(7, 30, 10), 3);
    }

    #[test]
    fn direction_parse_is_case_insensitive() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse(" asc "), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("sideways"), None);
    }
}
