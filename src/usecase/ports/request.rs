pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "page_size";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_DIRECTION: &str = "dir";
pub const PARAM_COLUMNS: &str = "columns";
pub const PARAM_ACTION: &str = "action";
pub const PARAM_IDS: &str = "ids";
pub const PARAM_SELECT_ALL: &str = "select_all";
pub const PARAM_BATCH_FROM: &str = "batch_from";
pub const PARAM_BATCH_LIMIT: &str = "batch_limit";

pub fn scoped(grid_id: &str, name: &str) -> String {
    format!("{grid_id}_{name}")
}

pub trait RequestParams {
    fn get(&self, key: &str) -> Option<&str>;
    fn get_all(&self, key: &str) -> Vec<&str>;

    fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            )
        })
    }

    fn parse_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((key, value)) => (decode_component(key), decode_component(value)),
                None => (decode_component(part), String::new()),
            })
            .collect();
        Self { pairs }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl RequestParams for QueryParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_and_keeps_repeated_keys() {
        let params = QueryParams::parse("?users_ids=1&users_ids=2&q=a+b%2Fc&flag");
        assert_eq!(params.get_all("users_ids"), vec!["1", "2"]);
        assert_eq!(params.get("q"), Some("a b/c"));
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn bad_escape_is_kept_verbatim() {
        let params = QueryParams::parse("q=100%&r=%zz");
        assert_eq!(params.get("q"), Some("100%"));
        assert_eq!(params.get("r"), Some("%zz"));
    }

    #[test]
    fn multibyte_escapes_decode_and_invalid_utf8_stays_raw() {
        let params = QueryParams::parse("name=J%C3%BCrgen&bad=%FF%FE");
        assert_eq!(params.get("name"), Some("Jürgen"));
        assert_eq!(params.get("bad"), Some("%FF%FE"));
    }

    #[test]
    fn flag_accepts_common_truthy_values() {
        let params = QueryParams::new()
            .with("a", "1")
            .with("b", "On")
            .with("c", "0")
            .with("d", "");
        assert!(params.flag("a"));
        assert!(params.flag("b"));
        assert!(!params.flag("c"));
        assert!(!params.flag("d"));
        assert!(!params.flag("e"));
    }
}
