use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId(value)
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId(value.to_string())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Explicit(Vec<RowId>),
    AllFiltered,
}

impl Selection {
    pub fn explicit<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RowId>,
    {
        let mut unique: Vec<RowId> = Vec::new();
        for id in ids.into_iter().map(Into::into) {
            if !id.0.is_empty() && !unique.contains(&id) {
                unique.push(id);
            }
        }
        Selection::Explicit(unique)
    }
}
