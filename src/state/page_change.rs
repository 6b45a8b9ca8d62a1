use std::fmt;

/// How a crawled page compares with the baseline scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageChange {
    /// URL was not present in the baseline
    New,

    /// URL was present but its content hash differs
    Updated,

    /// Unchanged, not hashable, or never fetched
    #[default]
    Existing,
}

impl PageChange {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Existing => "existing",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "updated" => Some(Self::Updated),
            "existing" => Some(Self::Existing),
            _ => None,
        }
    }
}

impl fmt::Display for PageChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
