/// Scan lifecycle definitions
///
/// Every scan record moves through these states. The pipeline consults
/// [`ScanStatus::can_transition_to`] before every status write.
use std::fmt;

/// Represents the current state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    // ===== Active States =====
    /// Scan record exists but the crawl has not started
    Pending,

    /// Frontier is being crawled
    Crawling,

    /// Crawl finished and pages are persisted; analysis has not run
    Crawled,

    /// Analysis pass is running
    Analyzing,

    // ===== Resting States =====
    /// Analysis finished and the report is stored
    Completed,

    // ===== Terminal Error States =====
    /// A pipeline-level failure aborted the scan
    Failed,
}

impl ScanStatus {
    /// Returns true if the scan can never change state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if the pipeline is still working on the scan
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Crawling | Self::Analyzing
        )
    }

    /// Returns true if analysis may be (re-)run from this state
    pub fn can_analyze(&self) -> bool {
        matches!(self, Self::Crawled | Self::Completed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Completed -> Analyzing` allows re-running analysis. `Failed` is
    /// reachable from every state but itself.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        use ScanStatus::*;

        match (self, next) {
            (Pending, Crawling)
            | (Crawling, Crawled)
            | (Crawled, Analyzing)
            | (Analyzing, Completed)
            | (Completed, Analyzing) => true,
            (Pending | Crawling | Crawled | Analyzing | Completed, Failed) => true,
            _ => false,
        }
    }

    /// Converts the scan status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Crawled => "crawled",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a scan status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "crawling" => Some(Self::Crawling),
            "crawled" => Some(Self::Crawled),
            "analyzing" => Some(Self::Analyzing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible scan statuses
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Crawling,
            Self::Crawled,
            Self::Analyzing,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
