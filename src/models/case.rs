//! Case and document data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry under the registry's "Open files:" section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseLink {
    /// Case name as shown in the listing
    pub name: String,

    /// Link target, possibly relative to the registry origin
    pub url: String,
}

/// One published document row from a case detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Document name from the document cell
    pub name: String,

    /// Link target of the document cell's first anchor, if any
    pub url: Option<String>,

    /// Date the document was published
    pub published: NaiveDate,
}

/// Summary of a case's detail page for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseActivity {
    /// Absolute URL of the detail page
    pub case_url: String,

    /// Maximum of all valid row dates, absent if no row parsed
    pub most_recent: Option<NaiveDate>,

    /// Documents published within the lookback window, in table row order
    pub recent_documents: Vec<DocumentRecord>,
}

impl CaseActivity {
    /// Create an empty activity summary for a detail page.
    pub fn empty(case_url: impl Into<String>) -> Self {
        Self {
            case_url: case_url.into(),
            most_recent: None,
            recent_documents: Vec::new(),
        }
    }

    /// Whether any document falls inside the lookback window.
    pub fn has_recent_documents(&self) -> bool {
        !self.recent_documents.is_empty()
    }
}
