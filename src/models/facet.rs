use serde::{Deserialize, Serialize};

/// Number of entries dated within one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacetBucket {
    /// `YYYY-MM`
    pub month_key: String,
    pub count: usize,
}

impl FacetBucket {
    pub fn new(month_key: impl Into<String>, count: usize) -> Self {
        Self {
            month_key: month_key.into(),
            count,
        }
    }
}
