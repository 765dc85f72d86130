//! Parsed test results and detail-name normalization.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Detail names MSTest accepts for `/detail:`, in their preferred spelling.
pub const KNOWN_DETAILS: [&str; 30] = [
    "adapter",
    "computerName",
    "debugTrace",
    "description",
    "displayText",
    "duration",
    "errorMessage",
    "errorStackTrace",
    "executionID",
    "groups",
    "ID",
    "isAutomated",
    "link",
    "longText",
    "name",
    "outcomeText",
    "owner",
    "parentExeCID",
    "priority",
    "projectName",
    "projectRelativePath",
    "readOnly",
    "spoolMessage",
    "stderr",
    "stdout",
    "storage",
    "testCategoryID",
    "testName",
    "testType",
    "traceInfo",
];

/// One test outcome reported by MSTest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Outcome token as printed, e.g. `Passed`.
    pub status: String,
    /// Fully qualified test name.
    pub name: String,
    /// Whether `status` is the localized passing token.
    pub passed: bool,
    /// Details printed under the result, keyed by normalized name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl TestResult {
    /// Create a result with no attributes.
    #[must_use]
    pub fn new(status: impl Into<String>, name: impl Into<String>, passed: bool) -> Self {
        Self {
            status: status.into(),
            name: name.into(),
            passed,
            attributes: BTreeMap::new(),
        }
    }

    /// Look up a detail by its normalized name.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Every result from one run, split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// All results in output order.
    pub all: Vec<TestResult>,
    /// Results whose status was the passing token.
    pub passed: Vec<TestResult>,
    /// Every other result.
    pub failed: Vec<TestResult>,
}

impl RunSummary {
    /// Append a finalized result.
    pub fn record(&mut self, result: &TestResult) {
        self.all.push(result.clone());
        if result.passed {
            self.passed.push(result.clone());
        } else {
            self.failed.push(result.clone());
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.all.len()
    }

    /// True if no result failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Case-insensitive rename table for attribute keys.
///
/// Built once from the caller's preferred names. When two names differ only
/// by case, the first wins. Keys with no entry pass through unchanged.
#[derive(Debug, Clone)]
pub struct DetailMap {
    lookup: HashMap<String, String>,
}

impl DetailMap {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lookup = HashMap::new();
        for name in names {
            let name = name.into();
            lookup.entry(name.to_lowercase()).or_insert(name);
        }
        Self { lookup }
    }

    /// A map that renames nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lookup: HashMap::new(),
        }
    }

    /// Preferred spelling for `key`, or `key` itself if unmapped.
    #[must_use]
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup
            .get(&key.to_lowercase())
            .map_or(key, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Default for DetailMap {
    fn default() -> Self {
        Self::new(KNOWN_DETAILS)
    }
}
