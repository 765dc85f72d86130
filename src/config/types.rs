//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mstest::PublishOptions;
use crate::parser::{DetailMap, DEFAULT_CHANNEL_BUFFER, DEFAULT_LANGUAGE, KNOWN_DETAILS};

/// Configuration for a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Path to `mstest.exe`. Located from the VS tools variables if unset.
    #[serde(default)]
    pub exe_path: Option<PathBuf>,
    /// Directory the runner is started in.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Language of the runner's output.
    #[serde(default = "default_language")]
    pub language: String,
    /// JSON localization table replacing the built-in one.
    #[serde(default)]
    pub localization_file: Option<PathBuf>,
    /// Details MSTest should print under each result.
    #[serde(default)]
    pub details: Vec<String>,
    /// Preferred spelling of detail names in parsed results.
    #[serde(default = "default_detail_names")]
    pub detail_names: Vec<String>,
    #[serde(default)]
    pub no_isolation: bool,
    #[serde(default)]
    pub test_settings: Option<PathBuf>,
    #[serde(default)]
    pub run_config: Option<PathBuf>,
    #[serde(default)]
    pub results_file: Option<PathBuf>,
    /// Capacity of the event channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    /// Publish results to TFS after the run.
    #[serde(default)]
    pub publish: Option<PublishOptions>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_detail_names() -> Vec<String> {
    KNOWN_DETAILS.iter().map(ToString::to_string).collect()
}

fn default_channel_buffer() -> usize {
    DEFAULT_CHANNEL_BUFFER
}

impl RunnerConfig {
    /// Rename table built from `detail_names`.
    #[must_use]
    pub fn detail_map(&self) -> DetailMap {
        DetailMap::new(self.detail_names.iter().cloned())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            exe_path: None,
            working_dir: None,
            language: default_language(),
            localization_file: None,
            details: Vec::new(),
            detail_names: default_detail_names(),
            no_isolation: false,
            test_settings: None,
            run_config: None,
            results_file: None,
            channel_buffer: default_channel_buffer(),
            publish: None,
        }
    }
}
