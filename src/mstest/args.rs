//! Command-line arguments for `mstest.exe`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where MSTest loads tests from. Exactly one source per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A test assembly (`/testcontainer:`).
    Container(PathBuf),
    /// A `.vsmdi` metadata file (`/testmetadata:`).
    Metadata(PathBuf),
}

impl Source {
    fn to_arg(&self) -> String {
        match self {
            Self::Container(path) => format!("/testcontainer:{}", path.display()),
            Self::Metadata(path) => format!("/testmetadata:{}", path.display()),
        }
    }
}

/// Operator joining a category to the filter before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOp {
    And,
    Or,
    Not,
    AndNot,
}

impl CategoryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Not => "!",
            Self::AndNot => "&!",
        }
    }
}

/// Category expression passed to `/category:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    terms: Vec<(Option<CategoryOp>, String)>,
}

impl CategoryFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter with a single category.
    pub fn set(&mut self, category: impl Into<String>) -> &mut Self {
        self.terms = vec![(None, category.into())];
        self
    }

    pub fn and(&mut self, category: impl Into<String>) -> &mut Self {
        self.append(CategoryOp::And, category.into())
    }

    pub fn or(&mut self, category: impl Into<String>) -> &mut Self {
        self.append(CategoryOp::Or, category.into())
    }

    pub fn not(&mut self, category: impl Into<String>) -> &mut Self {
        self.append(CategoryOp::Not, category.into())
    }

    pub fn and_not(&mut self, category: impl Into<String>) -> &mut Self {
        self.append(CategoryOp::AndNot, category.into())
    }

    /// Remove the first occurrence of `category` along with its operator.
    ///
    /// Removing the leading category promotes the next one; a negation on
    /// it is kept.
    pub fn remove(&mut self, category: &str) -> &mut Self {
        let Some(index) = self.terms.iter().position(|(_, name)| name == category) else {
            return self;
        };
        self.terms.remove(index);
        if index == 0 {
            if let Some((op, _)) = self.terms.first_mut() {
                *op = match *op {
                    Some(CategoryOp::Not | CategoryOp::AndNot) => Some(CategoryOp::Not),
                    _ => None,
                };
            }
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as MSTest's filter syntax, e.g. `Fast&!Slow`.
    #[must_use]
    pub fn expression(&self) -> String {
        self.terms
            .iter()
            .map(|(op, name)| format!("{}{name}", op.map_or("", CategoryOp::symbol)))
            .collect()
    }

    fn append(&mut self, op: CategoryOp, category: String) -> &mut Self {
        let op = if self.terms.is_empty() { None } else { Some(op) };
        self.terms.push((op, category));
        self
    }
}

/// Settings for publishing results to a Team Foundation Server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOptions {
    /// TFS server, e.g. `http://tfs:8080`.
    pub server: String,
    pub build_name: String,
    /// Must match the build's flavor, e.g. `Release`.
    pub flavor: String,
    /// Must match the build's platform, e.g. `AnyCPU`.
    pub platform: String,
    pub team_project: String,
    /// Publish an existing results file instead of a new run.
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

/// Error building MSTest arguments.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Must specify a test container or test metadata")]
    MissingSource,
}

/// Builder for `mstest.exe` arguments.
#[derive(Debug, Clone, Default)]
pub struct MsTestArgs {
    source: Option<Source>,
    test_lists: Vec<String>,
    categories: CategoryFilter,
    tests: Vec<String>,
    no_isolation: bool,
    test_settings: Option<PathBuf>,
    run_config: Option<PathBuf>,
    results_file: Option<PathBuf>,
    details: Vec<String>,
    publish: Option<PublishOptions>,
}

impl MsTestArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the test source, replacing any previous one.
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn get_source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn add_test_list(mut self, list: impl Into<String>) -> Self {
        let list = list.into();
        if !self.test_lists.contains(&list) {
            self.test_lists.push(list);
        }
        self
    }

    #[must_use]
    pub fn remove_test_list(mut self, list: &str) -> Self {
        self.test_lists.retain(|l| l != list);
        self
    }

    #[must_use]
    pub fn clear_test_lists(mut self) -> Self {
        self.test_lists.clear();
        self
    }

    /// Replace the category filter.
    #[must_use]
    pub fn categories(mut self, filter: CategoryFilter) -> Self {
        self.categories = filter;
        self
    }

    /// Mutable access to the category filter.
    pub fn categories_mut(&mut self) -> &mut CategoryFilter {
        &mut self.categories
    }

    /// Run only this test (may be repeated).
    #[must_use]
    pub fn add_test(mut self, test: impl Into<String>) -> Self {
        let test = test.into();
        if !self.tests.contains(&test) {
            self.tests.push(test);
        }
        self
    }

    #[must_use]
    pub fn remove_test(mut self, test: &str) -> Self {
        self.tests.retain(|t| t != test);
        self
    }

    /// Run every test in the source.
    #[must_use]
    pub fn clear_tests(mut self) -> Self {
        self.tests.clear();
        self
    }

    /// Run tests inside the MSTest process.
    #[must_use]
    pub fn no_isolation(mut self, enabled: bool) -> Self {
        self.no_isolation = enabled;
        self
    }

    #[must_use]
    pub fn test_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_settings = Some(path.into());
        self
    }

    #[must_use]
    pub fn run_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_config = Some(path.into());
        self
    }

    #[must_use]
    pub fn results_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_file = Some(path.into());
        self
    }

    /// Ask MSTest to print a detail under each result.
    #[must_use]
    pub fn detail(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.details.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
            self.details.push(name);
        }
        self
    }

    /// Enabled details.
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    #[must_use]
    pub fn publish(mut self, options: PublishOptions) -> Self {
        self.publish = Some(options);
        self
    }

    #[must_use]
    pub fn dont_publish(mut self) -> Self {
        self.publish = None;
        self
    }

    /// Build the command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError::MissingSource` if no source was set.
    pub fn build_args(&self) -> Result<Vec<String>, ArgsError> {
        let source = self.source.as_ref().ok_or(ArgsError::MissingSource)?;
        let mut args = vec!["/nologo".to_string(), source.to_arg()];

        for list in &self.test_lists {
            args.push(format!("/testlist:{list}"));
        }

        if !self.categories.is_empty() {
            args.push(format!("/category:{}", self.categories.expression()));
        }

        for test in &self.tests {
            args.push(format!("/test:{test}"));
        }

        if self.no_isolation {
            args.push("/noisolation".to_string());
        }

        if let Some(path) = &self.test_settings {
            args.push(format!("/testsettings:{}", path.display()));
        }

        if let Some(path) = &self.run_config {
            args.push(format!("/runconfig:{}", path.display()));
        }

        if let Some(path) = &self.results_file {
            args.push(format!("/resultsfile:{}", path.display()));
        }

        for detail in &self.details {
            args.push(format!("/detail:{}", detail.to_lowercase()));
        }

        if let Some(publish) = &self.publish {
            args.push(format!("/publish:{}", publish.server));
            args.push(format!("/publishbuild:{}", publish.build_name));
            args.push(format!("/flavor:{}", publish.flavor));
            args.push(format!("/platform:{}", publish.platform));
            args.push(format!("/teamproject:{}", publish.team_project));
            if let Some(path) = &publish.results_file {
                args.push(format!("/publishresultsfile:{}", path.display()));
            }
        }

        Ok(args)
    }
}
