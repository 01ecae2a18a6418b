//! Golden test runner: executes fixtures and checks their expectations

use crate::{
    corpus::{CorpusManager, Expectation, Fixture, FixtureTransform},
    diff::DiffEngine,
    GoldenConfig, GoldenError, Result,
};
use colored::*;
use regex::Regex;
use serde_json::Value;
use std::time::Instant;
use treeshift_core::{Chain, Context, Shift, Transform};

/// Result of running a golden test
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,

    /// Why the fixture failed
    pub error: Option<String>,

    /// Diff output if the output comparison failed
    pub diff: Option<String>,

    pub duration_ms: u64,

    /// The fixture is disabled and was not run
    pub skipped: bool,
}

impl TestResult {
    /// Print the test result
    pub fn print(&self, verbose: bool) {
        let status = if self.skipped {
            "SKIP".yellow().bold()
        } else if self.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!("{} {} ({}ms)", status, self.name, self.duration_ms);

        if let Some(ref error) = self.error {
            println!("  {}: {}", "Error".red(), error);
        }

        if verbose || !self.passed {
            if let Some(ref diff) = self.diff {
                println!("{}", diff);
            }
        }
    }
}

/// Outcome of checking one fixture, before timing is attached
struct Verdict {
    passed: bool,
    error: Option<String>,
    diff: Option<String>,
    skipped: bool,
}

impl Verdict {
    fn pass() -> Self {
        Self {
            passed: true,
            error: None,
            diff: None,
            skipped: false,
        }
    }

    fn fail(error: impl Into<String>, diff: Option<String>) -> Self {
        Self {
            passed: false,
            error: Some(error.into()),
            diff,
            skipped: false,
        }
    }
}

/// Runner for golden tests
pub struct GoldenTestRunner {
    config: GoldenConfig,
    corpus_manager: CorpusManager,
    diff_engine: DiffEngine,
}

impl GoldenTestRunner {
    /// Create a new test runner
    pub fn new(config: GoldenConfig) -> Self {
        let corpus_manager = CorpusManager::new(&config.corpus_dir);
        let diff_engine = DiffEngine::new(config.diff_options.clone());

        Self {
            config,
            corpus_manager,
            diff_engine,
        }
    }

    /// Run a single fixture by name, failing if it does not pass
    pub fn run_test(&self, name: &str) -> Result<TestResult> {
        let fixture = self.corpus_manager.load(name)?;
        let result = self.run_fixture(&fixture);

        if self.config.verbose {
            result.print(true);
        }

        if result.passed {
            Ok(result)
        } else {
            Err(GoldenError::TestFailed(format!(
                "Fixture '{}' failed: {}{}",
                name,
                result.error.as_deref().unwrap_or("unknown error"),
                result
                    .diff
                    .as_ref()
                    .map(|d| format!("\n{}", d))
                    .unwrap_or_default()
            )))
        }
    }

    /// Run every fixture whose name or category contains `pattern` (`*` runs all)
    pub fn run_batch(&self, pattern: &str) -> Result<Vec<TestResult>> {
        let fixtures = self.corpus_manager.discover()?;

        let selected: Vec<_> = if pattern == "*" {
            fixtures
        } else {
            fixtures
                .into_iter()
                .filter(|f| f.name.contains(pattern) || f.category.contains(pattern))
                .collect()
        };

        if selected.is_empty() {
            return Err(GoldenError::CorpusError(format!(
                "No fixtures found matching pattern '{}'",
                pattern
            )));
        }

        println!("Running {} fixtures...\n", selected.len());

        let results: Vec<TestResult> = selected
            .iter()
            .map(|fixture| {
                let result = self.run_fixture(fixture);
                result.print(self.config.verbose);
                result
            })
            .collect();

        let passed = results.iter().filter(|r| r.passed && !r.skipped).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let failed: Vec<&str> = results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect();

        println!("\n{}", "=== Test Summary ===".bold());
        println!(
            "{}: {} passed, {} failed, {} skipped",
            "Results".bold(),
            passed.to_string().green(),
            failed.len().to_string().red(),
            skipped.to_string().yellow()
        );

        if failed.is_empty() {
            Ok(results)
        } else {
            Err(GoldenError::TestFailed(format!(
                "{} fixture(s) failed: {}",
                failed.len(),
                failed.join(", ")
            )))
        }
    }

    /// Run one loaded fixture and record the outcome
    pub fn run_fixture(&self, fixture: &Fixture) -> TestResult {
        let start = Instant::now();
        let verdict = self.check(fixture);

        TestResult {
            name: fixture.name.clone(),
            passed: verdict.passed,
            error: verdict.error,
            diff: verdict.diff,
            duration_ms: start.elapsed().as_millis() as u64,
            skipped: verdict.skipped,
        }
    }

    fn check(&self, fixture: &Fixture) -> Verdict {
        if !fixture.enabled {
            return Verdict {
                skipped: true,
                ..Verdict::pass()
            };
        }

        match (&fixture.expectation, Self::execute(fixture)) {
            (Expectation::Output(expected), Ok(actual)) => {
                let diff =
                    self.diff_engine
                        .compare_ignoring(expected, &actual, &fixture.ignore_fields);
                if diff.matches {
                    Verdict::pass()
                } else {
                    Verdict::fail(
                        format!(
                            "output mismatch at {}",
                            diff.summary.differing_paths.join(", ")
                        ),
                        Some(diff.diff_output),
                    )
                }
            }
            (Expectation::Output(_), Err(e)) => Verdict::fail(e.to_string(), None),
            (Expectation::Error(pattern), Ok(actual)) => Verdict::fail(
                format!(
                    "expected an error matching '{}', got output {}",
                    pattern, actual
                ),
                None,
            ),
            (Expectation::Error(pattern), Err(e)) => {
                let regex = match Regex::new(pattern) {
                    Ok(regex) => regex,
                    Err(err) => return Verdict::fail(format!("invalid error_pattern: {}", err), None),
                };
                let message = e.to_string();
                if regex.is_match(&message) {
                    Verdict::pass()
                } else {
                    Verdict::fail(
                        format!("error '{}' does not match '{}'", message, pattern),
                        None,
                    )
                }
            }
        }
    }

    /// Compile and run the fixture's transform against its input
    fn execute(fixture: &Fixture) -> treeshift_core::Result<Value> {
        match &fixture.transform {
            FixtureTransform::Shift(spec) => Shift::new(spec)?.apply(&fixture.input),
            FixtureTransform::Chain(stages) => {
                Chain::from_value(stages.clone())?.transform(fixture.input.clone(), &Context::new())
            }
        }
    }

    /// List all fixture names
    pub fn list_tests(&self) -> Result<Vec<String>> {
        Ok(self
            .corpus_manager
            .discover()?
            .into_iter()
            .map(|f| f.name)
            .collect())
    }

    /// Print corpus statistics
    pub fn print_statistics(&self) -> Result<()> {
        self.corpus_manager.statistics()?.print();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiffOptions;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn runner_with(fixtures: &[(&str, Value)]) -> (TempDir, GoldenTestRunner) {
        let temp_dir = TempDir::new().unwrap();
        for (name, body) in fixtures {
            let path = temp_dir.path().join(format!("{}.json", name));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body.to_string()).unwrap();
        }
        let config = GoldenConfig {
            corpus_dir: temp_dir.path().to_path_buf(),
            diff_options: DiffOptions {
                colored: false,
                ..Default::default()
            },
            verbose: false,
        };
        (temp_dir, GoldenTestRunner::new(config))
    }

    #[test]
    fn test_passing_shift_fixture() {
        let (_dir, runner) = runner_with(&[(
            "shift/copy",
            json!({"description": "copy", "input": {"a": 1}, "spec": {"a": "b"}, "expected": {"b": 1}}),
        )]);
        let result = runner.run_test("shift/copy").unwrap();
        assert!(result.passed);
        assert_eq!(runner.list_tests().unwrap(), vec!["shift/copy"]);
    }

    #[test]
    fn test_output_mismatch_reports_paths() {
        let (_dir, runner) = runner_with(&[(
            "shift/wrong",
            json!({"description": "wrong", "input": {"a": 1}, "spec": {"a": "b"}, "expected": {"c": 1}}),
        )]);
        let fixture = runner.corpus_manager.load("shift/wrong").unwrap();
        let result = runner.run_fixture(&fixture);
        assert!(!result.passed);
        let error = result.error.unwrap();
        assert!(error.contains("b (extra in actual)"));
        assert!(error.contains("c (missing in actual)"));
        assert!(runner.run_test("shift/wrong").is_err());
    }

    #[test]
    fn test_error_pattern_fixtures() {
        let (_dir, runner) = runner_with(&[
            (
                "errors/unknown_op",
                json!({"description": "unknown", "chain": [{"operation": "nope"}], "error_pattern": "nope"}),
            ),
            (
                "errors/succeeds",
                json!({"description": "no error", "input": {"a": 1}, "spec": {"a": "b"}, "error_pattern": "."}),
            ),
        ]);
        assert!(runner.run_test("errors/unknown_op").is_ok());
        assert!(runner.run_test("errors/succeeds").is_err());
        assert!(runner.run_batch("errors").is_err());
    }

    #[test]
    fn test_disabled_fixture_is_skipped() {
        let (_dir, runner) = runner_with(&[(
            "chain/off",
            json!({"description": "off", "chain": [], "expected": 1, "enabled": false}),
        )]);
        let results = runner.run_batch("chain").unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].skipped);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let (_dir, runner) = runner_with(&[]);
        assert!(matches!(
            runner.run_batch("*"),
            Err(GoldenError::CorpusError(_))
        ));
    }
}
