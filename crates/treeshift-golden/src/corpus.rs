//! Fixture corpus management for golden tests
//!
//! Every `*.json` file below the corpus root is a fixture. Its name is its
//! path relative to the root without the extension (`shift/rating`), its
//! category the first directory of that path.

use crate::{GoldenError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A fixture as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    /// Description of what this tests
    pub description: String,

    /// Input document
    #[serde(default)]
    pub input: Value,

    /// Shift spec, mutually exclusive with `chain`
    #[serde(default)]
    pub spec: Option<Value>,

    /// Chain stage list, mutually exclusive with `spec`
    #[serde(default)]
    pub chain: Option<Value>,

    /// Expected output when the transform succeeds; an explicit `null` counts
    #[serde(default, deserialize_with = "present")]
    pub expected: Option<Value>,

    /// Regex the error message must match when the transform fails
    #[serde(default)]
    pub error_pattern: Option<String>,

    /// Dotted paths left out of the comparison
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether this fixture is run
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// What a fixture runs
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureTransform {
    /// A single shift spec
    Shift(Value),
    /// A chain stage list
    Chain(Value),
}

/// What a fixture expects
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// The transform succeeds with this output
    Output(Value),
    /// The transform fails with a message matching this regex
    Error(String),
}

/// A loaded fixture
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Path relative to the corpus root, without extension
    pub name: String,

    /// First directory of the name, or `root`
    pub category: String,

    pub description: String,
    pub input: Value,
    pub transform: FixtureTransform,
    pub expectation: Expectation,
    pub ignore_fields: Vec<String>,
    pub tags: Vec<String>,
    pub enabled: bool,
}

impl Fixture {
    /// Validate a fixture file and attach its name
    pub fn from_file(name: impl Into<String>, file: FixtureFile) -> Result<Self> {
        let name = name.into();
        let transform = match (file.spec, file.chain) {
            (Some(spec), None) => FixtureTransform::Shift(spec),
            (None, Some(chain)) => FixtureTransform::Chain(chain),
            (Some(_), Some(_)) => {
                return Err(GoldenError::CorpusError(format!(
                    "Fixture '{}' has both 'spec' and 'chain'",
                    name
                )))
            }
            (None, None) => {
                return Err(GoldenError::CorpusError(format!(
                    "Fixture '{}' needs a 'spec' or a 'chain'",
                    name
                )))
            }
        };
        let expectation = match (file.expected, file.error_pattern) {
            (Some(expected), None) => Expectation::Output(expected),
            (None, Some(pattern)) => Expectation::Error(pattern),
            _ => {
                return Err(GoldenError::CorpusError(format!(
                    "Fixture '{}' needs exactly one of 'expected' and 'error_pattern'",
                    name
                )))
            }
        };
        let category = name
            .split_once('/')
            .map(|(category, _)| category.to_string())
            .unwrap_or_else(|| "root".to_string());

        Ok(Self {
            name,
            category,
            description: file.description,
            input: file.input,
            transform,
            expectation,
            ignore_fields: file.ignore_fields,
            tags: file.tags,
            enabled: file.enabled,
        })
    }
}

/// Manages the fixture corpus
pub struct CorpusManager {
    corpus_dir: PathBuf,
}

impl CorpusManager {
    /// Create a new corpus manager
    pub fn new(corpus_dir: impl AsRef<Path>) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
        }
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Discover all fixtures in the corpus, sorted by name
    ///
    /// A fixture that fails to load is an error: a silently skipped fixture
    /// is a silently skipped test.
    pub fn discover(&self) -> Result<Vec<Fixture>> {
        let mut fixtures = Vec::new();

        if !self.corpus_dir.exists() {
            return Ok(fixtures);
        }

        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| GoldenError::CorpusError(e.to_string()))?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                fixtures.push(self.load_path(path)?);
            }
        }

        Ok(fixtures)
    }

    /// Load a fixture by name (`shift/rating`)
    pub fn load(&self, name: &str) -> Result<Fixture> {
        let path = self.corpus_dir.join(format!("{}.json", name));
        if !path.exists() {
            return Err(GoldenError::CorpusError(format!(
                "Fixture '{}' not found at {:?}",
                name, path
            )));
        }
        self.load_path(&path)
    }

    fn load_path(&self, path: &Path) -> Result<Fixture> {
        let content = fs::read_to_string(path)?;
        let file: FixtureFile = serde_json::from_str(&content).map_err(|e| {
            GoldenError::CorpusError(format!("Failed to parse fixture {:?}: {}", path, e))
        })?;
        Fixture::from_file(self.fixture_name(path)?, file)
    }

    fn fixture_name(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.corpus_dir).map_err(|_| {
            GoldenError::CorpusError(format!("{:?} is outside the corpus", path))
        })?;
        let name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Ok(name)
    }

    /// Filter fixtures by category
    pub fn filter_by_category(&self, fixtures: Vec<Fixture>, category: &str) -> Vec<Fixture> {
        fixtures
            .into_iter()
            .filter(|f| f.category == category || category == "*")
            .collect()
    }

    /// Filter fixtures by tags
    pub fn filter_by_tags(&self, fixtures: Vec<Fixture>, tags: &[String]) -> Vec<Fixture> {
        if tags.is_empty() {
            return fixtures;
        }

        fixtures
            .into_iter()
            .filter(|f| tags.iter().any(|tag| f.tags.contains(tag)))
            .collect()
    }

    /// Get statistics about the corpus
    pub fn statistics(&self) -> Result<CorpusStatistics> {
        let fixtures = self.discover()?;
        let mut stats = CorpusStatistics {
            total: fixtures.len(),
            ..Default::default()
        };

        for fixture in fixtures {
            if fixture.enabled {
                stats.enabled += 1;
            }
            if matches!(fixture.expectation, Expectation::Error(_)) {
                stats.expecting_errors += 1;
            }
            *stats.by_category.entry(fixture.category).or_insert(0) += 1;
        }

        Ok(stats)
    }
}

/// Statistics about the fixture corpus
#[derive(Debug, Default)]
pub struct CorpusStatistics {
    pub total: usize,
    pub enabled: usize,
    pub expecting_errors: usize,
    pub by_category: HashMap<String, usize>,
}

impl CorpusStatistics {
    /// Print statistics to stdout
    pub fn print(&self) {
        println!("=== Corpus Statistics ===");
        println!("Total fixtures: {}", self.total);
        println!("Enabled: {}", self.enabled);
        println!("Expecting errors: {}", self.expecting_errors);

        if !self.by_category.is_empty() {
            println!("\nFixtures by category:");
            let mut categories: Vec<_> = self.by_category.iter().collect();
            categories.sort_by_key(|(k, _)| k.as_str());
            for (category, count) in categories {
                println!("  {}: {}", category, count);
            }
        }
    }
}
