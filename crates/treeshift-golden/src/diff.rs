//! Structural comparison of transform output against fixture expectations

use colored::*;
use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

/// Options for diff comparison
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Whether to use colored output
    pub colored: bool,

    /// Equal lines shown before the first change when `full_diff` is off
    pub context_lines: usize,

    /// Sort object keys before rendering the text diff
    pub normalize: bool,

    /// Tolerance for floating point comparison
    pub float_tolerance: f64,

    /// Whether to show every equal line
    pub full_diff: bool,

    /// Maximum diff lines to show (0 = unlimited)
    pub max_diff_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            colored: true,
            context_lines: 3,
            normalize: true,
            float_tolerance: 1e-9,
            full_diff: true,
            max_diff_lines: 100,
        }
    }
}

/// Result of a diff operation
#[derive(Debug)]
pub struct DiffResult {
    pub matches: bool,

    /// Human-readable diff output, empty on a match
    pub diff_output: String,

    pub summary: DiffSummary,
}

/// Summary of diff changes
#[derive(Debug, Default)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,

    /// Paths that differ, in `a.b[0]` form
    pub differing_paths: Vec<String>,
}

/// Engine for comparing JSON values
///
/// Object key order is not significant, array order is.
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compare two JSON values
    pub fn compare(&self, expected: &Value, actual: &Value) -> DiffResult {
        self.compare_ignoring(expected, actual, &[])
    }

    /// Compare two JSON values after removing the given dotted paths from both
    pub fn compare_ignoring(
        &self,
        expected: &Value,
        actual: &Value,
        ignore_fields: &[String],
    ) -> DiffResult {
        let mut expected = self.prepare(expected);
        let mut actual = self.prepare(actual);
        for field in ignore_fields {
            let parts: Vec<&str> = field.split('.').filter(|s| !s.is_empty()).collect();
            remove_field(&mut expected, &parts);
            remove_field(&mut actual, &parts);
        }

        if self.values_match(&expected, &actual) {
            return DiffResult {
                matches: true,
                diff_output: String::new(),
                summary: DiffSummary::default(),
            };
        }

        DiffResult {
            matches: false,
            diff_output: self.generate_diff_output(&expected, &actual),
            summary: self.collect_diff_summary(&expected, &actual),
        }
    }

    fn prepare(&self, value: &Value) -> Value {
        if self.options.normalize {
            normalize_json(value)
        } else {
            value.clone()
        }
    }

    /// Check if two values match structurally
    fn values_match(&self, expected: &Value, actual: &Value) -> bool {
        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                exp.len() == act.len()
                    && exp.iter().all(|(key, exp_val)| {
                        act.get(key)
                            .map_or(false, |act_val| self.values_match(exp_val, act_val))
                    })
            }
            (Value::Array(exp), Value::Array(act)) => {
                exp.len() == act.len()
                    && exp
                        .iter()
                        .zip(act.iter())
                        .all(|(e, a)| self.values_match(e, a))
            }
            (Value::Number(exp), Value::Number(act)) => {
                // Integers compare exactly; only mixed or float pairs get tolerance
                if exp.is_f64() || act.is_f64() {
                    match (exp.as_f64(), act.as_f64()) {
                        (Some(e), Some(a)) => (e - a).abs() <= self.options.float_tolerance,
                        _ => exp == act,
                    }
                } else {
                    exp == act
                }
            }
            (exp, act) => exp == act,
        }
    }

    /// Generate human-readable diff output
    fn generate_diff_output(&self, expected: &Value, actual: &Value) -> String {
        let expected_str = pretty(expected);
        let actual_str = pretty(actual);

        let text_diff = TextDiff::from_lines(&expected_str, &actual_str);
        let mut output = String::new();

        if self.options.colored {
            output.push_str(&"=== Diff (expected / actual) ===\n".bold().to_string());
        } else {
            output.push_str("=== Diff (expected / actual) ===\n");
        }

        let mut line_count = 0;

        for change in text_diff.iter_all_changes() {
            if self.options.max_diff_lines > 0 && line_count >= self.options.max_diff_lines {
                output.push_str("... (diff truncated) ...\n");
                break;
            }

            let line = match change.tag() {
                ChangeTag::Delete if self.options.colored => {
                    format!("{}{}", "-".red(), change.to_string().red())
                }
                ChangeTag::Delete => format!("-{}", change),
                ChangeTag::Insert if self.options.colored => {
                    format!("{}{}", "+".green(), change.to_string().green())
                }
                ChangeTag::Insert => format!("+{}", change),
                ChangeTag::Equal => {
                    if self.options.full_diff || line_count < self.options.context_lines {
                        format!(" {}", change)
                    } else {
                        continue;
                    }
                }
            };

            output.push_str(&line);
            line_count += 1;
        }

        output
    }

    /// Collect summary of differences
    fn collect_diff_summary(&self, expected: &Value, actual: &Value) -> DiffSummary {
        let mut summary = DiffSummary::default();

        self.collect_diff_paths(expected, actual, String::new(), &mut summary.differing_paths);

        let expected_str = pretty(expected);
        let actual_str = pretty(actual);
        for change in TextDiff::from_lines(&expected_str, &actual_str).iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => summary.removed += 1,
                ChangeTag::Insert => summary.added += 1,
                ChangeTag::Equal => {}
            }
        }

        summary.changed = summary.differing_paths.len();
        summary
    }

    /// Recursively collect paths that differ
    fn collect_diff_paths(
        &self,
        expected: &Value,
        actual: &Value,
        path: String,
        paths: &mut Vec<String>,
    ) {
        match (expected, actual) {
            (Value::Object(exp), Value::Object(act)) => {
                let all_keys: BTreeSet<&String> = exp.keys().chain(act.keys()).collect();

                for key in all_keys {
                    let new_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    match (exp.get(key), act.get(key)) {
                        (Some(exp_val), Some(act_val)) => {
                            if !self.values_match(exp_val, act_val) {
                                self.collect_diff_paths(exp_val, act_val, new_path, paths);
                            }
                        }
                        (Some(_), None) => paths.push(format!("{} (missing in actual)", new_path)),
                        (None, Some(_)) => paths.push(format!("{} (extra in actual)", new_path)),
                        (None, None) => {}
                    }
                }
            }
            (Value::Array(exp), Value::Array(act)) => {
                for (i, (exp_val, act_val)) in exp.iter().zip(act.iter()).enumerate() {
                    if !self.values_match(exp_val, act_val) {
                        self.collect_diff_paths(exp_val, act_val, format!("{}[{}]", path, i), paths);
                    }
                }

                if exp.len() != act.len() {
                    paths.push(format!(
                        "{} (array length mismatch: {} vs {})",
                        path,
                        exp.len(),
                        act.len()
                    ));
                }
            }
            _ => {
                if !self.values_match(expected, actual) {
                    paths.push(if path.is_empty() { "<root>".to_string() } else { path });
                }
            }
        }
    }

    /// Create a simple text diff for error messages
    pub fn simple_diff(&self, expected: &str, actual: &str) -> String {
        let diff = TextDiff::from_lines(expected, actual);
        let mut output = String::new();

        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            output.push_str(&format!("{}{}", sign, change));
        }

        output
    }
}

/// Recursively sort object keys so rendered diffs do not depend on insertion order
pub fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

/// Remove a dotted path; arrays along the way apply the rest of the path to every element
fn remove_field(value: &mut Value, parts: &[&str]) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };

    match value {
        Value::Object(map) if rest.is_empty() => {
            map.remove(*first);
        }
        Value::Object(map) => {
            if let Some(next) = map.get_mut(*first) {
                remove_field(next, rest);
            }
        }
        Value::Array(items) => {
            for item in items {
                remove_field(item, parts);
            }
        }
        _ => {}
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
