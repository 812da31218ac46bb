use regex::RegexBuilder;

use revu_core::error::{Result, RevuError};
use revu_core::types::{WorkerKind, WorkerResult};

/// Validates raw model output against the fixed worker result schema.
pub struct OutputValidator {
    /// Keys that must be present in the JSON output.
    pub required_keys: Vec<String>,
    /// Maximum allowed output length (characters).
    pub max_length: usize,
}

impl OutputValidator {
    /// Validator for a given worker's schema. All workers require
    /// `summary`; workers that rewrite text additionally require `output`.
    pub fn for_worker(kind: WorkerKind) -> Self {
        let required_keys = match kind {
            WorkerKind::LogicCheck | WorkerKind::StyleCheck => {
                vec!["summary".to_string(), "findings".to_string()]
            }
            WorkerKind::Format | WorkerKind::Report => {
                vec!["summary".to_string(), "output".to_string()]
            }
            WorkerKind::Diagram => {
                vec!["summary".to_string()]
            }
        };
        Self {
            required_keys,
            max_length: 100_000,
        }
    }

    /// Collect every schema issue in the output. Empty = valid.
    pub fn issues(&self, output: &str) -> Vec<String> {
        let mut issues = Vec::new();

        if output.len() > self.max_length {
            issues.push(format!(
                "Output exceeds max length: {} > {}",
                output.len(),
                self.max_length
            ));
        }

        if looks_like_refusal(output) {
            issues.push("Output is a refusal or error message, not a result".to_string());
        }

        match serde_json::from_str::<serde_json::Value>(output) {
            Ok(val) => {
                if let Some(obj) = val.as_object() {
                    for key in &self.required_keys {
                        if !obj.contains_key(key) {
                            issues.push(format!("Missing required key: '{}'", key));
                        }
                    }
                } else {
                    issues.push("Expected JSON object but got non-object".to_string());
                }
            }
            Err(e) => {
                issues.push(format!("Output is not valid JSON: {}", e));
            }
        }

        issues
    }
}

/// Repair raw model text and parse it into a [`WorkerResult`].
///
/// Heuristic repair (code-fence stripping, brace balancing) is applied
/// first; a remaining schema violation is an `OutputValidation` error,
/// which the engine surfaces into state rather than raising.
pub fn parse_worker_result(kind: WorkerKind, raw: &str) -> Result<WorkerResult> {
    let repaired = heuristic_repair(raw);

    let validator = OutputValidator::for_worker(kind);
    let issues = validator.issues(&repaired);
    if !issues.is_empty() {
        return Err(RevuError::OutputValidation {
            worker: kind,
            issues,
        });
    }

    // Validation guarantees this is a JSON object with the required keys.
    let obj: serde_json::Value = serde_json::from_str(&repaired)?;
    let summary = obj
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let findings = obj
        .get("findings")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let output = obj
        .get("output")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(WorkerResult {
        worker: kind,
        summary,
        findings,
        output,
    })
}

/// Refusal/apology text masquerading as output is rejected outright.
pub(crate) fn looks_like_refusal(output: &str) -> bool {
    const PATTERNS: [&str; 4] = [r"^Error:", r"^I apologize", r"^I cannot", r"^I don't"];
    PATTERNS.iter().any(|p| {
        RegexBuilder::new(p)
            .multi_line(true)
            .case_insensitive(true)
            .build()
            .map(|re| re.is_match(output.trim()))
            .unwrap_or(false)
    })
}

/// Apply heuristic repairs to output.
/// - Strips markdown code fences
/// - Balances JSON braces
/// - Trims whitespace
pub fn heuristic_repair(output: &str) -> String {
    let mut result = strip_code_fences(output);
    result = result.trim().to_string();

    if result.starts_with('{') || result.starts_with('[') {
        result = balance_braces(&result);
    }

    result
}

/// Strip markdown code fences from text.
pub(crate) fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    // Try ```json ... ``` first
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    // Try ``` ... ```
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip optional language tag on same line
        let content_start = after.find('\n').map_or(0, |p| p + 1);
        let after = &after[content_start..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Balance JSON braces/brackets by appending missing closers.
fn balance_braces(text: &str) -> String {
    let mut brace_depth: i32 = 0;
    let mut bracket_depth: i32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in text.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            '{' => brace_depth += 1,
            '}' => brace_depth -= 1,
            '[' => bracket_depth += 1,
            ']' => bracket_depth -= 1,
            _ => {}
        }
    }

    let mut result = text.to_string();
    for _ in 0..bracket_depth {
        result.push(']');
    }
    for _ in 0..brace_depth {
        result.push('}');
    }
    result
}
