//! Staged safety gates a well-typed [`Patch`] must pass before it may be applied.
//!
//! Gates run in a fixed order and halt at the first failing gate, because later
//! gates assume what earlier ones established (the line-range gate needs a readable
//! file, the content gate needs an in-bounds range):
//!
//! 1. **Status**: only `"approved"` patches proceed
//! 2. **Path safety**: no `..` in relative paths, target must sit under the workspace root
//! 3. **Existence / staleness**: file exists and matches its cached baseline hash, if any
//! 4. **Line range**: bounds and blast radius (all range errors are reported together)
//! 5. **Content safety**: size ceiling, mass-deletion guard, forbidden call patterns
//! 6. **Signature preservation**: warning-only rename heuristic
//!
//! The checks are pattern based. They catch obviously bad automated edits and are
//! one layer in front of the rollback stack, not a verifier. In particular the path
//! gate compares paths lexically and does not resolve symlinks, so a link inside the
//! workspace that points outside it is not detected.

use crate::core::config::PolicyLimits;
use crate::core::editor::line_count;
use crate::core::fs::{FileSystem, LocalFs};
use crate::patch::hash_cache::{sha256_hex, FileHashCache};
use crate::patch::schema::{Patch, APPROVED};
use regex::Regex;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Identifies the gate that halted validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gate {
    Status,
    PathSafety,
    Existence,
    Staleness,
    LineRange,
    ContentSafety,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub failed_gate: Option<Gate>,
}

impl ValidationResult {
    fn accept(warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings,
            failed_gate: None,
        }
    }

    fn reject(gate: Gate, errors: Vec<String>, warnings: Vec<String>) -> Self {
        log::debug!("Gate {gate:?} rejected patch: {}", errors.join("; "));
        Self {
            valid: false,
            errors,
            warnings,
            failed_gate: Some(gate),
        }
    }

    /// The file drifted from its recorded baseline
    pub fn is_stale(&self) -> bool {
        self.failed_gate == Some(Gate::Staleness)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathRejection {
    #[error("Path traversal detected in relative path")]
    Traversal,
    #[error("Path escapes workspace boundary")]
    EscapesWorkspace,
}

struct ForbiddenPattern {
    label: &'static str,
    regex: Regex,
}

static FORBIDDEN_PATTERNS: LazyLock<Vec<ForbiddenPattern>> = LazyLock::new(|| {
    [
        ("eval(", r"\beval\s*\("),
        ("exec(", r"\bexec\s*\("),
        ("__import__(", r"\b__import__\s*\("),
        ("subprocess.", r"\bsubprocess\."),
        ("os.system(", r"\bos\.system\s*\("),
        ("require('child_process')", r#"require\s*\(\s*['"]child_process['"]\s*\)"#),
        ("Function(", r"\bFunction\s*\("),
    ]
    .into_iter()
    .map(|(label, source)| ForbiddenPattern {
        label,
        regex: Regex::new(source).expect("forbidden pattern compiles"),
    })
    .collect()
});

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(import |from |require\()").expect("import pattern compiles"));
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(def |async def |function |class |export )").expect("declaration pattern compiles")
});
static ARROW_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=>\s*\{").expect("arrow pattern compiles"));
static DECLARED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(def|function|class)\s+(\w+)").expect("declared name pattern compiles")
});

/// Lexically collapse `.` and `..` without touching the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a patch's `file_path` against the workspace root.
///
/// Relative paths with a `..` segment are refused outright. The result must lie
/// strictly underneath `workspace_root`, which is made absolute first; containment
/// is compared component-wise after lexical normalization, with no symlink
/// resolution.
pub fn resolve_target(
    file_path: &str,
    workspace_root: &Path,
) -> std::result::Result<PathBuf, PathRejection> {
    let candidate = Path::new(file_path);
    let root = std::path::absolute(workspace_root)
        .map(|abs| normalize(&abs))
        .map_err(|_| PathRejection::EscapesWorkspace)?;
    if !root.has_root() {
        return Err(PathRejection::EscapesWorkspace);
    }

    let resolved = if candidate.is_absolute() {
        normalize(candidate)
    } else {
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(PathRejection::Traversal);
        }
        normalize(&root.join(candidate))
    };

    if resolved == root || !resolved.starts_with(&root) {
        return Err(PathRejection::EscapesWorkspace);
    }

    Ok(resolved)
}

fn count_imports(text: &str) -> usize {
    IMPORT_LINE.find_iter(text).count()
}

pub struct PolicyValidator {
    limits: PolicyLimits,
    fs: Arc<dyn FileSystem>,
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self::new(PolicyLimits::default(), Arc::new(LocalFs))
    }
}

impl PolicyValidator {
    /// Limits looser than the defaults are clamped back to them
    pub fn new(limits: PolicyLimits, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            limits: limits.clamped(),
            fs,
        }
    }

    pub fn validate(
        &self,
        patch: &Patch,
        workspace_root: &Path,
        cache: &FileHashCache,
    ) -> ValidationResult {
        let mut warnings = Vec::new();

        // Gate 1: status
        if !patch.is_approved() {
            return ValidationResult::reject(
                Gate::Status,
                vec![format!(
                    "Patch status is \"{}\", expected \"{APPROVED}\"",
                    patch.status
                )],
                warnings,
            );
        }

        // Gate 2: path safety
        let resolved = match resolve_target(&patch.file_path, workspace_root) {
            Ok(path) => path,
            Err(rejection) => {
                return ValidationResult::reject(
                    Gate::PathSafety,
                    vec![rejection.to_string()],
                    warnings,
                )
            }
        };

        // Gate 3: existence and staleness
        if !self.fs.exists(&resolved) {
            return ValidationResult::reject(
                Gate::Existence,
                vec![format!("File not found: {}", patch.file_path)],
                warnings,
            );
        }
        let bytes = match self.fs.read_all(&resolved) {
            Ok(bytes) => bytes,
            Err(e) => {
                return ValidationResult::reject(
                    Gate::Existence,
                    vec![format!("Cannot read {}: {e}", patch.file_path)],
                    warnings,
                )
            }
        };
        if let Some(cached) = cache.get(&resolved) {
            if cached != sha256_hex(&bytes) {
                return ValidationResult::reject(
                    Gate::Staleness,
                    vec!["File modified since last scan: hash mismatch".to_string()],
                    warnings,
                );
            }
        }
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                return ValidationResult::reject(
                    Gate::Existence,
                    vec![format!("File is not valid UTF-8: {}", patch.file_path)],
                    warnings,
                )
            }
        };

        // Gate 4: line range
        let total_lines = line_count(&content) as i64;
        let mut errors = Vec::new();
        if patch.line_start < 1 {
            errors.push("line_start < 1".to_string());
        }
        if patch.line_end < patch.line_start {
            errors.push("line_end < line_start".to_string());
        }
        if patch.line_end > total_lines + 1 {
            errors.push(format!(
                "line_end ({}) > total lines ({total_lines})",
                patch.line_end
            ));
        }
        let affected_ratio = patch.span() as f64 / total_lines as f64;
        if affected_ratio > self.limits.max_affected_ratio {
            errors.push(format!(
                "Patch affects {:.0}% of file (limit: {:.0}%)",
                affected_ratio * 100.0,
                self.limits.max_affected_ratio * 100.0
            ));
        }
        if !errors.is_empty() {
            return ValidationResult::reject(Gate::LineRange, errors, warnings);
        }

        // Gate 5: content safety
        let patch_bytes = patch.new_code.len();
        if patch_bytes > self.limits.max_patch_bytes {
            errors.push(format!(
                "Patch size {patch_bytes}B exceeds {}B limit",
                self.limits.max_patch_bytes
            ));
        }
        if patch.new_code.trim().is_empty()
            && patch.span() > i128::from(self.limits.max_empty_replacement_lines)
        {
            errors.push(format!(
                "Empty replacement for >{} line range (full deletion blocked)",
                self.limits.max_empty_replacement_lines
            ));
        }
        for pattern in FORBIDDEN_PATTERNS.iter() {
            if pattern.regex.is_match(&patch.new_code) {
                errors.push(format!(
                    "Forbidden pattern detected: {} ({})",
                    pattern.label,
                    pattern.regex.as_str()
                ));
            }
        }

        let lines: Vec<&str> = content.split('\n').collect();
        let first = (patch.line_start - 1) as usize;
        let last = (patch.line_end as usize).min(lines.len());
        let replaced = lines.get(first..last).unwrap_or_default().join("\n");
        let import_delta = count_imports(&replaced).abs_diff(count_imports(&patch.new_code));
        if import_delta > self.limits.max_import_delta {
            warnings.push(format!(
                "Import count changed by {import_delta} (threshold: {})",
                self.limits.max_import_delta
            ));
        }

        if !errors.is_empty() {
            return ValidationResult::reject(Gate::ContentSafety, errors, warnings);
        }

        // Gate 6: signature preservation
        let first_line = lines.get(first).map(|l| l.trim()).unwrap_or_default();
        if DECLARATION.is_match(first_line) || ARROW_FUNCTION.is_match(first_line) {
            if let Some(name) = DECLARED_NAME
                .captures(first_line)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str())
            {
                if !patch.new_code.contains(name) {
                    warnings.push(format!(
                        "Original function \"{name}\" not present in patch, possible rename"
                    ));
                }
            }
        }

        log::debug!(
            "Patch {} for {} passed all gates with {} warning(s)",
            patch.rule_id,
            resolved.display(),
            warnings.len()
        );
        ValidationResult::accept(warnings)
    }
}

/// Validate with the local file system and the default policy
pub fn validate_patch(
    patch: &Patch,
    workspace_root: &Path,
    cache: &FileHashCache,
) -> ValidationResult {
    PolicyValidator::default().validate(patch, workspace_root, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use tempfile::TempDir;

    /// Any file-system access fails the test
    struct UntouchableFs;

    impl FileSystem for UntouchableFs {
        fn exists(&self, path: &Path) -> bool {
            panic!("unexpected exists({})", path.display())
        }
        fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
            panic!("unexpected read_all({})", path.display())
        }
        fn write_all(&self, path: &Path, _bytes: &[u8]) -> Result<()> {
            panic!("unexpected write_all({})", path.display())
        }
    }

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|n| format!("value_{n} = {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn workspace_with(name: &str, content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (temp_dir, path)
    }

    fn patch(file_path: &str, line_start: i64, line_end: i64, new_code: &str) -> Patch {
        Patch {
            status: "approved".to_string(),
            rule_id: "RULE-1".to_string(),
            file_path: file_path.to_string(),
            line_start,
            line_end,
            new_code: new_code.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_unapproved_patch_stops_at_status_gate() {
        let mut p = patch("../missing.py", 0, 100, "eval(x)");
        p.status = "pending".to_string();

        let validator = PolicyValidator::new(PolicyLimits::default(), Arc::new(UntouchableFs));
        let result = validator.validate(&p, Path::new("/ws"), &FileHashCache::in_memory());

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("pending"));
        assert_eq!(result.failed_gate, Some(Gate::Status));
    }

    #[test]
    fn test_relative_traversal_rejected_before_io() {
        let validator = PolicyValidator::new(PolicyLimits::default(), Arc::new(UntouchableFs));
        for path in ["../etc/passwd", "src/../../secret.py", "src/.."] {
            let result = validator.validate(
                &patch(path, 1, 1, "x"),
                Path::new("/ws"),
                &FileHashCache::in_memory(),
            );
            assert!(!result.valid, "{path}");
            assert_eq!(result.errors, vec!["Path traversal detected in relative path"]);
            assert_eq!(result.failed_gate, Some(Gate::PathSafety));
        }
    }

    #[test]
    fn test_absolute_paths_must_stay_inside_workspace() {
        let root = Path::new("/ws/project");
        assert!(resolve_target("/ws/project/src/a.py", root).is_ok());
        assert_eq!(
            resolve_target("/etc/passwd", root),
            Err(PathRejection::EscapesWorkspace)
        );
        assert_eq!(
            resolve_target("/ws/project/../other/a.py", root),
            Err(PathRejection::EscapesWorkspace)
        );
        assert_eq!(
            resolve_target("/ws/project-evil/a.py", root),
            Err(PathRejection::EscapesWorkspace)
        );
        assert_eq!(
            resolve_target("/ws/project", root),
            Err(PathRejection::EscapesWorkspace)
        );
    }

    #[test]
    fn test_relative_root_is_made_absolute_before_containment() {
        for root in [".", "a/..", ""] {
            assert_eq!(
                resolve_target("/definitely/outside/secret.py", Path::new(root)),
                Err(PathRejection::EscapesWorkspace),
                "{root:?}"
            );
        }

        let (_temp_dir, path) = workspace_with("secret.py", &numbered_lines(4));
        let result = validate_patch(
            &patch(&path.to_string_lossy(), 2, 2, "x = 1"),
            Path::new("."),
            &FileHashCache::in_memory(),
        );
        assert!(!result.valid);
        assert_eq!(result.failed_gate, Some(Gate::PathSafety));
    }

    #[test]
    fn test_extreme_line_numbers_are_reported_not_panicked() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let cache = FileHashCache::in_memory();

        let result = validate_patch(&patch("a.py", -1, i64::MAX, ""), temp_dir.path(), &cache);
        assert!(!result.valid);
        assert_eq!(result.failed_gate, Some(Gate::LineRange));
        assert!(result.errors.contains(&"line_start < 1".to_string()));
        assert!(result.errors.iter().any(|e| e.contains("> total lines (10)")));
        assert!(result.errors.iter().any(|e| e.starts_with("Patch affects")));

        let inverted = validate_patch(&patch("a.py", i64::MAX, i64::MIN, ""), temp_dir.path(), &cache);
        assert_eq!(inverted.errors, vec!["line_end < line_start"]);
    }

    #[test]
    fn test_relative_paths_resolve_under_root() {
        assert_eq!(
            resolve_target("./src/a.py", Path::new("/ws")).unwrap(),
            PathBuf::from("/ws/src/a.py")
        );
    }

    #[test]
    fn test_missing_file_fails_existence_gate() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_patch(
            &patch("nope.py", 1, 1, "x"),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(!result.valid);
        assert_eq!(result.failed_gate, Some(Gate::Existence));
        assert!(result.errors[0].contains("File not found"));
    }

    #[test]
    fn test_hash_mismatch_is_stale() {
        let (temp_dir, path) = workspace_with("a.py", &numbered_lines(10));
        let mut cache = FileHashCache::in_memory();
        cache.set(&path, sha256_hex(b"something else")).unwrap();

        let result = validate_patch(&patch("a.py", 3, 4, "# ok"), temp_dir.path(), &cache);
        assert!(!result.valid);
        assert!(result.is_stale());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_baseline_is_tolerated() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let result = validate_patch(
            &patch("a.py", 3, 4, "# ok"),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_matching_baseline_passes() {
        let content = numbered_lines(10);
        let (temp_dir, path) = workspace_with("a.py", &content);
        let mut cache = FileHashCache::in_memory();
        cache.record_content(&path, content.as_bytes()).unwrap();

        let result = validate_patch(&patch("a.py", 3, 4, "# ok"), temp_dir.path(), &cache);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_half_the_file_is_allowed_more_is_not() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let cache = FileHashCache::in_memory();

        let at_limit = validate_patch(&patch("a.py", 1, 5, "# ok"), temp_dir.path(), &cache);
        assert!(at_limit.valid, "{:?}", at_limit.errors);

        let over = validate_patch(&patch("a.py", 1, 6, "# ok"), temp_dir.path(), &cache);
        assert!(!over.valid);
        assert_eq!(over.failed_gate, Some(Gate::LineRange));
        assert!(over.errors[0].contains("limit: 50%"));
    }

    #[test]
    fn test_whole_file_patch_mentions_limit() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let result = validate_patch(
            &patch("a.py", 1, 10, "# ok"),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("50%")));
    }

    #[test]
    fn test_range_errors_accumulate() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let cache = FileHashCache::in_memory();

        let inverted = validate_patch(&patch("a.py", 0, -1, "# ok"), temp_dir.path(), &cache);
        assert_eq!(
            inverted.errors,
            vec!["line_start < 1", "line_end < line_start"]
        );

        let past_end = validate_patch(&patch("a.py", 5, 12, "# ok"), temp_dir.path(), &cache);
        assert_eq!(past_end.errors.len(), 2);
        assert!(past_end.errors[0].contains("line_end (12) > total lines (10)"));
        assert!(past_end.errors[1].contains("80%"));
    }

    #[test]
    fn test_append_one_past_end_is_allowed() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let result = validate_patch(
            &patch("a.py", 11, 11, "value_11 = 11"),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_oversized_replacement_rejected() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let big = "x".repeat(10 * 1024 + 1);
        let result = validate_patch(
            &patch("a.py", 2, 2, &big),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(!result.valid);
        assert_eq!(result.failed_gate, Some(Gate::ContentSafety));
        assert!(result.errors[0].contains("10241B exceeds 10240B"));
    }

    #[test]
    fn test_blank_replacement_of_many_lines_blocked() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(20));
        let cache = FileHashCache::in_memory();

        let six = validate_patch(&patch("a.py", 1, 6, "  \n\t"), temp_dir.path(), &cache);
        assert!(!six.valid);
        assert!(six.errors[0].contains("full deletion blocked"));

        let five = validate_patch(&patch("a.py", 1, 5, ""), temp_dir.path(), &cache);
        assert!(five.valid, "{:?}", five.errors);
    }

    #[test]
    fn test_eval_is_named() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(10));
        let result = validate_patch(
            &patch("a.py", 3, 3, "result = eval(user_input)"),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("eval(")));
    }

    #[test]
    fn test_every_forbidden_pattern_matches() {
        let (temp_dir, _) = workspace_with("a.js", &numbered_lines(10));
        let cache = FileHashCache::in_memory();
        let samples = [
            "eval (code)",
            "exec(cmd)",
            "mod = __import__('os')",
            "subprocess.run(['ls'])",
            "os.system('rm -rf /')",
            "const cp = require( \"child_process\" )",
            "new Function('return 1')",
        ];
        for sample in samples {
            let result = validate_patch(&patch("a.js", 2, 2, sample), temp_dir.path(), &cache);
            assert!(!result.valid, "{sample}");
            assert!(result.errors[0].starts_with("Forbidden pattern detected"));
        }

        let harmless = validate_patch(
            &patch("a.js", 2, 2, "evaluate(x); executor.run()"),
            temp_dir.path(),
            &cache,
        );
        assert!(harmless.valid, "{:?}", harmless.errors);
    }

    #[test]
    fn test_import_delta_only_warns() {
        let (temp_dir, _) = workspace_with("a.py", &numbered_lines(20));
        let imports = (0..6)
            .map(|n| format!("import mod{n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let result = validate_patch(
            &patch("a.py", 1, 2, &imports),
            temp_dir.path(),
            &FileHashCache::in_memory(),
        );
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Import count changed by 6"));
    }

    #[test]
    fn test_renamed_function_warns() {
        let content = "import math\n\ndef compute(x):\n    return eval(x)\n\nprint(compute('1'))\n\n\n\n";
        let (temp_dir, _) = workspace_with("calc.py", content);
        let cache = FileHashCache::in_memory();

        let renamed = validate_patch(
            &patch("calc.py", 3, 4, "def calculate(x):\n    return float(x)"),
            temp_dir.path(),
            &cache,
        );
        assert!(renamed.valid, "{:?}", renamed.errors);
        assert_eq!(renamed.warnings.len(), 1);
        assert!(renamed.warnings[0].contains("\"compute\""));

        let kept = validate_patch(
            &patch("calc.py", 3, 4, "def compute(x):\n    return float(x)"),
            temp_dir.path(),
            &cache,
        );
        assert!(kept.valid);
        assert!(kept.warnings.is_empty());
    }

    #[test]
    fn test_scenario_small_comment_patch_is_valid() {
        let content = format!("{}\n", numbered_lines(10));
        let (temp_dir, path) = workspace_with("a.py", &content);
        let mut cache = FileHashCache::in_memory();
        cache.record_content(&path, content.as_bytes()).unwrap();

        let new_code = "# no-op: retained for audit trail only!!";
        assert_eq!(new_code.len(), 40);
        let result = validate_patch(&patch("a.py", 3, 4, new_code), temp_dir.path(), &cache);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }
}
