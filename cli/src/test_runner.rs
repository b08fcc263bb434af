use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use blocks::Generator;
use grader::{Exercise, answers_match};
use sandbox::{Sandbox, SandboxConfig};

use crate::workspace_file::{BlockEntry, WorkspaceFile};

const CASE_SUFFIX: &str = ".case.toml";

#[derive(Debug, Deserialize)]
pub struct CaseFile {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Script source to run as-is, instead of a workspace.
    #[serde(default)]
    pub source: Option<String>,

    /// Workspace blocks, in the workspace file format.
    #[serde(rename = "block", default)]
    pub blocks: Vec<BlockEntry>,

    /// If present, the program is graded against this exercise instead of
    /// just being run.
    #[serde(default)]
    pub exercise: Option<Exercise>,

    /// Expected output lines, joined with newlines (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected declared answer, within the grading tolerance. `nan` expects NaN.
    #[serde(default)]
    pub expect_answer: Option<f64>,

    /// An `Error...` output line must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Building the workspace must fail with an error containing this substring.
    #[serde(default)]
    pub expect_graph_error: Option<String>,

    /// Expected grading verdict. Requires `exercise`.
    #[serde(default)]
    pub expect_correct: Option<bool>,

    /// Substrings the generated source must contain.
    #[serde(default)]
    pub expect_source_contains: Vec<String>,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

/// What a case produced: the lines the learner would see and the answer.
struct Observed {
    output_lines: Vec<String>,
    declared_answer: Option<f64>,
    correct: Option<bool>,
    fault: Option<String>,
}

fn run_single_test(path: &Path, config: &SandboxConfig) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let case: CaseFile = match toml::from_str(&content) {
        Ok(case) => case,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("TOML parse error: {}", e)),
            };
        }
    };

    let outcome = match run_case(&case, config) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };
    TestResult {
        path: path.to_path_buf(),
        description: case.description,
        outcome,
    }
}

/// Run one case. `Err` carries the reason it failed.
fn run_case(case: &CaseFile, config: &SandboxConfig) -> Result<(), String> {
    // 1. Obtain the program source
    let source = match (&case.source, case.blocks.is_empty()) {
        (Some(_), false) => return Err("a case has either `source` or `[[block]]` tables, not both".into()),
        (Some(source), true) => source.clone(),
        (None, _) => {
            let file = WorkspaceFile {
                blocks: case.blocks.clone(),
            };
            match (file.build(), &case.expect_graph_error) {
                (Err(err), Some(expected)) if err.contains(expected.as_str()) => return Ok(()),
                (Err(err), Some(expected)) => {
                    return Err(format!("expected workspace error containing \"{}\", got: {}", expected, err));
                }
                (Err(err), None) => return Err(format!("unexpected workspace error: {}", err)),
                (Ok(_), Some(expected)) => {
                    return Err(format!(
                        "expected workspace error containing \"{}\", but the workspace was built",
                        expected
                    ));
                }
                (Ok(workspace), None) => Generator::standard().generate(&workspace).source,
            }
        }
    };

    // 2. Check the generated source
    for fragment in &case.expect_source_contains {
        if !source.contains(fragment.as_str()) {
            return Err(format!(
                "generated source does not contain \"{}\"\n  source:\n{}",
                fragment,
                indent(&source)
            ));
        }
    }

    // 3. Run or grade
    let mut sandbox = Sandbox::new(config.clone());
    let observed = match &case.exercise {
        Some(exercise) => {
            let verification = grader::verify(&mut sandbox, &source, exercise).map_err(|e| e.to_string())?;
            Observed {
                output_lines: verification.output_lines,
                declared_answer: verification.declared_answer,
                correct: Some(verification.correct),
                fault: None,
            }
        }
        None => {
            let outcome = sandbox.run(&source);
            Observed {
                output_lines: outcome.output_lines,
                declared_answer: outcome.declared_answer,
                correct: None,
                fault: outcome.fault.map(|f| f.to_string()),
            }
        }
    };

    // 4. Check error/output expectations
    match (&case.expect_error, &observed.fault) {
        (Some(expected), _) => {
            let found = observed
                .output_lines
                .iter()
                .any(|line| line.starts_with("Error") && line.contains(expected.as_str()));
            if !found {
                return Err(format!(
                    "expected an error line containing \"{}\"\n  output:\n{}",
                    expected,
                    indent(&observed.output_lines.join("\n"))
                ));
            }
        }
        (None, Some(fault)) => return Err(format!("unexpected runtime error: {}", fault)),
        (None, None) => {}
    }

    if let Some(expected) = &case.expect_output {
        let actual = observed.output_lines.join("\n");
        if actual.trim() != expected.trim() {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    // 5. Check answer and verdict
    if let Some(expected) = case.expect_answer {
        let matches = match observed.declared_answer {
            Some(actual) if expected.is_nan() => actual.is_nan(),
            Some(actual) => answers_match(actual, expected),
            None => false,
        };
        if !matches {
            return Err(format!(
                "expected answer {}, got {}",
                expected,
                observed
                    .declared_answer
                    .map_or_else(|| "no answer".to_string(), |a| a.to_string())
            ));
        }
    }

    if let Some(expected) = case.expect_correct {
        match observed.correct {
            None => return Err("`expect_correct` needs an `[exercise]`".into()),
            Some(correct) if correct != expected => {
                return Err(format!(
                    "expected the exercise to be {}, but it was {}\n  output:\n{}",
                    verdict(expected),
                    verdict(correct),
                    indent(&observed.output_lines.join("\n"))
                ));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

fn verdict(correct: bool) -> &'static str {
    if correct { "correct" } else { "incorrect" }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}", line)).collect::<Vec<_>>().join("\n")
}

/// Discover `.case.toml` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
/// Returns a BTreeMap so categories are sorted alphabetically.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && name.ends_with(CASE_SUFFIX)
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_for<'a>(result: &'a TestResult, path: &'a Path) -> &'a str {
    result
        .description
        .as_deref()
        .unwrap_or_else(|| path.file_name().and_then(|s| s.to_str()).unwrap_or("?").trim_end_matches(CASE_SUFFIX))
}

fn print_failures(failures: &[TestResult]) {
    eprintln!();
    eprintln!("failures:");
    for f in failures {
        eprintln!();
        eprintln!("  --- {} ---", f.path.display());
        if let TestOutcome::Fail(reason) = &f.outcome {
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

fn print_summary(passed: usize, failed: usize, no_color: bool) -> i32 {
    eprintln!();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let label = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            label,
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Run all `.case.toml` files under `path` (or a single file).
/// If `categories` is non-empty, only run cases in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String], config: &SandboxConfig) -> i32 {
    // Single file mode — ignore categories
    if path.is_file() {
        let result = run_single_test(path, config);
        return match &result.outcome {
            TestOutcome::Pass => {
                eprintln!("  {}  {}", pass_label(no_color), label_for(&result, path));
                print_summary(1, 0, no_color)
            }
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", fail_label(no_color), label_for(&result, path));
                print_failures(std::slice::from_ref(&result));
                print_summary(0, 1, no_color)
            }
        };
    }

    let all_categories = discover_categorized(path);

    if all_categories.is_empty() {
        eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
        return 1;
    }

    let run_categories = select_categories(&all_categories, categories);
    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        let header = if cat.is_empty() { "(root)" } else { cat };
        eprintln!();
        eprintln!("{}", bold(header, no_color));

        for file in *files {
            let result = run_single_test(file, config);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_for(&result, file));
                }
                TestOutcome::Fail(_) => {
                    failed += 1;
                    eprintln!("  {}  {}", fail_label(no_color), label_for(&result, file));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        print_failures(&failures);
    }
    print_summary(passed, failed, no_color)
}

/// Categories to run: all of them, or those named (a name also selects its
/// sub-folders).
fn select_categories<'a>(
    all_categories: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all_categories.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all_categories {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all_categories
                    .keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}
