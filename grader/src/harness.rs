//! Grading of generated programs against an exercise.
//!
//! Single-answer exercises run the program once and compare the declared
//! answer. Function exercises invoke the learner's function once per test
//! case, each invocation in a fresh sandbox run, and keep going after a
//! failing case so the full scoreboard is reported.

use sandbox::runtime_value::format_number;
use sandbox::{RuntimeValue, Sandbox};

use crate::exercise::{Exercise, ExerciseError, FunctionTest, Grading, TestCase};

/// Absolute tolerance for comparing numeric answers.
pub const ANSWER_TOLERANCE: f64 = 0.001;

/// Outcome of one function test case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub args: Vec<f64>,
    pub expected: f64,
    /// `None` when the invocation faulted.
    pub actual: Option<RuntimeValue>,
    pub passed: bool,
}

/// Result of running every test case of a function exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTestRun {
    pub results: Vec<TestResult>,
    pub output_lines: Vec<String>,
    /// The program does not define the function; nothing was invoked.
    pub missing_function: bool,
}

/// Everything the learner sees after checking a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub output_lines: Vec<String>,
    /// `Some` for function exercises, even when empty.
    pub test_results: Option<Vec<TestResult>>,
    pub declared_answer: Option<f64>,
    pub correct: bool,
    pub missing_function: bool,
}

pub fn answers_match(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < ANSWER_TOLERANCE
}

/// A missing answer never matches.
pub fn check_single_answer(declared: Option<f64>, expected: f64) -> bool {
    declared.is_some_and(|answer| answers_match(answer, expected))
}

/// Whether `source` contains a `function name(` definition.
pub fn defines_function(source: &str, name: &str) -> bool {
    source.contains(&format!("function {name}("))
}

/// Arguments rendered as script literals: `2, -1.5`.
pub fn render_args(args: &[f64]) -> String {
    args.iter().map(|&a| format_number(a)).collect::<Vec<_>>().join(", ")
}

/// The program followed by a top-level `return` of the call under test.
pub fn test_invocation(source: &str, function_name: &str, case: &TestCase) -> String {
    format!("{source}\nreturn {function_name}({});\n", render_args(&case.args))
}

pub fn run_function_tests(sandbox: &mut Sandbox, source: &str, test: &FunctionTest) -> FunctionTestRun {
    let name = &test.function_name;
    let mut output_lines = Vec::new();

    if !defines_function(source, name) {
        tracing::warn!(function = %name, "function not defined; skipping test cases");
        output_lines.push(format!("Error: function '{name}' was not found."));
        output_lines.push("Make sure you define a function with exactly that name.".to_string());
        return FunctionTestRun {
            results: Vec::new(),
            output_lines,
            missing_function: true,
        };
    }

    output_lines.push("Running tests...".to_string());
    let mut results = Vec::with_capacity(test.test_cases.len());
    for case in &test.test_cases {
        let invocation = test_invocation(source, name, case);
        // Whatever the function prints while under test is discarded.
        let actual = match sandbox.execute(&invocation) {
            Ok(execution) => Some(execution.completion.unwrap_or(RuntimeValue::Undefined)),
            Err(fault) => {
                output_lines.push(format!("Error in {name}({}): {fault}", render_args(&case.args)));
                None
            }
        };
        let passed = matches!(actual, Some(RuntimeValue::Number(n)) if answers_match(n, case.expected));
        tracing::debug!(function = %name, args = ?case.args, passed, "test case finished");
        results.push(TestResult {
            args: case.args.clone(),
            expected: case.expected,
            actual,
            passed,
        });
    }

    let passed = results.iter().filter(|r| r.passed).count();
    output_lines.push(format!("--- {passed}/{} tests passed ---", results.len()));
    FunctionTestRun {
        results,
        output_lines,
        missing_function: false,
    }
}

/// Grade `source` against `exercise`.
pub fn verify(sandbox: &mut Sandbox, source: &str, exercise: &Exercise) -> Result<Verification, ExerciseError> {
    let verification = match exercise.grading()? {
        Grading::SingleAnswer(expected) => {
            let outcome = sandbox.run(source);
            Verification {
                correct: check_single_answer(outcome.declared_answer, expected),
                output_lines: outcome.output_lines,
                test_results: None,
                declared_answer: outcome.declared_answer,
                missing_function: false,
            }
        }
        Grading::Function(test) => {
            let run = run_function_tests(sandbox, source, test);
            Verification {
                correct: all_passed(&run.results),
                output_lines: run.output_lines,
                test_results: Some(run.results),
                declared_answer: None,
                missing_function: run.missing_function,
            }
        }
    };
    tracing::debug!(exercise = exercise.id, correct = verification.correct, "verified");
    Ok(verification)
}

/// Zero results is never a pass.
pub fn all_passed(results: &[TestResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_strict() {
        assert!(answers_match(8.0, 8.0));
        assert!(answers_match(8.0009, 8.0));
        assert!(!answers_match(8.0015, 8.0));
        assert!(!answers_match(7.998, 8.0));
        assert!(!answers_match(f64::NAN, 8.0));
        assert!(!check_single_answer(None, 0.0));
        assert!(check_single_answer(Some(0.1 + 0.2), 0.3));
    }

    #[test]
    fn function_detection_is_textual() {
        assert!(defines_function("function doble(n) {\n}\n", "doble"));
        assert!(!defines_function("function doblete(n) {\n}\n", "doble"));
        assert!(!defines_function("var doble;\n", "doble"));
    }

    #[test]
    fn invocation_appends_a_return() {
        let case = TestCase {
            args: vec![2.0, -1.5],
            expected: 0.0,
        };
        assert_eq!(
            test_invocation("function f(a, b) {\n}\n", "f", &case),
            "function f(a, b) {\n}\n\nreturn f(2, -1.5);\n"
        );
    }

    #[test]
    fn no_results_is_not_a_pass() {
        assert!(!all_passed(&[]));
    }
}
