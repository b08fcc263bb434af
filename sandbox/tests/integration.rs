use pretty_assertions::assert_eq;
use sandbox::{Ambient, RuntimeError, RuntimeValue, Sandbox, SandboxConfig};

fn run(source: &str) -> Vec<String> {
    Sandbox::default().run(source).output_lines
}

fn run_joined(source: &str) -> String {
    run(source).join("\n")
}

fn answer(source: &str) -> Option<f64> {
    Sandbox::default().execute(source).expect("execution failed").declared_answer
}

fn fault(source: &str) -> RuntimeError {
    Sandbox::default().execute(source).expect_err("expected a fault").error
}

fn limited(step_limit: u64, max_call_depth: usize) -> Sandbox {
    Sandbox::new(SandboxConfig {
        step_limit,
        max_call_depth,
        ..SandboxConfig::default()
    })
}

#[test]
fn arithmetic() {
    assert_eq!(run_joined("__print(2 + 3);"), "5");
    assert_eq!(run_joined("__print(10 - 4);"), "6");
    assert_eq!(run_joined("__print(3 * 7);"), "21");
    assert_eq!(run_joined("__print(15 / 2);"), "7.5");
    assert_eq!(run_joined("__print(10 % 3);"), "1");
}

#[test]
fn operator_precedence() {
    assert_eq!(run_joined("__print(2 + 3 * 4);"), "14");
    assert_eq!(run_joined("__print((2 + 3) * 4);"), "20");
    assert_eq!(run_joined("__print(10 - (4 - 3));"), "9");
    assert_eq!(run_joined("__print(1 - -2);"), "3");
}

#[test]
fn boolean_logic() {
    assert_eq!(run_joined("__print(true && false);"), "false");
    assert_eq!(run_joined("__print(true || false);"), "true");
    assert_eq!(run_joined("__print(5 == 5);"), "true");
    assert_eq!(run_joined("__print(5 != 3);"), "true");
    assert_eq!(run_joined("__print(!(3 > 5));"), "true");
    assert_eq!(run_joined("__print(0 || 'fallback');"), "fallback");
}

#[test]
fn stringification() {
    assert_eq!(
        run("__print(3.0);\n__print(0 / 1 - 0.5);\n__print('a' + 1);\n__print([1, 'b', true]);\n__print(undefined);\n__print();"),
        vec!["3", "-0.5", "a1", "1,b,true", "undefined", "undefined"]
    );
    assert_eq!(run_joined("__print(Math.sqrt(-1));"), "NaN");
    assert_eq!(run_joined("__print(Math.pow(10, 400));"), "Infinity");
}

#[test]
fn declared_answer_last_write_wins() {
    assert_eq!(answer("__setAnswer(5 + 3);"), Some(8.0));
    assert_eq!(answer("__setAnswer(1);\n__setAnswer(2);"), Some(2.0));
    assert_eq!(answer("__print(1);"), None);
}

#[test]
fn non_numeric_answer_is_nan() {
    let declared = answer("var ok = 5 > 3;\n__setAnswer(ok);").expect("answer declared");
    assert!(declared.is_nan());
}

#[test]
fn runs_are_isolated_and_idempotent() {
    let source = "var total;\nif (total == undefined) { total = 0; }\ntotal = total + 1;\n__print(total);\n__setAnswer(total);\nleak = 'x';\n";
    let mut sandbox = Sandbox::default();
    let first = sandbox.run(source);
    let second = sandbox.run(source);
    assert_eq!(first, second);
    assert_eq!(first.output_lines, vec!["1"]);

    let check = sandbox.run("__print(leak);");
    assert_eq!(check.output_lines, vec!["Error: leak is not defined"]);
}

#[test]
fn functions_and_hoisting() {
    let source = "__print(doble(21));\n\nfunction doble(n) {\n  return n * 2;\n}\n";
    assert_eq!(run_joined(source), "42");

    let source = "function f(a, b) {\n  return b;\n}\n__print(f(1));\n";
    assert_eq!(run_joined(source), "undefined");
}

#[test]
fn function_scopes_do_not_see_callers() {
    let source = "function inner() {\n  return secret;\n}\nfunction outer() {\n  var secret = 1;\n  return inner();\n}\nouter();\n";
    assert_eq!(fault(source), RuntimeError::ReferenceError("secret".into()));
}

#[test]
fn loops() {
    let source = "var count;\nfor (count = 0; count < 3; count++) {\n  __print(count);\n}\n";
    assert_eq!(run(source), vec!["0", "1", "2"]);

    let source = "var i = 0;\nwhile (true) {\n  i += 1;\n  if (i == 2) {\n    continue;\n  }\n  if (i > 3) {\n    break;\n  }\n  __print(i);\n}\n";
    assert_eq!(run(source), vec!["1", "3"]);

    let source = "var xs = [1, 2];\nfor (var x of xs) {\n  xs.push(x);\n  __print(x);\n}\n__print(xs.length);\n";
    assert_eq!(run(source), vec!["1", "2", "4"]);
}

#[test]
fn lists_are_shared() {
    let source = "var a = [];\nvar b = a;\nb.push(7);\n__print(a[0]);\n__print(a.indexOf(7) + 1);\n__print(a[5]);\n";
    assert_eq!(run(source), vec!["7", "1", "undefined"]);
}

#[test]
fn a_list_holding_itself_prints_and_compares() {
    let source = "var a = [1];\na.push(a);\n__print(a);\n__print(a == a);\n__print(a.indexOf(a));\n";
    assert_eq!(run(source), vec!["1,", "true", "1"]);
}

#[test]
fn top_level_return_is_the_completion() {
    let mut sandbox = Sandbox::default();
    let execution = sandbox
        .execute("function doble(n) {\n  return n * 2;\n}\n\nreturn doble(5);\n__print('unreachable');\n")
        .unwrap();
    assert_eq!(execution.completion, Some(RuntimeValue::Number(10.0)));
    assert!(execution.output_lines.is_empty());
}

#[test]
fn faults_keep_partial_output() {
    let outcome = Sandbox::default().run("__print('before');\n__print(doble(2));\n__print('after');\n");
    assert_eq!(outcome.output_lines, vec!["before", "Error: doble is not defined"]);
    let fault = outcome.fault.expect("fault reported");
    assert_eq!(fault.error.kind(), "ReferenceError");
    assert!(fault.span.is_some());
}

#[test]
fn fault_kinds() {
    assert_eq!(fault("__print(1 / 0);"), RuntimeError::DivisionByZero);
    assert_eq!(fault("var x = 5;\nx();"), RuntimeError::NotAFunction("x".into()));
    assert_eq!(fault("var a = [];\na.pop();"), RuntimeError::NotAFunction("a.pop".into()));
    assert_eq!(fault("break;"), RuntimeError::IllegalControlFlow("break"));
    assert_eq!(fault("y += 1;"), RuntimeError::ReferenceError("y".into()));
    assert!(matches!(fault("__print(true - 1);"), RuntimeError::TypeError(_)));
    assert!(matches!(fault("var u;\n__print(u.length);"), RuntimeError::TypeError(_)));
    assert!(matches!(fault("__print(1 +);"), RuntimeError::Syntax(_)));
}

#[test]
fn step_limit_stops_infinite_loops() {
    let outcome = limited(1_000, 64).run("__print('start');\nwhile (true) {\n}\n");
    assert_eq!(
        outcome.output_lines,
        vec![
            "start".to_string(),
            "Error: step limit of 1000 exceeded (is there an infinite loop?)".to_string()
        ]
    );
}

#[test]
fn call_depth_is_bounded() {
    let mut sandbox = limited(1_000_000, 16);
    let result = sandbox.execute("function f(n) {\n  return f(n + 1);\n}\nf(0);\n");
    assert_eq!(result.unwrap_err().error, RuntimeError::StackOverflow);

    let execution = sandbox
        .execute("function down(n) {\n  if (n == 0) {\n    return 0;\n  }\n  return down(n - 1);\n}\nreturn down(10);\n")
        .unwrap();
    assert_eq!(execution.completion, Some(RuntimeValue::Number(0.0)));
}

#[test]
fn runaway_recursion_faults_with_default_limits() {
    let outcome = Sandbox::default().run("__print('start');\nfunction f(n) {\n  return f(n + 1);\n}\nf(0);\n");
    assert_eq!(
        outcome.output_lines,
        vec!["start".to_string(), "Error: maximum call stack size exceeded".to_string()]
    );
    assert_eq!(outcome.fault.map(|f| f.error), Some(RuntimeError::StackOverflow));
}

#[test]
fn recursion_inside_nested_bodies_faults_with_default_limits() {
    let source = "\
function f(n) {
  if (n >= 0) {
    if (true) {
      for (var i = 0; i < 1; i++) {
        return 1 + f(n + 1) * 2;
      }
    }
  }
  return 0;
}
__print(f(0));
";
    let outcome = Sandbox::default().run(source);
    assert_eq!(outcome.output_lines, vec!["Error: maximum call stack size exceeded".to_string()]);
    let fault = outcome.fault.expect("a fault");
    assert_eq!(fault.error, RuntimeError::StackOverflow);
    assert!(fault.span.is_some());
}

#[test]
fn deep_expressions_are_bounded() {
    let sum = vec!["1"; 50].join(" + ");
    assert_eq!(run_joined(&format!("__print({sum});")), "50");

    let sum = vec!["1"; 400].join(" + ");
    assert_eq!(fault(&format!("__print({sum});")), RuntimeError::StackOverflow);
}

#[test]
fn moderate_recursion_fits_the_default_limits() {
    let execution = Sandbox::default()
        .execute("function down(n) {\n  if (n == 0) {\n    return 0;\n  }\n  return 1 + down(n - 1);\n}\nreturn down(40);\n")
        .unwrap();
    assert_eq!(execution.completion, Some(RuntimeValue::Number(40.0)));
}

struct Recording {
    prompts: Vec<String>,
}

impl Ambient for Recording {
    fn prompt(&mut self, message: &str) -> Option<String> {
        self.prompts.push(message.to_string());
        Some("host".to_string())
    }
    fn alert(&mut self, _message: &str) {}
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

#[test]
fn interactive_globals_get_canned_answers() {
    let config = SandboxConfig {
        prompt_response: "41".into(),
        ..SandboxConfig::default()
    };
    let mut sandbox = Sandbox::with_ambient(config, Box::new(Recording { prompts: Vec::new() }));

    let outcome = sandbox.run("var n = Number(prompt('edad?'));\nalert('hola');\n__print(n + 1);\n__print(confirm('seguro?'));\n");
    assert_eq!(outcome.output_lines, vec!["42", "false"]);

    // The embedder's ambient is back in place, and was never consulted.
    assert_eq!(sandbox.ambient_mut().prompt("again?"), Some("host".to_string()));
    assert!(sandbox.ambient_mut().confirm("?"));
}

#[test]
fn ambient_is_restored_after_a_fault() {
    let mut sandbox = Sandbox::with_ambient(SandboxConfig::default(), Box::new(Recording { prompts: Vec::new() }));
    let outcome = sandbox.run("prompt('x');\nmissing();\n");
    assert!(outcome.fault.is_some());
    assert_eq!(sandbox.ambient_mut().prompt("after"), Some("host".to_string()));
}

#[test]
fn math_and_conversions() {
    assert_eq!(
        run("__print(Math.max(1, 5, 3));\n__print(Math.round(2.5));\n__print(Math.floor(-1.5));\n__print(String(12) + 3);\n__print(Number('x'));\n__print(Math.PI > 3.14);"),
        vec!["5", "3", "-2", "123", "NaN", "true"]
    );
}
