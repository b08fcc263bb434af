use script::ast::{BinaryOperator, UnaryOperator};
use script::precedence::Precedence;

use crate::block::{Block, BlockId, Mutation};
use crate::generator::{Context, Generator, INDENT, Rule};
use crate::procedures::{self, DEFINE_RETURN};
use crate::workspace::Workspace;

/// Names of generated helper functions; claimed before any user name.
pub(super) const HELPER_NAMES: &[&str] = &["listsRepeat"];

const LISTS_REPEAT: &str = "\
function listsRepeat(value, n) {
  var array = [];
  for (var i = 0; i < n; i++) {
    array.push(value);
  }
  return array;
}
";

pub(super) fn register_standard(generator: &mut Generator) {
    // Literals
    generator.register("math_number", Rule::Value(math_number));
    generator.register("text", Rule::Value(text));
    generator.register("logic_boolean", Rule::Value(logic_boolean));
    generator.register("math_constant", Rule::Value(math_constant));
    generator.register("math_number_input", Rule::Value(math_number));

    // Arithmetic
    generator.register("math_arithmetic", Rule::Value(math_arithmetic));
    generator.register("math_single", Rule::Value(math_single));
    generator.register("math_trig", Rule::Value(math_trig));
    generator.register("math_arithmetic_es", Rule::Value(math_arithmetic));

    // Comparison and logic
    generator.register("logic_compare", Rule::Value(logic_compare));
    generator.register("logic_operation", Rule::Value(logic_operation));
    generator.register("logic_negate", Rule::Value(logic_negate));
    generator.register("math_compare_es", Rule::Value(logic_compare));

    // Control
    generator.register("controls_if", Rule::Statement(controls_if));
    generator.register("controls_repeat", Rule::Statement(controls_repeat));
    generator.register("controls_repeat_ext", Rule::Statement(controls_repeat_ext));
    generator.register("controls_whileUntil", Rule::Statement(controls_while_until));
    generator.register("controls_for", Rule::Statement(controls_for));
    generator.register("controls_forEach", Rule::Statement(controls_for_each));
    generator.register("controls_flow_statements", Rule::Statement(controls_flow_statements));

    // Procedures
    generator.register(procedures::DEFINE_NO_RETURN, Rule::Statement(procedure_definition));
    generator.register(procedures::DEFINE_RETURN, Rule::Statement(procedure_definition));
    generator.register(procedures::CALL_NO_RETURN, Rule::Statement(procedure_call_statement));
    generator.register(procedures::CALL_RETURN, Rule::Value(procedure_call));
    generator.register("procedures_ifreturn", Rule::Statement(procedure_if_return));

    // Variables
    generator.register("variables_get", Rule::Value(variables_get));
    generator.register("variables_set", Rule::Statement(variables_set));

    // Text
    generator.register("text_join", Rule::Value(text_join));
    generator.register("text_length", Rule::Value(text_length));
    generator.register("text_print", Rule::Statement(print_text));
    generator.register("text_prompt_ext", Rule::Value(text_prompt));

    // Lists
    generator.register("lists_create_with", Rule::Value(lists_create_with));
    generator.register("lists_repeat", Rule::Value(lists_repeat));
    generator.register("lists_length", Rule::Value(lists_length));
    generator.register("lists_isEmpty", Rule::Value(lists_is_empty));
    generator.register("lists_indexOf", Rule::Value(lists_index_of));

    // Output hooks
    generator.register("output_print", Rule::Statement(output_print));
    generator.register("output_answer", Rule::Statement(output_answer));
}

// ---------------------------------------------------------------------------
// Literal helpers
// ---------------------------------------------------------------------------

/// A number as script source. Negative literals are a unary minus in the
/// parser's eyes, so they report [`Precedence::Unary`].
pub fn number_literal(n: f64) -> (String, Precedence) {
    let precedence = if n.is_sign_negative() {
        Precedence::Unary
    } else {
        Precedence::Atomic
    };
    (format!("{n}"), precedence)
}

/// A single-quoted string literal.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// The value of `code` if it is a plain (possibly negative) number literal.
fn numeric_literal(code: &str) -> Option<f64> {
    if !code.chars().all(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | 'e' | '+')) {
        return None;
    }
    code.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Cheap to evaluate twice: a number literal or a bare identifier.
fn is_simple(code: &str) -> bool {
    numeric_literal(code).is_some()
        || (!code.is_empty() && code.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
}

fn field<'b>(block: &'b Block, name: &str) -> &'b str {
    block.field_text(name).unwrap_or_default()
}

fn binary(ctx: &mut Context<'_>, block: &Block, operator: BinaryOperator) -> (String, Precedence) {
    let precedence = operator.precedence();
    let a = ctx.value_to_code(block, "A", precedence);
    let b = ctx.value_to_code(block, "B", precedence.tighter());
    (format!("{a} {} {b}", operator.symbol()), precedence)
}

fn unary(ctx: &mut Context<'_>, block: &Block, socket: &str, operator: UnaryOperator) -> (String, Precedence) {
    let operand = ctx.value_to_code(block, socket, Precedence::Unary);
    // `- -x`, never `--x`
    let separator = if operator == UnaryOperator::Negation && operand.starts_with('-') { " " } else { "" };
    (format!("{}{separator}{operand}", operator.symbol()), Precedence::Unary)
}

fn math_call(ctx: &mut Context<'_>, block: &Block, function: &str, socket: &str) -> (String, Precedence) {
    let argument = ctx.value_to_code(block, socket, Precedence::None);
    (format!("Math.{function}({argument})"), Precedence::Atomic)
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn math_number(_ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    number_literal(block.field_number("NUM").unwrap_or(0.0))
}

fn text(_ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    (quote(field(block, "TEXT")), Precedence::Atomic)
}

fn logic_boolean(_ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let value = if field(block, "BOOL") == "TRUE" { "true" } else { "false" };
    (value.to_string(), Precedence::Atomic)
}

fn math_constant(_ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let (code, precedence) = match field(block, "CONSTANT") {
        "E" => ("Math.E", Precedence::Atomic),
        "GOLDEN_RATIO" => ("(1 + Math.sqrt(5)) / 2", Precedence::Multiplicative),
        "SQRT2" => ("Math.SQRT2", Precedence::Atomic),
        "SQRT1_2" => ("Math.SQRT1_2", Precedence::Atomic),
        "INFINITY" => ("Infinity", Precedence::Atomic),
        _ => ("Math.PI", Precedence::Atomic),
    };
    (code.to_string(), precedence)
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn math_arithmetic(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let operator = match field(block, "OP") {
        "MINUS" => BinaryOperator::Subtraction,
        "MULTIPLY" => BinaryOperator::Multiplication,
        "DIVIDE" => BinaryOperator::Division,
        "POWER" => {
            let base = ctx.value_to_code(block, "A", Precedence::None);
            let exponent = ctx.value_to_code(block, "B", Precedence::None);
            return (format!("Math.pow({base}, {exponent})"), Precedence::Atomic);
        }
        _ => BinaryOperator::Addition,
    };
    binary(ctx, block, operator)
}

fn math_single(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    match field(block, "OP") {
        "ABS" => math_call(ctx, block, "abs", "NUM"),
        "NEG" => unary(ctx, block, "NUM", UnaryOperator::Negation),
        "LN" => math_call(ctx, block, "log", "NUM"),
        "LOG10" => math_call(ctx, block, "log10", "NUM"),
        "EXP" => math_call(ctx, block, "exp", "NUM"),
        "POW10" => {
            let exponent = ctx.value_to_code(block, "NUM", Precedence::None);
            (format!("Math.pow(10, {exponent})"), Precedence::Atomic)
        }
        _ => math_call(ctx, block, "sqrt", "NUM"),
    }
}

/// Trig blocks take degrees.
fn math_trig(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let function = match field(block, "OP") {
        "COS" => "cos",
        "TAN" => "tan",
        _ => "sin",
    };
    let degrees = ctx.value_to_code(block, "NUM", Precedence::Multiplicative);
    (format!("Math.{function}({degrees} / 180 * Math.PI)"), Precedence::Atomic)
}

// ---------------------------------------------------------------------------
// Comparison and logic
// ---------------------------------------------------------------------------

fn logic_compare(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let operator = match field(block, "OP") {
        "NEQ" => BinaryOperator::Inequality,
        "LT" => BinaryOperator::LessThan,
        "LTE" => BinaryOperator::LessThanOrEqual,
        "GT" => BinaryOperator::GreaterThan,
        "GTE" => BinaryOperator::GreaterThanOrEqual,
        _ => BinaryOperator::Equality,
    };
    binary(ctx, block, operator)
}

fn logic_operation(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let operator = match field(block, "OP") {
        "OR" => BinaryOperator::LogicalOr,
        _ => BinaryOperator::LogicalAnd,
    };
    binary(ctx, block, operator)
}

fn logic_negate(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    unary(ctx, block, "BOOL", UnaryOperator::LogicalNot)
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

fn controls_if(ctx: &mut Context<'_>, block: &Block) -> String {
    let (else_if, has_else) = match block.mutation() {
        Mutation::Branches { else_if, has_else } => (*else_if, *has_else),
        _ => (0, false),
    };

    let mut code = String::new();
    for i in 0..=else_if {
        let condition = ctx.value_to_code(block, &format!("IF{i}"), Precedence::None);
        let branch = ctx.statement_to_code(block, &format!("DO{i}"));
        if i > 0 {
            code.push_str(" else ");
        }
        code.push_str(&format!("if ({condition}) {{\n{branch}}}"));
    }
    if has_else {
        let branch = ctx.statement_to_code(block, "ELSE");
        code.push_str(&format!(" else {{\n{branch}}}"));
    }
    code.push('\n');
    code
}

/// Repeat count fixed in a field.
fn controls_repeat(ctx: &mut Context<'_>, block: &Block) -> String {
    let (repeats, _) = number_literal(block.field_number("TIMES").unwrap_or(0.0).trunc());
    repeat_loop(ctx, block, repeats)
}

fn controls_repeat_ext(ctx: &mut Context<'_>, block: &Block) -> String {
    let repeats = ctx.value_to_code(block, "TIMES", Precedence::None);
    repeat_loop(ctx, block, repeats)
}

fn repeat_loop(ctx: &mut Context<'_>, block: &Block, repeats: String) -> String {
    let branch = ctx.statement_to_code(block, "DO");
    let counter = ctx.distinct_name("count");

    let mut code = String::new();
    let end = if is_simple(&repeats) {
        repeats
    } else {
        let end = ctx.distinct_name("count_end");
        code.push_str(&format!("var {end} = {repeats};\n"));
        end
    };
    code.push_str(&format!(
        "for (var {counter} = 0; {counter} < {end}; {counter}++) {{\n{branch}}}\n"
    ));
    code
}

fn controls_while_until(ctx: &mut Context<'_>, block: &Block) -> String {
    let condition = if field(block, "MODE") == "UNTIL" {
        let condition = ctx.value_to_code(block, "BOOL", Precedence::Unary);
        format!("!{condition}")
    } else {
        ctx.value_to_code(block, "BOOL", Precedence::None)
    };
    let branch = ctx.statement_to_code(block, "DO");
    format!("while ({condition}) {{\n{branch}}}\n")
}

fn controls_for(ctx: &mut Context<'_>, block: &Block) -> String {
    let variable = ctx.variable_name(field(block, "VAR"));
    let from = ctx.value_to_code(block, "FROM", Precedence::None);
    let to = ctx.value_to_code(block, "TO", Precedence::None);
    let by = ctx.value_to_code_or(block, "BY", Precedence::None, "1");
    let branch = ctx.statement_to_code(block, "DO");

    if let (Some(start), Some(end), Some(step)) = (numeric_literal(&from), numeric_literal(&to), numeric_literal(&by)) {
        // All bounds known: pick the direction now.
        let up = start <= end;
        let step = step.abs();
        let comparison = if up { "<=" } else { ">=" };
        let update = if step == 1.0 {
            if up { "++".to_string() } else { "--".to_string() }
        } else {
            format!(" {} {}", if up { "+=" } else { "-=" }, number_literal(step).0)
        };
        return format!(
            "for ({variable} = {from}; {variable} {comparison} {to}; {variable}{update}) {{\n{branch}}}\n"
        );
    }

    // Direction decided at run time; non-trivial bounds are evaluated once.
    let mut code = String::new();
    let start = bound(ctx, &mut code, from, &format!("{variable}_start"));
    let end = bound(ctx, &mut code, to, &format!("{variable}_end"));

    let increment = ctx.distinct_name(&format!("{variable}_inc"));
    match numeric_literal(&by) {
        Some(step) => code.push_str(&format!("var {increment} = {};\n", number_literal(step.abs()).0)),
        None => code.push_str(&format!("var {increment} = Math.abs({by});\n")),
    }
    code.push_str(&format!("if ({start} > {end}) {{\n{INDENT}{increment} = -{increment};\n}}\n"));
    code.push_str(&format!(
        "for ({variable} = {start}; ({increment} >= 0 && {variable} <= {end}) || ({increment} < 0 && {variable} >= {end}); {variable} += {increment}) {{\n{branch}}}\n"
    ));
    code
}

/// `value` itself when simple, otherwise a temporary holding it.
fn bound(ctx: &mut Context<'_>, code: &mut String, value: String, base: &str) -> String {
    if is_simple(&value) {
        return value;
    }
    let name = ctx.distinct_name(base);
    code.push_str(&format!("var {name} = {value};\n"));
    name
}

fn controls_for_each(ctx: &mut Context<'_>, block: &Block) -> String {
    let variable = ctx.variable_name(field(block, "VAR"));
    let list = ctx.value_to_code(block, "LIST", Precedence::None);
    let branch = ctx.statement_to_code(block, "DO");
    format!("for ({variable} of {list}) {{\n{branch}}}\n")
}

fn controls_flow_statements(_ctx: &mut Context<'_>, block: &Block) -> String {
    match field(block, "FLOW") {
        "CONTINUE" => "continue;\n".to_string(),
        _ => "break;\n".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Procedures
// ---------------------------------------------------------------------------

fn procedure_definition(ctx: &mut Context<'_>, block: &Block) -> String {
    let name = ctx.procedure_name(field(block, "NAME"));
    let params: Vec<String> = match block.mutation() {
        Mutation::Definition { params } => params.iter().map(|p| ctx.variable_name(p)).collect(),
        _ => Vec::new(),
    };
    let branch = ctx.statement_to_code(block, "STACK");

    let mut code = format!("function {name}({}) {{\n{branch}", params.join(", "));
    if block.input("RETURN").is_some() {
        let value = ctx.value_to_code(block, "RETURN", Precedence::None);
        code.push_str(&format!("{INDENT}return {value};\n"));
    }
    code.push_str("}\n");
    code
}

fn procedure_call(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let (target, arity) = match block.mutation() {
        Mutation::Call { name, params } => (name.as_str(), params.len()),
        _ => ("", 0),
    };
    if !ctx.workspace().list_procedures().iter().any(|p| p.name == target) {
        tracing::debug!(block = %block.id(), target, "call to an undefined procedure");
    }

    let name = ctx.procedure_name(target);
    let arguments: Vec<String> = (0..arity)
        .map(|i| ctx.value_to_code(block, &format!("ARG{i}"), Precedence::None))
        .collect();
    (format!("{name}({})", arguments.join(", ")), Precedence::Atomic)
}

fn procedure_call_statement(ctx: &mut Context<'_>, block: &Block) -> String {
    let (call, _) = procedure_call(ctx, block);
    format!("{call};\n")
}

/// Type of the procedure definition enclosing `id`, if any.
fn enclosing_definition(workspace: &Workspace, id: BlockId) -> Option<&str> {
    let mut current = workspace.block(id)?.parent().map(|p| p.block());
    while let Some(parent) = current {
        let block = workspace.block(parent)?;
        if procedures::is_definition(block.type_name()) {
            return Some(block.type_name());
        }
        current = block.parent().map(|p| p.block());
    }
    None
}

fn procedure_if_return(ctx: &mut Context<'_>, block: &Block) -> String {
    let condition = ctx.value_to_code(block, "CONDITION", Precedence::None);
    let returns_value = enclosing_definition(ctx.workspace(), block.id()) == Some(DEFINE_RETURN);
    let statement = if returns_value {
        let value = ctx.value_to_code(block, "VALUE", Precedence::None);
        format!("return {value};")
    } else {
        "return;".to_string()
    };
    format!("if ({condition}) {{\n{INDENT}{statement}\n}}\n")
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

fn variables_get(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    (ctx.variable_name(field(block, "VAR")), Precedence::Atomic)
}

fn variables_set(ctx: &mut Context<'_>, block: &Block) -> String {
    let variable = ctx.variable_name(field(block, "VAR"));
    let value = ctx.value_to_code(block, "VALUE", Precedence::None);
    format!("{variable} = {value};\n")
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn item_count(block: &Block) -> usize {
    match block.mutation() {
        Mutation::Items(count) => *count,
        _ => 0,
    }
}

fn text_join(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let parts: Vec<String> = (0..item_count(block))
        .map(|i| {
            let item = ctx.value_to_code(block, &format!("ADD{i}"), Precedence::None);
            format!("String({item})")
        })
        .collect();
    match parts.len() {
        0 => ("''".to_string(), Precedence::Atomic),
        1 => (parts.concat(), Precedence::Atomic),
        _ => (parts.join(" + "), Precedence::Additive),
    }
}

fn text_length(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let value = ctx.value_to_code(block, "VALUE", Precedence::None);
    (format!("String({value}).length"), Precedence::Atomic)
}

fn print_text(ctx: &mut Context<'_>, block: &Block) -> String {
    let value = ctx.value_to_code(block, "TEXT", Precedence::None);
    format!("__print({value});\n")
}

fn text_prompt(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let message = ctx.value_to_code(block, "TEXT", Precedence::None);
    let code = if field(block, "TYPE") == "NUMBER" {
        format!("Number(prompt({message}))")
    } else {
        format!("prompt({message})")
    };
    (code, Precedence::Atomic)
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

fn lists_create_with(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let items: Vec<String> = (0..item_count(block))
        .map(|i| ctx.value_to_code(block, &format!("ADD{i}"), Precedence::None))
        .collect();
    (format!("[{}]", items.join(", ")), Precedence::Atomic)
}

fn lists_repeat(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    ctx.require_helper("listsRepeat", LISTS_REPEAT);
    let item = ctx.value_to_code(block, "ITEM", Precedence::None);
    let times = ctx.value_to_code(block, "NUM", Precedence::None);
    (format!("listsRepeat({item}, {times})"), Precedence::Atomic)
}

fn lists_length(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let list = ctx.value_to_code_or(block, "VALUE", Precedence::Atomic, "[]");
    (format!("{list}.length"), Precedence::Atomic)
}

fn lists_is_empty(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let list = ctx.value_to_code_or(block, "VALUE", Precedence::Atomic, "[]");
    (format!("!{list}.length"), Precedence::Unary)
}

/// One-based position, 0 when absent.
fn lists_index_of(ctx: &mut Context<'_>, block: &Block) -> (String, Precedence) {
    let method = if field(block, "END") == "LAST" { "lastIndexOf" } else { "indexOf" };
    let list = ctx.value_to_code(block, "VALUE", Precedence::Atomic);
    let item = ctx.value_to_code(block, "FIND", Precedence::None);
    (format!("{list}.{method}({item}) + 1"), Precedence::Additive)
}

// ---------------------------------------------------------------------------
// Output hooks
// ---------------------------------------------------------------------------

fn output_print(ctx: &mut Context<'_>, block: &Block) -> String {
    let value = ctx.value_to_code(block, "VALUE", Precedence::None);
    format!("__print({value});\n")
}

fn output_answer(ctx: &mut Context<'_>, block: &Block) -> String {
    let value = ctx.value_to_code(block, "ANSWER", Precedence::None);
    format!("__setAnswer({value});\n")
}
