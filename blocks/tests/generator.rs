use blocks::catalog::BlockSpec;
use blocks::generator::GenerationDiagnostic;
use blocks::{BlockCatalog, BlockId, FieldValue, Generator, Mutation, ValueKind, Workspace};
use pretty_assertions::assert_eq;
use script::precedence::Precedence;

fn generate(ws: &Workspace) -> String {
    Generator::standard().generate(ws).source
}

fn number(ws: &mut Workspace, n: f64) -> BlockId {
    let id = ws.create_block("math_number").unwrap();
    ws.set_field(id, "NUM", FieldValue::Number(n)).unwrap();
    id
}

fn text(ws: &mut Workspace, s: &str) -> BlockId {
    let id = ws.create_block("text").unwrap();
    ws.set_field(id, "TEXT", FieldValue::from(s)).unwrap();
    id
}

fn get(ws: &mut Workspace, name: &str) -> BlockId {
    let id = ws.create_block("variables_get").unwrap();
    ws.set_field(id, "VAR", FieldValue::from(name)).unwrap();
    id
}

fn arithmetic(ws: &mut Workspace, op: &str, a: BlockId, b: BlockId) -> BlockId {
    let id = ws.create_block("math_arithmetic").unwrap();
    ws.set_field(id, "OP", FieldValue::from(op)).unwrap();
    ws.connect_value(id, "A", a).unwrap();
    ws.connect_value(id, "B", b).unwrap();
    id
}

fn print(ws: &mut Workspace, value: BlockId) -> BlockId {
    let id = ws.create_block("output_print").unwrap();
    ws.connect_value(id, "VALUE", value).unwrap();
    id
}

#[test]
fn declared_answer_of_a_sum() {
    let mut ws = Workspace::default();
    let answer = ws.create_block("output_answer").unwrap();
    let five = number(&mut ws, 5.0);
    let three = number(&mut ws, 3.0);
    let sum = arithmetic(&mut ws, "ADD", five, three);
    ws.connect_value(answer, "ANSWER", sum).unwrap();

    assert_eq!(generate(&ws), "__setAnswer(5 + 3);\n");
}

#[test]
fn parentheses_follow_precedence() {
    let mut ws = Workspace::default();

    // 2 + 3 * 4
    let two = number(&mut ws, 2.0);
    let three = number(&mut ws, 3.0);
    let four = number(&mut ws, 4.0);
    let product = arithmetic(&mut ws, "MULTIPLY", three, four);
    let sum = arithmetic(&mut ws, "ADD", two, product);
    print(&mut ws, sum);

    // (2 + 3) * 4
    let two = number(&mut ws, 2.0);
    let three = number(&mut ws, 3.0);
    let four = number(&mut ws, 4.0);
    let sum = arithmetic(&mut ws, "ADD", two, three);
    let product = arithmetic(&mut ws, "MULTIPLY", sum, four);
    print(&mut ws, product);

    // 10 - (4 - 3), the right operand of a left-associative operator
    let ten = number(&mut ws, 10.0);
    let four = number(&mut ws, 4.0);
    let three = number(&mut ws, 3.0);
    let inner = arithmetic(&mut ws, "MINUS", four, three);
    let outer = arithmetic(&mut ws, "MINUS", ten, inner);
    print(&mut ws, outer);

    assert_eq!(
        generate(&ws),
        "__print(2 + 3 * 4);\n\n__print((2 + 3) * 4);\n\n__print(10 - (4 - 3));\n"
    );
}

#[test]
fn precedence_table_records_every_value_block() {
    let mut ws = Workspace::default();
    let answer = ws.create_block("output_answer").unwrap();
    let a = number(&mut ws, 1.0);
    let b = number(&mut ws, -2.0);
    let sum = arithmetic(&mut ws, "MINUS", a, b);
    ws.connect_value(answer, "ANSWER", sum).unwrap();

    let program = Generator::standard().generate(&ws);
    assert_eq!(program.source, "__setAnswer(1 - -2);\n");
    assert_eq!(program.precedences.get(&sum), Some(&Precedence::Additive));
    assert_eq!(program.precedences.get(&a), Some(&Precedence::Atomic));
    assert_eq!(program.precedences.get(&b), Some(&Precedence::Unary));
}

#[test]
fn missing_inputs_become_defaults() {
    let mut ws = Workspace::default();
    let answer = ws.create_block("output_answer").unwrap();
    let print = ws.create_block("output_print").unwrap();
    let negate = ws.create_block("logic_negate").unwrap();
    ws.connect_value(print, "VALUE", negate).unwrap();
    ws.connect_statement(print, answer).unwrap();
    let empty_list = ws.create_block("lists_create_with").unwrap();
    ws.set_mutation(empty_list, Mutation::Items(0)).unwrap();
    let length = ws.create_block("lists_length").unwrap();
    ws.connect_value(length, "VALUE", empty_list).unwrap();

    assert_eq!(generate(&ws), "__print(!false);\n__setAnswer(0);\n\n[].length;\n");
}

#[test]
fn function_definition_with_return() {
    let mut ws = Workspace::default();
    let def = ws.create_block("procedures_defreturn").unwrap();
    ws.set_field(def, "NAME", FieldValue::from("doble")).unwrap();
    ws.set_mutation(def, Mutation::Definition { params: vec!["n".into()] }).unwrap();
    let n = get(&mut ws, "n");
    let two = number(&mut ws, 2.0);
    let product = arithmetic(&mut ws, "MULTIPLY", n, two);
    ws.connect_value(def, "RETURN", product).unwrap();

    assert_eq!(generate(&ws), "var n;\n\nfunction doble(n) {\n  return n * 2;\n}\n");
}

#[test]
fn definitions_come_before_statements() {
    let mut ws = Workspace::default();
    let print = ws.create_block("output_print").unwrap();
    let def = ws.create_block("procedures_defnoreturn").unwrap();
    ws.set_field(def, "NAME", FieldValue::from("saluda")).unwrap();
    let hello = text(&mut ws, "hola");
    let body = ws.create_block("text_print").unwrap();
    ws.connect_value(body, "TEXT", hello).unwrap();
    ws.connect_body(def, "STACK", body).unwrap();
    let call = ws.create_procedure_call("saluda").unwrap();
    ws.connect_statement(print, call).unwrap();

    assert_eq!(
        generate(&ws),
        "function saluda() {\n  __print('hola');\n}\n\n__print('');\nsaluda();\n"
    );
}

#[test]
fn deleted_definition_leaves_a_dangling_call() {
    let mut ws = Workspace::default();
    let def = ws.create_block("procedures_defreturn").unwrap();
    ws.set_field(def, "NAME", FieldValue::from("doble")).unwrap();
    let call = ws.create_procedure_call("doble").unwrap();
    let answer = ws.create_block("output_answer").unwrap();
    ws.connect_value(answer, "ANSWER", call).unwrap();

    ws.delete_block(def).unwrap();
    let program = Generator::standard().generate(&ws);
    assert_eq!(program.source, "__setAnswer(doble());\n");
    assert!(program.diagnostics.is_empty());
}

#[test]
fn repeat_uses_distinct_counters() {
    let mut ws = Workspace::default();
    let outer = ws.create_block("controls_repeat_ext").unwrap();
    let three = number(&mut ws, 3.0);
    ws.connect_value(outer, "TIMES", three).unwrap();
    let inner = ws.create_block("controls_repeat_ext").unwrap();
    let two = number(&mut ws, 2.0);
    let one = number(&mut ws, 1.0);
    let times = arithmetic(&mut ws, "ADD", two, one);
    ws.connect_value(inner, "TIMES", times).unwrap();
    ws.connect_body(outer, "DO", inner).unwrap();
    let hi = text(&mut ws, "hi");
    let body = print(&mut ws, hi);
    ws.connect_body(inner, "DO", body).unwrap();

    assert_eq!(
        generate(&ws),
        "\
for (var count2 = 0; count2 < 3; count2++) {
  var count_end = 2 + 1;
  for (var count = 0; count < count_end; count++) {
    __print('hi');
  }
}
"
    );
}

#[test]
fn classroom_palette_blocks() {
    let mut ws = Workspace::default();
    let repeat = ws.create_block("controls_repeat").unwrap();
    ws.set_field(repeat, "TIMES", FieldValue::Number(4.0)).unwrap();

    let two = ws.create_block("math_number_input").unwrap();
    ws.set_field(two, "NUM", FieldValue::Number(2.0)).unwrap();
    let three = number(&mut ws, 3.0);
    let product = ws.create_block("math_arithmetic_es").unwrap();
    ws.set_field(product, "OP", FieldValue::from("MULTIPLY")).unwrap();
    ws.connect_value(product, "A", two).unwrap();
    ws.connect_value(product, "B", three).unwrap();

    let compare = ws.create_block("math_compare_es").unwrap();
    ws.set_field(compare, "OP", FieldValue::from("GT")).unwrap();
    ws.connect_value(compare, "A", product).unwrap();
    let five = number(&mut ws, 5.0);
    ws.connect_value(compare, "B", five).unwrap();
    let body = print(&mut ws, compare);
    ws.connect_body(repeat, "DO", body).unwrap();

    assert_eq!(
        generate(&ws),
        "\
for (var count = 0; count < 4; count++) {
  __print(2 * 3 > 5);
}
"
    );

    let word = text(&mut ws, "5");
    let other = ws.create_block("math_compare_es").unwrap();
    assert!(ws.connect_value(other, "A", word).is_err());
}

#[test]
fn counted_loop_with_literal_bounds() {
    let mut ws = Workspace::default();
    let for_block = ws.create_block("controls_for").unwrap();
    let from = number(&mut ws, 10.0);
    let to = number(&mut ws, 1.0);
    let by = number(&mut ws, 3.0);
    ws.connect_value(for_block, "FROM", from).unwrap();
    ws.connect_value(for_block, "TO", to).unwrap();
    ws.connect_value(for_block, "BY", by).unwrap();
    let i = get(&mut ws, "i");
    let body = print(&mut ws, i);
    ws.connect_body(for_block, "DO", body).unwrap();

    assert_eq!(
        generate(&ws),
        "var i;\n\nfor (i = 10; i >= 1; i -= 3) {\n  __print(i);\n}\n"
    );
}

#[test]
fn counted_loop_with_computed_bounds() {
    let mut ws = Workspace::default();
    let for_block = ws.create_block("controls_for").unwrap();
    let n = get(&mut ws, "n");
    let one = number(&mut ws, 1.0);
    let to = arithmetic(&mut ws, "MINUS", n, one);
    let from = number(&mut ws, 0.0);
    ws.connect_value(for_block, "FROM", from).unwrap();
    ws.connect_value(for_block, "TO", to).unwrap();

    assert_eq!(
        generate(&ws),
        "\
var i, n;

var i_end = n - 1;
var i_inc = 1;
if (0 > i_end) {
  i_inc = -i_inc;
}
for (i = 0; (i_inc >= 0 && i <= i_end) || (i_inc < 0 && i >= i_end); i += i_inc) {
}
"
    );
}

#[test]
fn if_else_chain() {
    let mut ws = Workspace::default();
    let if_block = ws.create_block("controls_if").unwrap();
    ws.set_mutation(if_block, Mutation::Branches { else_if: 1, has_else: true }).unwrap();
    let t = ws.create_block("logic_boolean").unwrap();
    ws.connect_value(if_block, "IF0", t).unwrap();
    let a = text(&mut ws, "a");
    let first = print(&mut ws, a);
    ws.connect_body(if_block, "DO0", first).unwrap();
    let b = text(&mut ws, "b");
    let last = print(&mut ws, b);
    ws.connect_body(if_block, "ELSE", last).unwrap();

    assert_eq!(
        generate(&ws),
        "if (true) {\n  __print('a');\n} else if (false) {\n} else {\n  __print('b');\n}\n"
    );
}

#[test]
fn names_are_sanitized_and_kept_off_reserved_words() {
    let mut ws = Workspace::default();
    let set = ws.create_block("variables_set").unwrap();
    ws.set_field(set, "VAR", FieldValue::from("mi variable")).unwrap();
    let five = number(&mut ws, 5.0);
    ws.connect_value(set, "VALUE", five).unwrap();
    let other = ws.create_block("variables_set").unwrap();
    ws.set_field(other, "VAR", FieldValue::from("for")).unwrap();
    ws.connect_statement(set, other).unwrap();

    assert_eq!(
        generate(&ws),
        "var mi_variable, for_;\n\nmi_variable = 5;\nfor_ = '';\n"
    );
}

#[test]
fn text_and_list_helpers() {
    let mut ws = Workspace::default();
    let join = ws.create_block("text_join").unwrap();
    let a = text(&mut ws, "a");
    let one = number(&mut ws, 1.0);
    ws.connect_value(join, "ADD0", a).unwrap();
    ws.connect_value(join, "ADD1", one).unwrap();
    print(&mut ws, join);

    let repeat = ws.create_block("lists_repeat").unwrap();
    let x = text(&mut ws, "x");
    let two = number(&mut ws, 2.0);
    ws.connect_value(repeat, "ITEM", x).unwrap();
    ws.connect_value(repeat, "NUM", two).unwrap();
    print(&mut ws, repeat);

    assert_eq!(
        generate(&ws),
        "\
function listsRepeat(value, n) {
  var array = [];
  for (var i = 0; i < n; i++) {
    array.push(value);
  }
  return array;
}

__print(String('a') + String(1));

__print(listsRepeat('x', 2));
"
    );
}

#[test]
fn unsupported_block_types_are_confined() {
    let mut catalog = BlockCatalog::standard();
    catalog.register(BlockSpec::statement("robot_move"));
    catalog.register(BlockSpec::value("robot_sensor", ValueKind::Number));
    let mut ws = Workspace::new(catalog);

    let answer = ws.create_block("output_answer").unwrap();
    let sensor = ws.create_block("robot_sensor").unwrap();
    ws.connect_value(answer, "ANSWER", sensor).unwrap();
    let mv = ws.create_block("robot_move").unwrap();

    let program = Generator::standard().generate(&ws);
    assert_eq!(
        program.source,
        "__setAnswer(/* unsupported block type: robot_sensor */ 0);\n\n// unsupported block type: robot_move\n"
    );
    assert_eq!(
        program.diagnostics,
        vec![
            GenerationDiagnostic::UnsupportedBlockType { block: sensor, type_name: "robot_sensor".into() },
            GenerationDiagnostic::UnsupportedBlockType { block: mv, type_name: "robot_move".into() },
        ]
    );
}

#[test]
fn every_standard_block_type_has_a_rule() {
    let generator = Generator::standard();
    for type_name in BlockCatalog::standard().type_names() {
        assert!(generator.has_rule(type_name), "no rule for {type_name}");
    }
}

#[test]
fn generated_source_parses() {
    let mut ws = Workspace::default();
    let def = ws.create_block("procedures_defreturn").unwrap();
    ws.set_mutation(def, Mutation::Definition { params: vec!["x".into()] }).unwrap();
    let x = get(&mut ws, "x");
    let neg = ws.create_block("math_single").unwrap();
    ws.set_field(neg, "OP", FieldValue::from("NEG")).unwrap();
    ws.connect_value(neg, "NUM", x).unwrap();
    let trig = ws.create_block("math_trig").unwrap();
    ws.connect_value(trig, "NUM", neg).unwrap();
    ws.connect_value(def, "RETURN", trig).unwrap();

    let guard = ws.create_block("procedures_ifreturn").unwrap();
    let cmp = ws.create_block("logic_compare").unwrap();
    ws.connect_value(guard, "CONDITION", cmp).unwrap();
    ws.connect_body(def, "STACK", guard).unwrap();

    let source = generate(&ws);
    assert!(source.contains("Math.sin(-x / 180 * Math.PI)"), "{source}");
    assert!(source.contains("if ('' == '') {\n    return '';\n  }"), "{source}");
    let parsed = script::parser::Parser::new(source.clone(), 0).parse();
    assert!(parsed.is_ok(), "{source}\n{parsed:?}");
}
