//! The registry of block types a workspace can hold.
//!
//! A [`BlockSpec`] describes the shape of one block type: its fields, its
//! input sockets and how the block connects (output value, or previous/next
//! statement links). Inputs that depend on a block's [`Mutation`] (list
//! items, else-if branches, call arguments) are described by a [`Variadic`]
//! rule and laid out by [`BlockSpec::layout`].

use std::collections::BTreeMap;
use std::fmt;

use crate::block::{FieldValue, Mutation};

/// The kind of value a block produces or a socket accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Boolean,
    Text,
    List,
    /// Untyped: accepts and is accepted by everything.
    Any,
}

impl ValueKind {
    /// Whether a socket of this kind may hold a block producing `output`.
    pub fn accepts(self, output: ValueKind) -> bool {
        self == ValueKind::Any || output == ValueKind::Any || self == output
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "Number",
            ValueKind::Boolean => "Boolean",
            ValueKind::Text => "Text",
            ValueKind::List => "List",
            ValueKind::Any => "Any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Value(ValueKind),
    Statement,
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketKind::Value(kind) => write!(f, "a {kind} value"),
            SocketKind::Statement => f.write_str("a statement"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Number,
    Text,
    Dropdown(Vec<String>),
    /// Names a workspace variable.
    Variable,
    /// Names a procedure; kept unique across definitions.
    ProcedureName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub default: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub name: String,
    pub kind: SocketKind,
}

/// Inputs laid out from the block's mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variadic {
    None,
    /// `ADD0..ADDn` value inputs of one kind.
    Items { kind: ValueKind, default: usize },
    /// `IF0/DO0..IFn/DOn` plus an optional `ELSE`.
    Branches,
    /// `ARG0..ARGn`, one per parameter of the called procedure.
    Arguments,
    /// No extra inputs; the mutation only carries parameter names.
    Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub type_name: String,
    pub fields: Vec<FieldSpec>,
    pub inputs: Vec<InputSpec>,
    pub variadic: Variadic,
    pub output: Option<ValueKind>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl BlockSpec {
    /// A value block producing `output`.
    pub fn value(type_name: &str, output: ValueKind) -> Self {
        BlockSpec {
            type_name: type_name.to_string(),
            fields: Vec::new(),
            inputs: Vec::new(),
            variadic: Variadic::None,
            output: Some(output),
            has_previous: false,
            has_next: false,
        }
    }

    /// A statement block with previous and next links.
    pub fn statement(type_name: &str) -> Self {
        BlockSpec {
            has_previous: true,
            has_next: true,
            output: None,
            ..BlockSpec::value(type_name, ValueKind::Any)
        }
    }

    /// A top-level block with no connections of its own (procedure definitions).
    pub fn top_level(type_name: &str) -> Self {
        BlockSpec {
            output: None,
            ..BlockSpec::value(type_name, ValueKind::Any)
        }
    }

    pub fn terminal(mut self) -> Self {
        self.has_next = false;
        self
    }

    pub fn number_field(self, name: &str, default: f64) -> Self {
        self.field(name, FieldKind::Number, FieldValue::Number(default))
    }

    pub fn text_field(self, name: &str, default: &str) -> Self {
        self.field(name, FieldKind::Text, default.into())
    }

    /// The first option is the default.
    pub fn dropdown(self, name: &str, options: &[&str]) -> Self {
        let default = options.first().copied().unwrap_or_default();
        let options = options.iter().map(|o| o.to_string()).collect();
        self.field(name, FieldKind::Dropdown(options), default.into())
    }

    pub fn variable_field(self, name: &str, default: &str) -> Self {
        self.field(name, FieldKind::Variable, default.into())
    }

    pub fn procedure_field(self, name: &str, default: &str) -> Self {
        self.field(name, FieldKind::ProcedureName, default.into())
    }

    fn field(mut self, name: &str, kind: FieldKind, default: FieldValue) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            default,
        });
        self
    }

    pub fn value_input(mut self, name: &str, kind: ValueKind) -> Self {
        self.inputs.push(InputSpec {
            name: name.to_string(),
            kind: SocketKind::Value(kind),
        });
        self
    }

    pub fn statement_input(mut self, name: &str) -> Self {
        self.inputs.push(InputSpec {
            name: name.to_string(),
            kind: SocketKind::Statement,
        });
        self
    }

    pub fn variadic(mut self, variadic: Variadic) -> Self {
        self.variadic = variadic;
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The mutation a freshly created block starts with.
    pub fn default_mutation(&self) -> Mutation {
        match self.variadic {
            Variadic::None => Mutation::None,
            Variadic::Items { default, .. } => Mutation::Items(default),
            Variadic::Branches => Mutation::Branches {
                else_if: 0,
                has_else: false,
            },
            Variadic::Arguments => Mutation::Call {
                name: String::new(),
                params: Vec::new(),
            },
            Variadic::Parameters => Mutation::Definition { params: Vec::new() },
        }
    }

    /// Whether `mutation` has the right shape for this block type.
    pub fn accepts_mutation(&self, mutation: &Mutation) -> bool {
        matches!(
            (self.variadic, mutation),
            (Variadic::None, Mutation::None)
                | (Variadic::Items { .. }, Mutation::Items(_))
                | (Variadic::Branches, Mutation::Branches { .. })
                | (Variadic::Arguments, Mutation::Call { .. })
                | (Variadic::Parameters, Mutation::Definition { .. })
        )
    }

    /// Input sockets of a block of this type carrying `mutation`.
    pub fn layout(&self, mutation: &Mutation) -> Vec<InputSpec> {
        let mut inputs = self.inputs.clone();
        let value = |name: String, kind: ValueKind| InputSpec {
            name,
            kind: SocketKind::Value(kind),
        };

        match (self.variadic, mutation) {
            (Variadic::Items { kind, .. }, Mutation::Items(count)) => {
                inputs.extend((0..*count).map(|i| value(format!("ADD{i}"), kind)));
            }
            (Variadic::Branches, Mutation::Branches { else_if, has_else }) => {
                for i in 0..=*else_if {
                    inputs.push(value(format!("IF{i}"), ValueKind::Boolean));
                    inputs.push(InputSpec {
                        name: format!("DO{i}"),
                        kind: SocketKind::Statement,
                    });
                }
                if *has_else {
                    inputs.push(InputSpec {
                        name: "ELSE".to_string(),
                        kind: SocketKind::Statement,
                    });
                }
            }
            (Variadic::Arguments, Mutation::Call { params, .. }) => {
                inputs.extend((0..params.len()).map(|i| value(format!("ARG{i}"), ValueKind::Any)));
            }
            _ => {}
        }

        inputs
    }
}

/// Block types known to a workspace, by type tag.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    specs: BTreeMap<String, BlockSpec>,
}

impl BlockCatalog {
    pub fn empty() -> Self {
        BlockCatalog::default()
    }

    /// Register (or replace) a block type.
    pub fn register(&mut self, spec: BlockSpec) {
        self.specs.insert(spec.type_name.clone(), spec);
    }

    pub fn spec(&self, type_name: &str) -> Option<&BlockSpec> {
        self.specs.get(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// The standard palette.
    pub fn standard() -> Self {
        use ValueKind::{Any, Boolean, List, Number, Text};

        let mut catalog = BlockCatalog::empty();
        let specs = [
            // Literals
            BlockSpec::value("math_number", Number).number_field("NUM", 0.0),
            BlockSpec::value("text", Text).text_field("TEXT", ""),
            BlockSpec::value("logic_boolean", Boolean).dropdown("BOOL", &["TRUE", "FALSE"]),
            BlockSpec::value("math_constant", Number)
                .dropdown("CONSTANT", &["PI", "E", "GOLDEN_RATIO", "SQRT2", "SQRT1_2", "INFINITY"]),
            BlockSpec::value("math_number_input", Number).number_field("NUM", 0.0),
            // Arithmetic
            BlockSpec::value("math_arithmetic", Number)
                .dropdown("OP", &["ADD", "MINUS", "MULTIPLY", "DIVIDE", "POWER"])
                .value_input("A", Number)
                .value_input("B", Number),
            BlockSpec::value("math_single", Number)
                .dropdown("OP", &["ROOT", "ABS", "NEG", "LN", "LOG10", "EXP", "POW10"])
                .value_input("NUM", Number),
            BlockSpec::value("math_trig", Number)
                .dropdown("OP", &["SIN", "COS", "TAN"])
                .value_input("NUM", Number),
            BlockSpec::value("math_arithmetic_es", Number)
                .dropdown("OP", &["ADD", "MINUS", "MULTIPLY", "DIVIDE"])
                .value_input("A", Number)
                .value_input("B", Number),
            // Comparison and logic
            BlockSpec::value("logic_compare", Boolean)
                .dropdown("OP", &["EQ", "NEQ", "LT", "LTE", "GT", "GTE"])
                .value_input("A", Any)
                .value_input("B", Any),
            BlockSpec::value("logic_operation", Boolean)
                .dropdown("OP", &["AND", "OR"])
                .value_input("A", Boolean)
                .value_input("B", Boolean),
            BlockSpec::value("logic_negate", Boolean).value_input("BOOL", Boolean),
            BlockSpec::value("math_compare_es", Boolean)
                .dropdown("OP", &["EQ", "NEQ", "GT", "LT", "GTE", "LTE"])
                .value_input("A", Number)
                .value_input("B", Number),
            // Control
            BlockSpec::statement("controls_if").variadic(Variadic::Branches),
            BlockSpec::statement("controls_repeat")
                .number_field("TIMES", 10.0)
                .statement_input("DO"),
            BlockSpec::statement("controls_repeat_ext")
                .value_input("TIMES", Number)
                .statement_input("DO"),
            BlockSpec::statement("controls_whileUntil")
                .dropdown("MODE", &["WHILE", "UNTIL"])
                .value_input("BOOL", Boolean)
                .statement_input("DO"),
            BlockSpec::statement("controls_for")
                .variable_field("VAR", "i")
                .value_input("FROM", Number)
                .value_input("TO", Number)
                .value_input("BY", Number)
                .statement_input("DO"),
            BlockSpec::statement("controls_forEach")
                .variable_field("VAR", "j")
                .value_input("LIST", List)
                .statement_input("DO"),
            BlockSpec::statement("controls_flow_statements")
                .dropdown("FLOW", &["BREAK", "CONTINUE"])
                .terminal(),
            // Procedures
            BlockSpec::top_level("procedures_defnoreturn")
                .procedure_field("NAME", "do_something")
                .statement_input("STACK")
                .variadic(Variadic::Parameters),
            BlockSpec::top_level("procedures_defreturn")
                .procedure_field("NAME", "do_something")
                .statement_input("STACK")
                .value_input("RETURN", Any)
                .variadic(Variadic::Parameters),
            BlockSpec::statement("procedures_callnoreturn").variadic(Variadic::Arguments),
            BlockSpec::value("procedures_callreturn", Any).variadic(Variadic::Arguments),
            BlockSpec::statement("procedures_ifreturn")
                .value_input("CONDITION", Boolean)
                .value_input("VALUE", Any),
            // Variables
            BlockSpec::value("variables_get", Any).variable_field("VAR", "item"),
            BlockSpec::statement("variables_set")
                .variable_field("VAR", "item")
                .value_input("VALUE", Any),
            // Text
            BlockSpec::value("text_join", Text).variadic(Variadic::Items { kind: Any, default: 2 }),
            BlockSpec::value("text_length", Number).value_input("VALUE", Any),
            BlockSpec::statement("text_print").value_input("TEXT", Any),
            BlockSpec::value("text_prompt_ext", Any)
                .dropdown("TYPE", &["TEXT", "NUMBER"])
                .value_input("TEXT", Text),
            // Lists
            BlockSpec::value("lists_create_with", List).variadic(Variadic::Items { kind: Any, default: 3 }),
            BlockSpec::value("lists_repeat", List)
                .value_input("ITEM", Any)
                .value_input("NUM", Number),
            BlockSpec::value("lists_length", Number).value_input("VALUE", Any),
            BlockSpec::value("lists_isEmpty", Boolean).value_input("VALUE", Any),
            BlockSpec::value("lists_indexOf", Number)
                .dropdown("END", &["FIRST", "LAST"])
                .value_input("VALUE", List)
                .value_input("FIND", Any),
            // Output
            BlockSpec::statement("output_print").value_input("VALUE", Any),
            BlockSpec::statement("output_answer").value_input("ANSWER", Number).terminal(),
        ];

        for spec in specs {
            catalog.register(spec);
        }
        catalog
    }
}
