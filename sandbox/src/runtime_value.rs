use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use script::ast::FunctionDecl;

use crate::builtins::{Builtin, Method};

/// A list value. Lists are shared: copying a list value aliases it, so
/// `push` through one name is visible through every other.
pub type List = Rc<RefCell<Vec<RuntimeValue>>>;

/// A runtime value produced by evaluating an expression.
#[derive(Debug, Clone)]
pub enum RuntimeValue {
    Number(f64),
    Boolean(bool),
    String(String),
    List(List),
    Undefined,
    /// A function declared in the script.
    Function(Rc<FunctionDecl>),
    /// A host function (hooks, ambient globals, `Math.*`).
    Builtin(Builtin),
    /// A method looked up on a value, waiting to be called.
    Method(Box<RuntimeValue>, Method),
    /// The `Math` namespace object.
    Math,
}

impl RuntimeValue {
    pub fn list(items: Vec<RuntimeValue>) -> Self {
        RuntimeValue::List(Rc::new(RefCell::new(items)))
    }

    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    pub fn is_falsy(&self) -> bool {
        match self {
            RuntimeValue::Number(n) => *n == 0.0 || n.is_nan(),
            RuntimeValue::Boolean(b) => !b,
            RuntimeValue::String(s) => s.is_empty(),
            RuntimeValue::Undefined => true,
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Number(_) => "Number",
            RuntimeValue::Boolean(_) => "Boolean",
            RuntimeValue::String(_) => "Text",
            RuntimeValue::List(_) => "List",
            RuntimeValue::Undefined => "undefined",
            RuntimeValue::Function(_) | RuntimeValue::Builtin(_) | RuntimeValue::Method(..) => "Function",
            RuntimeValue::Math => "Object",
        }
    }

    /// Numeric conversion as done by `Number(v)`.
    pub fn to_number(&self) -> f64 {
        match self {
            RuntimeValue::Number(n) => *n,
            RuntimeValue::Boolean(b) => f64::from(u8::from(*b)),
            RuntimeValue::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }
}

/// Render a number the way script code prints it: `3`, `2.5`, `NaN`, `-Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Number(n) => f.write_str(&format_number(*n)),
            RuntimeValue::Boolean(b) => write!(f, "{}", b),
            RuntimeValue::String(s) => f.write_str(s),
            RuntimeValue::List(items) => write_list(f, items, &mut Vec::new()),
            RuntimeValue::Undefined => f.write_str("undefined"),
            RuntimeValue::Function(decl) => write!(f, "function {}() {{ [code] }}", decl.name),
            RuntimeValue::Builtin(builtin) => write!(f, "function {}() {{ [native code] }}", builtin.name()),
            RuntimeValue::Method(_, method) => write!(f, "function {}() {{ [native code] }}", method.name()),
            RuntimeValue::Math => f.write_str("[object Math]"),
        }
    }
}

type ListPtr = *const RefCell<Vec<RuntimeValue>>;

/// Holes print as nothing, and so does a list already being printed
/// further up, the way a script `join` handles a list containing itself.
fn write_list(f: &mut fmt::Formatter<'_>, list: &List, open: &mut Vec<ListPtr>) -> fmt::Result {
    if open.contains(&Rc::as_ptr(list)) {
        return Ok(());
    }
    open.push(Rc::as_ptr(list));
    for (i, item) in list.borrow().iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        match item {
            RuntimeValue::Undefined => {}
            RuntimeValue::List(inner) => write_list(f, inner, open)?,
            other => write!(f, "{}", other)?,
        }
    }
    open.pop();
    Ok(())
}

/// Structural equality: same type and same contents. Values of different
/// types are never equal, and `NaN` is not equal to itself.
impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

fn values_equal(a: &RuntimeValue, b: &RuntimeValue, open: &mut Vec<(ListPtr, ListPtr)>) -> bool {
    match (a, b) {
        (RuntimeValue::Number(a), RuntimeValue::Number(b)) => a == b,
        (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a == b,
        (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
        (RuntimeValue::List(a), RuntimeValue::List(b)) => lists_equal(a, b, open),
        (RuntimeValue::Undefined, RuntimeValue::Undefined) => true,
        (RuntimeValue::Function(a), RuntimeValue::Function(b)) => Rc::ptr_eq(a, b),
        (RuntimeValue::Builtin(a), RuntimeValue::Builtin(b)) => a == b,
        (RuntimeValue::Math, RuntimeValue::Math) => true,
        _ => false,
    }
}

/// A pair of lists met again while comparing them is assumed equal, so
/// lists that contain themselves compare by shape.
fn lists_equal(a: &List, b: &List, open: &mut Vec<(ListPtr, ListPtr)>) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
    if open.contains(&pair) {
        return true;
    }
    open.push(pair);
    let (left, right) = (a.borrow(), b.borrow());
    let equal = left.len() == right.len() && left.iter().zip(right.iter()).all(|(x, y)| values_equal(x, y, open));
    open.pop();
    equal
}
