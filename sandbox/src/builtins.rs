//! Host functions and properties visible to scripts.
//!
//! The intrinsic hooks and the interactive ambient functions need
//! interpreter state and are dispatched by the evaluator; everything here
//! is a pure function of its arguments.

use crate::error::RuntimeError;
use crate::runtime_value::{RuntimeValue, format_number};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Builtin {
    /// `__print(value)`
    Print,
    /// `__setAnswer(number)`
    SetAnswer,
    Prompt,
    Alert,
    Confirm,
    /// `Number(value)`
    ToNumber,
    /// `String(value)`
    ToText,
    Math(MathFunction),
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "__print",
            Builtin::SetAnswer => "__setAnswer",
            Builtin::Prompt => "prompt",
            Builtin::Alert => "alert",
            Builtin::Confirm => "confirm",
            Builtin::ToNumber => "Number",
            Builtin::ToText => "String",
            Builtin::Math(f) => f.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MathFunction {
    Sqrt,
    Abs,
    Log,
    Log10,
    Exp,
    Pow,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
}

impl MathFunction {
    const ALL: [MathFunction; 14] = [
        MathFunction::Sqrt,
        MathFunction::Abs,
        MathFunction::Log,
        MathFunction::Log10,
        MathFunction::Exp,
        MathFunction::Pow,
        MathFunction::Sin,
        MathFunction::Cos,
        MathFunction::Tan,
        MathFunction::Floor,
        MathFunction::Ceil,
        MathFunction::Round,
        MathFunction::Min,
        MathFunction::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Sqrt => "sqrt",
            MathFunction::Abs => "abs",
            MathFunction::Log => "log",
            MathFunction::Log10 => "log10",
            MathFunction::Exp => "exp",
            MathFunction::Pow => "pow",
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Floor => "floor",
            MathFunction::Ceil => "ceil",
            MathFunction::Round => "round",
            MathFunction::Min => "min",
            MathFunction::Max => "max",
        }
    }

    /// Arguments are converted with `Number()` semantics; missing ones are `NaN`.
    pub fn apply(self, args: &[RuntimeValue]) -> f64 {
        let arg = |i: usize| args.get(i).map_or(f64::NAN, RuntimeValue::to_number);
        match self {
            MathFunction::Sqrt => arg(0).sqrt(),
            MathFunction::Abs => arg(0).abs(),
            MathFunction::Log => arg(0).ln(),
            MathFunction::Log10 => arg(0).log10(),
            MathFunction::Exp => arg(0).exp(),
            MathFunction::Pow => arg(0).powf(arg(1)),
            MathFunction::Sin => arg(0).sin(),
            MathFunction::Cos => arg(0).cos(),
            MathFunction::Tan => arg(0).tan(),
            MathFunction::Floor => arg(0).floor(),
            MathFunction::Ceil => arg(0).ceil(),
            // Halves round up, also for negatives: round(-2.5) is -2.
            MathFunction::Round => {
                let x = arg(0);
                let floor = x.floor();
                if x - floor >= 0.5 { floor + 1.0 } else { floor }
            }
            MathFunction::Min => fold(args, f64::INFINITY, f64::min),
            MathFunction::Max => fold(args, f64::NEG_INFINITY, f64::max),
        }
    }
}

/// `min`/`max` over all arguments; any `NaN` argument makes the result `NaN`.
fn fold(args: &[RuntimeValue], empty: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut result = empty;
    for n in args.iter().map(RuntimeValue::to_number) {
        if n.is_nan() {
            return f64::NAN;
        }
        result = pick(result, n);
    }
    result
}

/// Methods callable on lists and text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    Push,
    IndexOf,
    LastIndexOf,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Push => "push",
            Method::IndexOf => "indexOf",
            Method::LastIndexOf => "lastIndexOf",
        }
    }
}

/// Bindings of a fresh global scope, besides the intrinsic hooks.
pub fn ambient_globals() -> Vec<(&'static str, RuntimeValue)> {
    vec![
        ("prompt", RuntimeValue::Builtin(Builtin::Prompt)),
        ("alert", RuntimeValue::Builtin(Builtin::Alert)),
        ("confirm", RuntimeValue::Builtin(Builtin::Confirm)),
        ("Number", RuntimeValue::Builtin(Builtin::ToNumber)),
        ("String", RuntimeValue::Builtin(Builtin::ToText)),
        ("Math", RuntimeValue::Math),
        ("NaN", RuntimeValue::Number(f64::NAN)),
        ("Infinity", RuntimeValue::Number(f64::INFINITY)),
    ]
}

/// `object.property`. Unknown properties read as `undefined`.
pub fn member(object: &RuntimeValue, property: &str) -> Result<RuntimeValue, RuntimeError> {
    let value = match (object, property) {
        (RuntimeValue::Undefined, _) => {
            return Err(RuntimeError::type_error(format!(
                "cannot read properties of undefined (reading '{property}')"
            )));
        }
        (RuntimeValue::List(items), "length") => RuntimeValue::Number(items.borrow().len() as f64),
        (RuntimeValue::String(s), "length") => RuntimeValue::Number(s.chars().count() as f64),
        (RuntimeValue::List(_), "push") => RuntimeValue::Method(Box::new(object.clone()), Method::Push),
        (RuntimeValue::List(_) | RuntimeValue::String(_), "indexOf") => {
            RuntimeValue::Method(Box::new(object.clone()), Method::IndexOf)
        }
        (RuntimeValue::List(_), "lastIndexOf") => RuntimeValue::Method(Box::new(object.clone()), Method::LastIndexOf),
        (RuntimeValue::Math, name) => math_member(name),
        _ => RuntimeValue::Undefined,
    };
    Ok(value)
}

fn math_member(name: &str) -> RuntimeValue {
    let constant = match name {
        "PI" => std::f64::consts::PI,
        "E" => std::f64::consts::E,
        "SQRT2" => std::f64::consts::SQRT_2,
        "SQRT1_2" => std::f64::consts::FRAC_1_SQRT_2,
        "LN2" => std::f64::consts::LN_2,
        "LN10" => std::f64::consts::LN_10,
        _ => {
            return MathFunction::ALL
                .into_iter()
                .find(|f| f.name() == name)
                .map_or(RuntimeValue::Undefined, |f| RuntimeValue::Builtin(Builtin::Math(f)));
        }
    };
    RuntimeValue::Number(constant)
}

/// `object[index]`. Out-of-range reads are `undefined`.
pub fn index(object: &RuntimeValue, index: &RuntimeValue) -> Result<RuntimeValue, RuntimeError> {
    let position = match index {
        RuntimeValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        RuntimeValue::Number(_) => None,
        RuntimeValue::String(property) => return member(object, property),
        other => {
            return Err(RuntimeError::type_error(format!(
                "cannot index with a {} value",
                other.type_name()
            )));
        }
    };
    match object {
        RuntimeValue::List(items) => Ok(position
            .and_then(|i| items.borrow().get(i).cloned())
            .unwrap_or(RuntimeValue::Undefined)),
        RuntimeValue::String(s) => Ok(position
            .and_then(|i| s.chars().nth(i))
            .map_or(RuntimeValue::Undefined, |c| RuntimeValue::String(c.to_string()))),
        RuntimeValue::Undefined => Err(RuntimeError::type_error(format!(
            "cannot read properties of undefined (reading '{}')",
            format_number(index.to_number())
        ))),
        _ => Ok(RuntimeValue::Undefined),
    }
}

pub fn call_method(receiver: &RuntimeValue, method: Method, args: Vec<RuntimeValue>) -> Result<RuntimeValue, RuntimeError> {
    let first = args.first().cloned().unwrap_or(RuntimeValue::Undefined);
    match (receiver, method) {
        (RuntimeValue::List(items), Method::Push) => {
            let mut items = items.borrow_mut();
            items.extend(args);
            Ok(RuntimeValue::Number(items.len() as f64))
        }
        (RuntimeValue::List(items), Method::IndexOf) => {
            let position = items.borrow().iter().position(|item| *item == first);
            Ok(position_value(position))
        }
        (RuntimeValue::List(items), Method::LastIndexOf) => {
            let position = items.borrow().iter().rposition(|item| *item == first);
            Ok(position_value(position))
        }
        (RuntimeValue::String(haystack), Method::IndexOf) => {
            let needle = first.to_string();
            let position = haystack.find(&needle).map(|byte| haystack[..byte].chars().count());
            Ok(position_value(position))
        }
        (other, method) => Err(RuntimeError::NotAFunction(format!(
            "{}.{}",
            other.type_name(),
            method.name()
        ))),
    }
}

fn position_value(position: Option<usize>) -> RuntimeValue {
    RuntimeValue::Number(position.map_or(-1.0, |p| p as f64))
}
