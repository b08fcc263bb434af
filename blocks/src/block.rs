use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::{SocketKind, ValueKind};

/// Identity of a block in a [`Workspace`](crate::workspace::Workspace).
///
/// Ids are handed out in increasing order, so sorting by id is sorting by
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A field value. Dropdown choices, variable and procedure names are text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Shape-changing state of a block, the part of a block that decides which
/// inputs it currently has.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mutation {
    #[default]
    None,
    /// Number of item inputs (`ADD0`, `ADD1`, ...).
    Items(usize),
    /// `controls_if` shape: `IF0/DO0`, one `IFn/DOn` per else-if, optional `ELSE`.
    Branches { else_if: usize, has_else: bool },
    /// Parameter names of a procedure definition.
    Definition { params: Vec<String> },
    /// Target procedure and its parameter names, one `ARGn` input each.
    Call { name: String, params: Vec<String> },
}

/// Where a block hangs in the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Parent {
    /// Plugged into an input (value socket or first block of a statement input).
    Input { block: BlockId, socket: String },
    /// Follows this block in a statement chain.
    Previous(BlockId),
}

impl Parent {
    pub fn block(&self) -> BlockId {
        match self {
            Parent::Input { block, .. } | Parent::Previous(block) => *block,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub name: String,
    pub kind: SocketKind,
    pub child: Option<BlockId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) type_name: String,
    pub(crate) fields: BTreeMap<String, FieldValue>,
    pub(crate) inputs: Vec<Input>,
    pub(crate) output: Option<ValueKind>,
    pub(crate) has_previous: bool,
    pub(crate) has_next: bool,
    pub(crate) next: Option<BlockId>,
    pub(crate) parent: Option<Parent>,
    pub(crate) mutation: Mutation,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    pub fn field_number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_number)
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub(crate) fn input_mut(&mut self, name: &str) -> Option<&mut Input> {
        self.inputs.iter_mut().find(|i| i.name == name)
    }

    /// The block plugged into input `name`, if any.
    pub fn child(&self, name: &str) -> Option<BlockId> {
        self.input(name).and_then(|i| i.child)
    }

    /// `None` for statement blocks.
    pub fn output(&self) -> Option<ValueKind> {
        self.output
    }

    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn next(&self) -> Option<BlockId> {
        self.next
    }

    pub fn parent(&self) -> Option<&Parent> {
        self.parent.as_ref()
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}
