//! Workspaces stored as TOML.
//!
//! ```toml
//! [[block]]
//! id = "answer"
//! type = "output_answer"
//! inputs = { ANSWER = "sum" }
//!
//! [[block]]
//! id = "sum"
//! type = "math_arithmetic"
//! fields = { OP = "ADD" }
//! inputs = { A = "five", B = "three" }
//! ```
//!
//! Files are replayed through the public graph API, so a file describing
//! an invalid graph fails with the same errors an editor would get.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use blocks::catalog::SocketKind;
use blocks::{BlockId, FieldValue, Mutation, Workspace};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceFile {
    #[serde(rename = "block", default)]
    pub blocks: Vec<BlockEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockEntry {
    /// Label other entries use to refer to this block.
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, toml::Value>,
    /// Socket name to label. Statement inputs name the first block of the body.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub mutation: Option<MutationEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationEntry {
    #[serde(default)]
    pub items: Option<usize>,
    #[serde(default)]
    pub else_if: Option<usize>,
    #[serde(default)]
    pub has_else: Option<bool>,
    /// Parameters of a definition, or of the procedure a call targets.
    #[serde(default)]
    pub params: Option<Vec<String>>,
    /// Target of a call block.
    #[serde(default)]
    pub call: Option<String>,
}

impl MutationEntry {
    fn to_mutation(&self) -> Mutation {
        let params = self.params.clone().unwrap_or_default();
        if let Some(name) = &self.call {
            Mutation::Call {
                name: name.clone(),
                params,
            }
        } else if self.params.is_some() {
            Mutation::Definition { params }
        } else if let Some(items) = self.items {
            Mutation::Items(items)
        } else if self.else_if.is_some() || self.has_else.is_some() {
            Mutation::Branches {
                else_if: self.else_if.unwrap_or(0),
                has_else: self.has_else.unwrap_or(false),
            }
        } else {
            Mutation::None
        }
    }
}

fn field_value(value: &toml::Value) -> Result<FieldValue, String> {
    match value {
        toml::Value::Integer(n) => Ok(FieldValue::Number(*n as f64)),
        toml::Value::Float(f) => Ok(FieldValue::Number(*f)),
        toml::Value::String(s) => Ok(FieldValue::Text(s.clone())),
        toml::Value::Boolean(b) => Ok(FieldValue::from(if *b { "TRUE" } else { "FALSE" })),
        other => Err(format!("unsupported field value {other}")),
    }
}

impl WorkspaceFile {
    pub fn load(path: &Path) -> Result<WorkspaceFile, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Replay the file into a fresh workspace with the standard catalog.
    pub fn build(&self) -> Result<Workspace, String> {
        let mut workspace = Workspace::default();
        let mut ids: HashMap<&str, BlockId> = HashMap::new();

        // Blocks first, so inputs may refer forward.
        for entry in &self.blocks {
            let fail = |e: blocks::GraphError| format!("block '{}': {}", entry.id, e);
            let id = workspace.create_block(&entry.type_name).map_err(fail)?;
            if ids.insert(entry.id.as_str(), id).is_some() {
                return Err(format!("duplicate block id '{}'", entry.id));
            }
            for (name, value) in &entry.fields {
                let value = field_value(value).map_err(|e| format!("block '{}', field {name}: {e}", entry.id))?;
                workspace.set_field(id, name, value).map_err(fail)?;
            }
            if let Some(mutation) = &entry.mutation {
                workspace.set_mutation(id, mutation.to_mutation()).map_err(fail)?;
            }
        }

        let lookup = |label: &str| {
            ids.get(label)
                .copied()
                .ok_or_else(|| format!("unknown block id '{label}'"))
        };

        for entry in &self.blocks {
            let fail = |e: blocks::GraphError| format!("block '{}': {}", entry.id, e);
            let id = lookup(&entry.id)?;
            for (socket, label) in &entry.inputs {
                let child = lookup(label)?;
                let is_statement = workspace
                    .block(id)
                    .and_then(|b| b.input(socket))
                    .is_some_and(|input| input.kind == SocketKind::Statement);
                if is_statement {
                    workspace.connect_body(id, socket, child).map_err(fail)?;
                } else {
                    workspace.connect_value(id, socket, child).map_err(fail)?;
                }
            }
            if let Some(label) = &entry.next {
                workspace.connect_statement(id, lookup(label)?).map_err(fail)?;
            }
        }

        tracing::debug!(blocks = workspace.len(), "workspace built");
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks::Generator;

    fn build(text: &str) -> Result<Workspace, String> {
        toml::from_str::<WorkspaceFile>(text).unwrap().build()
    }

    #[test]
    fn builds_a_declared_sum() {
        let ws = build(
            r#"
[[block]]
id = "answer"
type = "output_answer"
inputs = { ANSWER = "sum" }

[[block]]
id = "sum"
type = "math_arithmetic"
fields = { OP = "ADD" }
inputs = { A = "five", B = "three" }

[[block]]
id = "five"
type = "math_number"
fields = { NUM = 5 }

[[block]]
id = "three"
type = "math_number"
fields = { NUM = 3.0 }
"#,
        )
        .unwrap();
        assert_eq!(Generator::standard().generate(&ws).source, "__setAnswer(5 + 3);\n");
    }

    #[test]
    fn statement_inputs_and_mutations() {
        let ws = build(
            r#"
[[block]]
id = "def"
type = "procedures_defreturn"
fields = { NAME = "doble" }
mutation = { params = ["n"] }
inputs = { RETURN = "product" }

[[block]]
id = "product"
type = "math_arithmetic"
fields = { OP = "MULTIPLY" }
inputs = { A = "n", B = "two" }

[[block]]
id = "n"
type = "variables_get"
fields = { VAR = "n" }

[[block]]
id = "two"
type = "math_number"
fields = { NUM = 2 }

[[block]]
id = "loop"
type = "controls_repeat_ext"
inputs = { TIMES = "two_again", DO = "print" }

[[block]]
id = "two_again"
type = "math_number"
fields = { NUM = 2 }

[[block]]
id = "print"
type = "output_print"
inputs = { VALUE = "call" }

[[block]]
id = "call"
type = "procedures_callreturn"
mutation = { call = "doble", params = ["n"] }
inputs = { ARG0 = "two_more" }

[[block]]
id = "two_more"
type = "math_number"
fields = { NUM = 21 }
"#,
        )
        .unwrap();
        let source = Generator::standard().generate(&ws).source;
        assert!(source.contains("function doble(n) {\n  return n * 2;\n}\n"));
        assert!(source.contains("  __print(doble(21));\n"));
    }

    #[test]
    fn structural_errors_are_reported() {
        let err = build(
            r#"
[[block]]
id = "answer"
type = "output_answer"
inputs = { ANSWER = "cmp" }

[[block]]
id = "cmp"
type = "logic_compare"
fields = { OP = "GT" }
"#,
        )
        .unwrap_err();
        assert!(err.starts_with("block 'answer': socket `ANSWER`"), "{err}");

        let err = build("[[block]]\nid = \"a\"\ntype = \"robot_move\"\n").unwrap_err();
        assert_eq!(err, "block 'a': unknown block type `robot_move`");

        let err = build("[[block]]\nid = \"a\"\ntype = \"output_print\"\nnext = \"b\"\n").unwrap_err();
        assert_eq!(err, "unknown block id 'b'");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.toml");
        std::fs::write(&path, "[[block]]\nid = \"p\"\ntype = \"output_print\"\n").unwrap();
        let ws = WorkspaceFile::load(&path).unwrap().build().unwrap();
        assert_eq!(ws.len(), 1);
    }
}
