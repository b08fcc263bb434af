use std::collections::BTreeMap;

use crate::block::{BlockId, Mutation};
use crate::error::GraphError;
use crate::workspace::Workspace;

pub const DEFINE_NO_RETURN: &str = "procedures_defnoreturn";
pub const DEFINE_RETURN: &str = "procedures_defreturn";
pub const CALL_NO_RETURN: &str = "procedures_callnoreturn";
pub const CALL_RETURN: &str = "procedures_callreturn";

pub fn is_definition(type_name: &str) -> bool {
    type_name == DEFINE_NO_RETURN || type_name == DEFINE_RETURN
}

pub fn is_call(type_name: &str) -> bool {
    type_name == CALL_NO_RETURN || type_name == CALL_RETURN
}

/// A procedure as the palette sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureInfo {
    pub name: String,
    pub params: Vec<String>,
    pub has_return: bool,
    /// The defining block.
    pub block: BlockId,
}

/// Bump a trailing number, or append `2`: `f` -> `f2` -> `f3`.
fn bump_name(name: &str) -> String {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (stem, number) = name.split_at(name.len() - digits);
    match number.parse::<u64>() {
        Ok(n) => format!("{stem}{}", n + 1),
        Err(_) => format!("{name}2"),
    }
}

impl Workspace {
    /// All procedure definitions, in creation order. Derived from the blocks
    /// on every call, so it always reflects the latest edits.
    pub fn list_procedures(&self) -> Vec<ProcedureInfo> {
        self.blocks
            .values()
            .filter(|b| is_definition(&b.type_name))
            .map(|b| ProcedureInfo {
                name: b.field_text("NAME").unwrap_or_default().to_string(),
                params: match &b.mutation {
                    Mutation::Definition { params } => params.clone(),
                    _ => Vec::new(),
                },
                has_return: b.type_name == DEFINE_RETURN,
                block: b.id,
            })
            .collect()
    }

    /// Create a call block wired to the named procedure's current parameters.
    pub fn create_procedure_call(&mut self, name: &str) -> Result<BlockId, GraphError> {
        let procedure = self
            .list_procedures()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| GraphError::UnknownProcedure(name.to_string()))?;

        let type_name = if procedure.has_return { CALL_RETURN } else { CALL_NO_RETURN };
        let id = self.create_block(type_name)?;
        self.set_mutation(
            id,
            Mutation::Call {
                name: procedure.name,
                params: procedure.params,
            },
        )?;
        Ok(id)
    }

    /// `requested`, or the first bumped variant no other definition uses.
    pub(crate) fn unique_procedure_name(&self, requested: &str, owner: Option<BlockId>) -> String {
        let taken: Vec<String> = self
            .list_procedures()
            .into_iter()
            .filter(|p| Some(p.block) != owner)
            .map(|p| p.name)
            .collect();

        let mut name = requested.to_string();
        while taken.contains(&name) {
            name = bump_name(&name);
        }
        name
    }

    pub(crate) fn rename_callers(&mut self, old: &str, new: &str) {
        let mut renamed = 0;
        for block in self.blocks.values_mut() {
            if let Mutation::Call { name, .. } = &mut block.mutation
                && name == old
            {
                *name = new.to_string();
                renamed += 1;
            }
        }
        tracing::debug!(old, new, renamed, "renamed procedure callers");
    }

    /// Re-shape every call to `procedure` after its parameter list changed.
    /// Arguments follow their parameter by name; arguments of removed
    /// parameters are unplugged.
    pub(crate) fn update_callers(&mut self, procedure: &str, params: &[String]) {
        let callers: Vec<(BlockId, Vec<String>)> = self
            .blocks
            .values()
            .filter_map(|b| match &b.mutation {
                Mutation::Call { name, params } if name == procedure => Some((b.id, params.clone())),
                _ => None,
            })
            .collect();

        for (caller, old_params) in callers {
            let carried: BTreeMap<String, String> = old_params
                .iter()
                .enumerate()
                .filter_map(|(old_index, param)| {
                    let new_index = params.iter().position(|p| p == param)?;
                    Some((format!("ARG{old_index}"), format!("ARG{new_index}")))
                })
                .collect();
            let mutation = Mutation::Call {
                name: procedure.to_string(),
                params: params.to_vec(),
            };
            self.reshape(caller, mutation, |socket| carried.get(socket).cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::FieldValue;

    #[test]
    fn bumping_names() {
        assert_eq!(bump_name("do_something"), "do_something2");
        assert_eq!(bump_name("do_something2"), "do_something3");
        assert_eq!(bump_name("f9"), "f10");
        assert_eq!(bump_name("42"), "43");
    }

    #[test]
    fn definitions_get_unique_names() {
        let mut ws = Workspace::default();
        let a = ws.create_block(DEFINE_RETURN).unwrap();
        let b = ws.create_block(DEFINE_NO_RETURN).unwrap();
        assert_eq!(ws.block(a).unwrap().field_text("NAME"), Some("do_something"));
        assert_eq!(ws.block(b).unwrap().field_text("NAME"), Some("do_something2"));

        ws.set_field(b, "NAME", FieldValue::from("do_something")).unwrap();
        assert_eq!(ws.block(b).unwrap().field_text("NAME"), Some("do_something2"));
    }

    #[test]
    fn listing_reflects_every_edit() {
        let mut ws = Workspace::default();
        assert!(ws.list_procedures().is_empty());

        let def = ws.create_block(DEFINE_RETURN).unwrap();
        ws.set_field(def, "NAME", FieldValue::from("doble")).unwrap();
        ws.set_mutation(def, Mutation::Definition { params: vec!["n".into()] }).unwrap();

        let procedures = ws.list_procedures();
        assert_eq!(procedures.len(), 1);
        assert_eq!(procedures[0].name, "doble");
        assert_eq!(procedures[0].params, vec!["n".to_string()]);
        assert!(procedures[0].has_return);

        ws.delete_block(def).unwrap();
        assert!(ws.list_procedures().is_empty());
    }

    #[test]
    fn calls_follow_renames_and_parameter_changes() {
        let mut ws = Workspace::default();
        let def = ws.create_block(DEFINE_RETURN).unwrap();
        ws.set_field(def, "NAME", FieldValue::from("suma")).unwrap();
        ws.set_mutation(def, Mutation::Definition { params: vec!["a".into(), "b".into()] }).unwrap();

        let call = ws.create_procedure_call("suma").unwrap();
        assert_eq!(ws.block(call).unwrap().type_name(), CALL_RETURN);
        let b_arg = ws.create_block("math_number").unwrap();
        ws.connect_value(call, "ARG1", b_arg).unwrap();

        ws.set_field(def, "NAME", FieldValue::from("sumar")).unwrap();
        assert!(matches!(ws.block(call).unwrap().mutation(), Mutation::Call { name, .. } if name == "sumar"));

        // Drop `a`: the argument for `b` moves from ARG1 to ARG0.
        ws.set_mutation(def, Mutation::Definition { params: vec!["b".into()] }).unwrap();
        let call_block = ws.block(call).unwrap();
        assert_eq!(call_block.inputs().len(), 1);
        assert_eq!(call_block.child("ARG0"), Some(b_arg));
    }

    #[test]
    fn removed_parameter_unplugs_its_argument() {
        let mut ws = Workspace::default();
        let def = ws.create_block(DEFINE_NO_RETURN).unwrap();
        ws.set_mutation(def, Mutation::Definition { params: vec!["x".into()] }).unwrap();
        let call = ws.create_procedure_call("do_something").unwrap();
        let arg = ws.create_block("math_number").unwrap();
        ws.connect_value(call, "ARG0", arg).unwrap();

        ws.set_mutation(def, Mutation::Definition { params: vec![] }).unwrap();
        assert!(ws.block(arg).unwrap().is_top_level());
        assert!(ws.block(call).unwrap().inputs().is_empty());
    }

    #[test]
    fn calling_an_unknown_procedure_fails() {
        let mut ws = Workspace::default();
        assert_eq!(
            ws.create_procedure_call("nada"),
            Err(GraphError::UnknownProcedure("nada".into()))
        );
        assert!(ws.is_empty());
    }
}
