use std::collections::BTreeMap;

use crate::block::{Block, BlockId, FieldValue, Input, Mutation, Parent};
use crate::catalog::{BlockCatalog, BlockSpec, FieldKind, SocketKind};
use crate::error::GraphError;
use crate::procedures;

/// The block graph: an arena of blocks keyed by creation-ordered id.
///
/// Every block has at most one parent link, so statement chains and value
/// subtrees form a forest. Edits validate first and only then mutate, so a
/// rejected edit leaves the graph exactly as it was.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) catalog: BlockCatalog,
    pub(crate) blocks: BTreeMap<BlockId, Block>,
    next_id: u32,
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::new(BlockCatalog::standard())
    }
}

impl Workspace {
    pub fn new(catalog: BlockCatalog) -> Self {
        Workspace {
            catalog,
            blocks: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// All blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks without a parent, in creation order.
    pub fn top_blocks(&self) -> Vec<BlockId> {
        self.blocks
            .values()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id)
            .collect()
    }

    /// `first` and every block after it in its statement chain.
    pub fn chain(&self, first: BlockId) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut current = Some(first);
        while let Some(id) = current {
            let Some(block) = self.blocks.get(&id) else { break };
            chain.push(id);
            current = block.next;
        }
        chain
    }

    /// Variable names referenced by variable fields, in first-use order.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for block in self.blocks.values() {
            let Some(spec) = self.catalog.spec(&block.type_name) else { continue };
            for field in spec.fields.iter().filter(|f| f.kind == FieldKind::Variable) {
                if let Some(name) = block.field_text(&field.name)
                    && !names.iter().any(|n| n == name)
                {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    fn get(&self, id: BlockId) -> Result<&Block, GraphError> {
        self.blocks.get(&id).ok_or(GraphError::UnknownBlock(id))
    }

    fn spec_of(&self, block: &Block) -> Result<&BlockSpec, GraphError> {
        self.catalog
            .spec(&block.type_name)
            .ok_or_else(|| GraphError::UnknownBlockType(block.type_name.clone()))
    }

    // ------------------------------------------------------------------
    // Creation and field edits
    // ------------------------------------------------------------------

    pub fn create_block(&mut self, type_name: &str) -> Result<BlockId, GraphError> {
        let spec = self
            .catalog
            .spec(type_name)
            .ok_or_else(|| GraphError::UnknownBlockType(type_name.to_string()))?;

        let id = BlockId(self.next_id);
        let mutation = spec.default_mutation();
        let block = Block {
            id,
            type_name: type_name.to_string(),
            fields: spec
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.default.clone()))
                .collect(),
            inputs: spec
                .layout(&mutation)
                .into_iter()
                .map(|i| Input {
                    name: i.name,
                    kind: i.kind,
                    child: None,
                })
                .collect(),
            output: spec.output,
            has_previous: spec.has_previous,
            has_next: spec.has_next,
            next: None,
            parent: None,
            mutation,
        };
        let procedure_fields: Vec<(String, String)> = spec
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::ProcedureName)
            .filter_map(|f| Some((f.name.clone(), f.default.as_text()?.to_string())))
            .collect();

        self.next_id += 1;
        self.blocks.insert(id, block);

        for (field, default) in procedure_fields {
            let name = self.unique_procedure_name(&default, Some(id));
            if let Some(block) = self.blocks.get_mut(&id) {
                block.fields.insert(field, FieldValue::Text(name));
            }
        }

        tracing::debug!(%id, type_name, "created block");
        Ok(id)
    }

    pub fn set_field(&mut self, id: BlockId, field: &str, value: FieldValue) -> Result<(), GraphError> {
        let block = self.get(id)?;
        let spec = self.spec_of(block)?;
        let field_spec = spec.field_spec(field).ok_or_else(|| GraphError::UnknownField {
            block: id,
            type_name: block.type_name.clone(),
            field: field.to_string(),
        })?;

        let invalid = |reason: &str| GraphError::InvalidField {
            block: id,
            field: field.to_string(),
            reason: reason.to_string(),
        };

        match (&field_spec.kind, &value) {
            (FieldKind::Number, FieldValue::Number(n)) if !n.is_finite() => {
                return Err(invalid("numbers must be finite"));
            }
            (FieldKind::Number, FieldValue::Number(_)) | (FieldKind::Text, FieldValue::Text(_)) => {}
            (FieldKind::Dropdown(options), FieldValue::Text(choice)) => {
                if !options.contains(choice) {
                    return Err(invalid(&format!("expected one of {}", options.join(", "))));
                }
            }
            (FieldKind::Variable | FieldKind::ProcedureName, FieldValue::Text(name)) => {
                if name.trim().is_empty() {
                    return Err(invalid("names cannot be empty"));
                }
            }
            (FieldKind::Number, _) => return Err(invalid("expected a number")),
            _ => return Err(invalid("expected text")),
        }

        if field_spec.kind == FieldKind::ProcedureName {
            let old = block.field_text(field).unwrap_or_default().to_string();
            let requested = value.as_text().unwrap_or_default().trim().to_string();
            let name = self.unique_procedure_name(&requested, Some(id));
            if let Some(block) = self.blocks.get_mut(&id) {
                block.fields.insert(field.to_string(), FieldValue::Text(name.clone()));
            }
            if old != name {
                self.rename_callers(&old, &name);
            }
            return Ok(());
        }

        if let Some(block) = self.blocks.get_mut(&id) {
            block.fields.insert(field.to_string(), value);
        }
        tracing::debug!(%id, field, "set field");
        Ok(())
    }

    /// Change a block's shape. Children of inputs that no longer exist are
    /// unplugged to the top level; a definition's new parameter list is
    /// pushed to every call of that procedure.
    pub fn set_mutation(&mut self, id: BlockId, mutation: Mutation) -> Result<(), GraphError> {
        let block = self.get(id)?;
        let spec = self.spec_of(block)?;
        let invalid = |reason: &str| GraphError::InvalidMutation {
            block: id,
            type_name: block.type_name.clone(),
            reason: reason.to_string(),
        };

        if !spec.accepts_mutation(&mutation) {
            return Err(invalid("mutation does not match the block type"));
        }
        if let Mutation::Definition { params } = &mutation {
            if params.iter().any(|p| p.trim().is_empty()) {
                return Err(invalid("parameter names cannot be empty"));
            }
            if params.iter().enumerate().any(|(i, p)| params[..i].contains(p)) {
                return Err(invalid("parameter names must be distinct"));
            }
        }

        let definition = match &mutation {
            Mutation::Definition { params } => Some((
                block.field_text("NAME").unwrap_or_default().to_string(),
                params.clone(),
            )),
            _ => None,
        };

        self.reshape(id, mutation, |socket| Some(socket.to_string()));
        if let Some((name, params)) = definition {
            self.update_callers(&name, &params);
        }
        tracing::debug!(%id, "set mutation");
        Ok(())
    }

    /// Install `mutation` and rebuild the inputs it implies. `carry` maps an
    /// old input name to the new input its child moves to.
    pub(crate) fn reshape(&mut self, id: BlockId, mutation: Mutation, carry: impl Fn(&str) -> Option<String>) {
        let Some(layout) = self
            .blocks
            .get(&id)
            .and_then(|b| self.catalog.spec(&b.type_name))
            .map(|spec| spec.layout(&mutation))
        else {
            return;
        };
        let Some(block) = self.blocks.get_mut(&id) else { return };

        let mut inputs: Vec<Input> = layout
            .into_iter()
            .map(|i| Input {
                name: i.name,
                kind: i.kind,
                child: None,
            })
            .collect();
        let mut moved = Vec::new();
        let mut orphans = Vec::new();

        for old in std::mem::take(&mut block.inputs) {
            let Some(child) = old.child else { continue };
            let slot = carry(&old.name)
                .and_then(|target| inputs.iter_mut().find(|i| i.name == target && i.child.is_none()));
            match slot {
                Some(slot) => {
                    slot.child = Some(child);
                    moved.push((child, slot.name.clone()));
                }
                None => orphans.push(child),
            }
        }

        block.inputs = inputs;
        block.mutation = mutation;

        for (child, socket) in moved {
            if let Some(child) = self.blocks.get_mut(&child) {
                child.parent = Some(Parent::Input { block: id, socket });
            }
        }
        for orphan in orphans {
            if let Some(orphan) = self.blocks.get_mut(&orphan) {
                orphan.parent = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Plug `child` into value socket `socket` of `parent`. A block already
    /// in the socket is unplugged to the top level; `child` is moved from
    /// wherever it was.
    pub fn connect_value(&mut self, parent: BlockId, socket: &str, child: BlockId) -> Result<(), GraphError> {
        let parent_block = self.get(parent)?;
        let input = self.input_of(parent_block, socket)?;
        let child_block = self.get(child)?;

        let Some(output) = child_block.output else {
            return Err(GraphError::MissingConnection {
                block: child,
                type_name: child_block.type_name.clone(),
                connection: "output",
            });
        };
        let mismatch = || GraphError::TypeMismatch {
            parent,
            socket: socket.to_string(),
            child,
            expected: input.kind.to_string(),
            found: SocketKind::Value(output).to_string(),
        };
        match input.kind {
            SocketKind::Value(expected) if expected.accepts(output) => {}
            _ => return Err(mismatch()),
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(GraphError::CycleDetected { parent, child });
        }

        let occupant = input.child;
        if occupant == Some(child) {
            return Ok(());
        }

        self.detach(child);
        if let Some(occupant) = occupant {
            self.detach(occupant);
        }
        self.attach_input(parent, socket, child);
        tracing::debug!(%parent, socket, %child, "connected value");
        Ok(())
    }

    /// Link `next` (and the chain hanging below it) after `prev`.
    pub fn connect_statement(&mut self, prev: BlockId, next: BlockId) -> Result<(), GraphError> {
        let prev_block = self.get(prev)?;
        if !prev_block.has_next {
            return Err(GraphError::MissingConnection {
                block: prev,
                type_name: prev_block.type_name.clone(),
                connection: "next",
            });
        }
        let next_block = self.get(next)?;
        if !next_block.has_previous {
            return Err(GraphError::MissingConnection {
                block: next,
                type_name: next_block.type_name.clone(),
                connection: "previous",
            });
        }
        match prev_block.next {
            Some(existing) if existing == next => return Ok(()),
            Some(existing) => return Err(GraphError::ChainConflict { block: prev, existing }),
            None => {}
        }
        if next == prev || self.is_ancestor(next, prev) {
            return Err(GraphError::CycleDetected { parent: prev, child: next });
        }

        self.detach(next);
        if let Some(block) = self.blocks.get_mut(&prev) {
            block.next = Some(next);
        }
        if let Some(block) = self.blocks.get_mut(&next) {
            block.parent = Some(Parent::Previous(prev));
        }
        tracing::debug!(%prev, %next, "connected statement");
        Ok(())
    }

    /// Make `first` the first block of statement input `socket` of `parent`.
    pub fn connect_body(&mut self, parent: BlockId, socket: &str, first: BlockId) -> Result<(), GraphError> {
        let parent_block = self.get(parent)?;
        let input = self.input_of(parent_block, socket)?;
        let first_block = self.get(first)?;

        if input.kind != SocketKind::Statement {
            return Err(GraphError::TypeMismatch {
                parent,
                socket: socket.to_string(),
                child: first,
                expected: input.kind.to_string(),
                found: SocketKind::Statement.to_string(),
            });
        }
        if !first_block.has_previous {
            return Err(GraphError::MissingConnection {
                block: first,
                type_name: first_block.type_name.clone(),
                connection: "previous",
            });
        }
        match input.child {
            Some(existing) if existing == first => return Ok(()),
            Some(existing) => return Err(GraphError::ChainConflict { block: parent, existing }),
            None => {}
        }
        if first == parent || self.is_ancestor(first, parent) {
            return Err(GraphError::CycleDetected { parent, child: first });
        }

        self.detach(first);
        self.attach_input(parent, socket, first);
        tracing::debug!(%parent, socket, %first, "connected body");
        Ok(())
    }

    /// Unplug a block (with everything below it) to the top level.
    pub fn disconnect(&mut self, id: BlockId) -> Result<(), GraphError> {
        self.get(id)?;
        self.detach(id);
        tracing::debug!(%id, "disconnected block");
        Ok(())
    }

    /// Delete a block and everything plugged into its inputs. Its successor
    /// in the statement chain takes its place.
    pub fn delete_block(&mut self, id: BlockId) -> Result<(), GraphError> {
        let block = self.get(id)?;
        let parent = block.parent.clone();
        let next = block.next;
        let was_definition = procedures::is_definition(&block.type_name);

        let mut doomed = Vec::new();
        self.collect_input_subtrees(id, &mut doomed);

        self.detach(id);
        if let Some(next) = next {
            if let Some(next_block) = self.blocks.get_mut(&next) {
                next_block.parent = None;
            }
            match parent {
                Some(Parent::Previous(prev)) => {
                    if let Some(prev_block) = self.blocks.get_mut(&prev) {
                        prev_block.next = Some(next);
                    }
                    if let Some(next_block) = self.blocks.get_mut(&next) {
                        next_block.parent = Some(Parent::Previous(prev));
                    }
                }
                Some(Parent::Input { block, socket }) => self.attach_input(block, &socket, next),
                None => {}
            }
        }

        self.blocks.remove(&id);
        for doomed in &doomed {
            self.blocks.remove(doomed);
        }

        if was_definition {
            tracing::debug!(%id, "deleted procedure definition; its calls are now dangling");
        }
        tracing::debug!(%id, cascaded = doomed.len(), "deleted block");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn input_of<'a>(&self, block: &'a Block, socket: &str) -> Result<&'a Input, GraphError> {
        block.input(socket).ok_or_else(|| GraphError::UnknownSocket {
            block: block.id,
            type_name: block.type_name.clone(),
            socket: socket.to_string(),
        })
    }

    /// Whether `candidate` sits above `of` (through any parent link).
    fn is_ancestor(&self, candidate: BlockId, of: BlockId) -> bool {
        let mut current = self.blocks.get(&of).and_then(|b| b.parent.as_ref()).map(Parent::block);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.blocks.get(&id).and_then(|b| b.parent.as_ref()).map(Parent::block);
        }
        false
    }

    fn detach(&mut self, id: BlockId) {
        let Some(parent) = self.blocks.get_mut(&id).and_then(|b| b.parent.take()) else {
            return;
        };
        match parent {
            Parent::Input { block, socket } => {
                if let Some(input) = self.blocks.get_mut(&block).and_then(|b| b.input_mut(&socket)) {
                    input.child = None;
                }
            }
            Parent::Previous(block) => {
                if let Some(block) = self.blocks.get_mut(&block) {
                    block.next = None;
                }
            }
        }
    }

    fn attach_input(&mut self, parent: BlockId, socket: &str, child: BlockId) {
        if let Some(input) = self.blocks.get_mut(&parent).and_then(|b| b.input_mut(socket)) {
            input.child = Some(child);
        }
        if let Some(block) = self.blocks.get_mut(&child) {
            block.parent = Some(Parent::Input {
                block: parent,
                socket: socket.to_string(),
            });
        }
    }

    /// Everything reachable through `id`'s inputs, including whole statement
    /// chains in statement inputs, but not `id` itself or its successors.
    fn collect_input_subtrees(&self, id: BlockId, out: &mut Vec<BlockId>) {
        let Some(block) = self.blocks.get(&id) else { return };
        for child in block.inputs.iter().filter_map(|i| i.child) {
            for member in self.chain(child) {
                out.push(member);
                self.collect_input_subtrees(member, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(ws: &mut Workspace, n: f64) -> BlockId {
        let id = ws.create_block("math_number").unwrap();
        ws.set_field(id, "NUM", FieldValue::Number(n)).unwrap();
        id
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut ws = Workspace::default();
        assert_eq!(
            ws.create_block("robot_dance"),
            Err(GraphError::UnknownBlockType("robot_dance".into()))
        );
        assert!(ws.is_empty());
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut ws = Workspace::default();
        let a = ws.create_block("output_print").unwrap();
        let b = ws.create_block("math_number").unwrap();
        assert!(a < b);
        assert_eq!(ws.top_blocks(), vec![a, b]);
    }

    #[test]
    fn fields_are_validated() {
        let mut ws = Workspace::default();
        let op = ws.create_block("math_arithmetic").unwrap();
        assert_eq!(ws.block(op).unwrap().field_text("OP"), Some("ADD"));
        assert!(matches!(
            ws.set_field(op, "OP", FieldValue::from("MODULO")),
            Err(GraphError::InvalidField { .. })
        ));
        assert!(matches!(
            ws.set_field(op, "COLOUR", FieldValue::from("red")),
            Err(GraphError::UnknownField { .. })
        ));
        let n = ws.create_block("math_number").unwrap();
        assert!(matches!(
            ws.set_field(n, "NUM", FieldValue::Number(f64::NAN)),
            Err(GraphError::InvalidField { .. })
        ));
        assert!(matches!(
            ws.set_field(n, "NUM", FieldValue::from("5")),
            Err(GraphError::InvalidField { .. })
        ));
    }

    #[test]
    fn boolean_into_number_socket_is_a_type_mismatch() {
        let mut ws = Workspace::default();
        let answer = ws.create_block("output_answer").unwrap();
        let compare = ws.create_block("logic_compare").unwrap();
        let err = ws.connect_value(answer, "ANSWER", compare).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
        assert!(ws.block(compare).unwrap().is_top_level());
        assert_eq!(ws.block(answer).unwrap().child("ANSWER"), None);
    }

    #[test]
    fn untyped_blocks_fit_typed_sockets() {
        let mut ws = Workspace::default();
        let answer = ws.create_block("output_answer").unwrap();
        let get = ws.create_block("variables_get").unwrap();
        ws.connect_value(answer, "ANSWER", get).unwrap();
        assert_eq!(ws.block(answer).unwrap().child("ANSWER"), Some(get));
    }

    #[test]
    fn value_cycles_are_rejected() {
        let mut ws = Workspace::default();
        let outer = ws.create_block("math_arithmetic").unwrap();
        let inner = ws.create_block("math_arithmetic").unwrap();
        ws.connect_value(outer, "A", inner).unwrap();
        assert_eq!(
            ws.connect_value(inner, "B", outer),
            Err(GraphError::CycleDetected { parent: inner, child: outer })
        );
        assert_eq!(
            ws.connect_value(outer, "B", outer),
            Err(GraphError::CycleDetected { parent: outer, child: outer })
        );
        assert!(ws.block(outer).unwrap().is_top_level());
    }

    #[test]
    fn occupied_socket_bumps_old_child() {
        let mut ws = Workspace::default();
        let print = ws.create_block("output_print").unwrap();
        let five = number(&mut ws, 5.0);
        let six = number(&mut ws, 6.0);
        ws.connect_value(print, "VALUE", five).unwrap();
        ws.connect_value(print, "VALUE", six).unwrap();
        assert_eq!(ws.block(print).unwrap().child("VALUE"), Some(six));
        assert!(ws.block(five).unwrap().is_top_level());
    }

    #[test]
    fn reconnecting_moves_the_block() {
        let mut ws = Workspace::default();
        let a = ws.create_block("output_print").unwrap();
        let b = ws.create_block("output_print").unwrap();
        let five = number(&mut ws, 5.0);
        ws.connect_value(a, "VALUE", five).unwrap();
        ws.connect_value(b, "VALUE", five).unwrap();
        assert_eq!(ws.block(a).unwrap().child("VALUE"), None);
        assert_eq!(ws.block(b).unwrap().child("VALUE"), Some(five));
    }

    #[test]
    fn chain_conflicts_and_cycles() {
        let mut ws = Workspace::default();
        let a = ws.create_block("output_print").unwrap();
        let b = ws.create_block("output_print").unwrap();
        let c = ws.create_block("output_print").unwrap();
        ws.connect_statement(a, b).unwrap();
        assert_eq!(
            ws.connect_statement(a, c),
            Err(GraphError::ChainConflict { block: a, existing: b })
        );
        assert_eq!(
            ws.connect_statement(b, a),
            Err(GraphError::CycleDetected { parent: b, child: a })
        );
        ws.connect_statement(b, c).unwrap();
        assert_eq!(ws.chain(a), vec![a, b, c]);
    }

    #[test]
    fn answer_has_no_next_connection() {
        let mut ws = Workspace::default();
        let answer = ws.create_block("output_answer").unwrap();
        let print = ws.create_block("output_print").unwrap();
        assert!(matches!(
            ws.connect_statement(answer, print),
            Err(GraphError::MissingConnection { connection: "next", .. })
        ));
        ws.connect_statement(print, answer).unwrap();
    }

    #[test]
    fn body_connections() {
        let mut ws = Workspace::default();
        let repeat = ws.create_block("controls_repeat_ext").unwrap();
        let print = ws.create_block("output_print").unwrap();
        let five = number(&mut ws, 5.0);
        assert!(matches!(
            ws.connect_body(repeat, "TIMES", print),
            Err(GraphError::TypeMismatch { .. })
        ));
        assert!(matches!(
            ws.connect_value(repeat, "DO", five),
            Err(GraphError::TypeMismatch { .. })
        ));
        ws.connect_body(repeat, "DO", print).unwrap();
        assert!(matches!(
            ws.connect_body(print, "DO", repeat),
            Err(GraphError::UnknownSocket { .. })
        ));
        let inner = ws.create_block("controls_repeat_ext").unwrap();
        ws.connect_statement(print, inner).unwrap();
        assert!(matches!(
            ws.connect_body(inner, "DO", repeat),
            Err(GraphError::CycleDetected { .. })
        ));
    }

    #[test]
    fn delete_heals_the_chain() {
        let mut ws = Workspace::default();
        let a = ws.create_block("output_print").unwrap();
        let b = ws.create_block("output_print").unwrap();
        let c = ws.create_block("output_print").unwrap();
        ws.connect_statement(a, b).unwrap();
        ws.connect_statement(b, c).unwrap();
        let value = number(&mut ws, 1.0);
        ws.connect_value(b, "VALUE", value).unwrap();

        ws.delete_block(b).unwrap();
        assert_eq!(ws.chain(a), vec![a, c]);
        assert!(ws.block(value).is_none());
        assert_eq!(ws.block(c).unwrap().parent(), Some(&Parent::Previous(a)));
    }

    #[test]
    fn delete_cascades_into_bodies_but_not_siblings() {
        let mut ws = Workspace::default();
        let repeat = ws.create_block("controls_repeat_ext").unwrap();
        let times = number(&mut ws, 3.0);
        ws.connect_value(repeat, "TIMES", times).unwrap();
        let first = ws.create_block("output_print").unwrap();
        let second = ws.create_block("output_print").unwrap();
        ws.connect_body(repeat, "DO", first).unwrap();
        ws.connect_statement(first, second).unwrap();
        let after = ws.create_block("output_print").unwrap();
        ws.connect_statement(repeat, after).unwrap();

        ws.delete_block(repeat).unwrap();
        assert_eq!(ws.len(), 1);
        assert!(ws.block(after).unwrap().is_top_level());
    }

    #[test]
    fn delete_first_of_body_promotes_successor() {
        let mut ws = Workspace::default();
        let repeat = ws.create_block("controls_repeat_ext").unwrap();
        let first = ws.create_block("output_print").unwrap();
        let second = ws.create_block("output_print").unwrap();
        ws.connect_body(repeat, "DO", first).unwrap();
        ws.connect_statement(first, second).unwrap();
        ws.delete_block(first).unwrap();
        assert_eq!(ws.block(repeat).unwrap().child("DO"), Some(second));
    }

    #[test]
    fn mutation_unplugs_removed_items() {
        let mut ws = Workspace::default();
        let join = ws.create_block("text_join").unwrap();
        let a = ws.create_block("text").unwrap();
        let b = ws.create_block("text").unwrap();
        ws.connect_value(join, "ADD0", a).unwrap();
        ws.connect_value(join, "ADD1", b).unwrap();
        ws.set_mutation(join, Mutation::Items(1)).unwrap();
        assert_eq!(ws.block(join).unwrap().child("ADD0"), Some(a));
        assert!(ws.block(b).unwrap().is_top_level());
        assert!(matches!(
            ws.set_mutation(join, Mutation::Branches { else_if: 0, has_else: true }),
            Err(GraphError::InvalidMutation { .. })
        ));
    }

    #[test]
    fn variables_in_first_use_order() {
        let mut ws = Workspace::default();
        let set = ws.create_block("variables_set").unwrap();
        ws.set_field(set, "VAR", FieldValue::from("total")).unwrap();
        let get = ws.create_block("variables_get").unwrap();
        ws.set_field(get, "VAR", FieldValue::from("x")).unwrap();
        let again = ws.create_block("variables_get").unwrap();
        ws.set_field(again, "VAR", FieldValue::from("total")).unwrap();
        assert_eq!(ws.variables(), vec!["total".to_string(), "x".to_string()]);
    }
}
