use crate::block::BlockId;

/// A rejected graph edit. The workspace is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),

    #[error("socket `{socket}` of block {parent} expects {expected}, but block {child} provides {found}")]
    TypeMismatch {
        parent: BlockId,
        socket: String,
        child: BlockId,
        expected: String,
        found: String,
    },

    #[error("connecting block {child} under block {parent} would create a cycle")]
    CycleDetected { parent: BlockId, child: BlockId },

    #[error("block {block} is already followed by block {existing}")]
    ChainConflict { block: BlockId, existing: BlockId },

    #[error("block {0} does not exist")]
    UnknownBlock(BlockId),

    #[error("block {block} ({type_name}) has no input named `{socket}`")]
    UnknownSocket {
        block: BlockId,
        type_name: String,
        socket: String,
    },

    #[error("block {block} ({type_name}) has no field named `{field}`")]
    UnknownField {
        block: BlockId,
        type_name: String,
        field: String,
    },

    #[error("invalid value for field `{field}` of block {block}: {reason}")]
    InvalidField {
        block: BlockId,
        field: String,
        reason: String,
    },

    #[error("invalid mutation for block {block} ({type_name}): {reason}")]
    InvalidMutation {
        block: BlockId,
        type_name: String,
        reason: String,
    },

    #[error("block {block} ({type_name}) has no {connection} connection")]
    MissingConnection {
        block: BlockId,
        type_name: String,
        connection: &'static str,
    },

    #[error("no procedure named `{0}` is defined")]
    UnknownProcedure(String),
}
