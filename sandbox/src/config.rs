use serde::Deserialize;

/// Limits and canned responses for sandbox runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Statements and loop iterations a run may execute before it is stopped.
    pub step_limit: u64,
    /// Nesting of function calls before a run fails with a stack overflow.
    pub max_call_depth: usize,
    /// Nesting of expressions and statement blocks, calls included, before a
    /// run fails with a stack overflow.
    pub max_nesting: usize,
    /// What `prompt()` returns during a run.
    pub prompt_response: String,
    /// What `confirm()` returns during a run.
    pub confirm_response: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            step_limit: 1_000_000,
            max_call_depth: 64,
            max_nesting: 160,
            prompt_response: "0".to_string(),
            confirm_response: false,
        }
    }
}
