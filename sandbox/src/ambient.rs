//! Interactive functions of the script environment (`prompt`, `alert`,
//! `confirm`) and their interception during runs.

use std::io::{BufRead, Write};

use crate::config::SandboxConfig;

/// Where the interactive globals go.
pub trait Ambient {
    /// `None` when the user dismissed the prompt.
    fn prompt(&mut self, message: &str) -> Option<String>;
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
}

/// The real terminal: prompts on stderr, answers from stdin.
#[derive(Debug, Default)]
pub struct HostAmbient;

impl HostAmbient {
    fn read_line(message: &str) -> Option<String> {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{message} ");
        let _ = stderr.flush();
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Ambient for HostAmbient {
    fn prompt(&mut self, message: &str) -> Option<String> {
        HostAmbient::read_line(message)
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&mut self, message: &str) -> bool {
        HostAmbient::read_line(&format!("{message} [y/N]"))
            .is_some_and(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
    }
}

/// Deterministic stand-in installed for the duration of every run.
#[derive(Debug, Clone)]
pub struct CannedAmbient {
    prompt_response: String,
    confirm_response: bool,
    /// Messages passed to `alert`.
    pub alerts: Vec<String>,
}

impl CannedAmbient {
    pub fn new(config: &SandboxConfig) -> Self {
        CannedAmbient {
            prompt_response: config.prompt_response.clone(),
            confirm_response: config.confirm_response,
            alerts: Vec::new(),
        }
    }
}

impl Ambient for CannedAmbient {
    fn prompt(&mut self, message: &str) -> Option<String> {
        tracing::debug!(message, response = %self.prompt_response, "answered prompt");
        Some(self.prompt_response.clone())
    }

    fn alert(&mut self, message: &str) {
        tracing::debug!(message, "suppressed alert");
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!(message, response = self.confirm_response, "answered confirm");
        self.confirm_response
    }
}

/// Swaps an ambient into `slot` and puts the previous one back when
/// dropped, on normal return, early return and unwinding alike.
pub struct AmbientGuard<'a> {
    slot: &'a mut Box<dyn Ambient>,
    saved: Option<Box<dyn Ambient>>,
}

impl<'a> AmbientGuard<'a> {
    pub fn install(slot: &'a mut Box<dyn Ambient>, replacement: Box<dyn Ambient>) -> Self {
        let saved = std::mem::replace(slot, replacement);
        AmbientGuard {
            slot,
            saved: Some(saved),
        }
    }

    /// The ambient in effect while the guard lives.
    pub fn ambient(&mut self) -> &mut dyn Ambient {
        self.slot.as_mut()
    }
}

impl Drop for AmbientGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.slot = saved;
        }
    }
}
