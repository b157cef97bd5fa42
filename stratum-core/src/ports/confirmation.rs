//! Confirmation port - yes/no gate for guarded operations
//!
//! The core never talks to a terminal. Interactive frontends implement this
//! trait; any non-affirmative answer declines the gated action.

use crate::domain::result::Result;

/// Yes/no prompt abstraction
pub trait Confirmation {
    /// Ask to confirm `prompt`. Returning `false` declines the action.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Gate that affirms every prompt, for non-interactive callers
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}
