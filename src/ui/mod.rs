//! ui
//!
//! Everything the user sees or answers.
//!
//! - [`output`]: lock tables, messages and warnings on the terminal
//! - [`prompts`]: alerts and yes/no questions behind the `Prompter` trait,
//!   with a non-interactive fallback that never blocks
//!
//! The engine only talks to `Prompter`; command handlers own `output`.

pub mod output;
pub mod prompts;
