#[allow(clippy::module_inception)]
mod cli;

pub use cli::{ask_on_terminal, help_text, Command, CommandArgs};
