//! Shared runtime types for the realm planner.
//!
//! Holds the per-turn command alphabet and the text parsers for commands and
//! order impulse strings, without depending on the board model in `core_plan`.

pub mod command_text;
pub mod commands;

pub use command_text::{parse_impulses, CommandParseError, ImpulseParseError};
pub use commands::{Command, Impulse, OrderImpulse, IMPULSES_PER_TURN};
