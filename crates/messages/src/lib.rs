//! The wire contract between saga participants.
//!
//! Every participant communicates exclusively through [`Command`]s and
//! [`Event`]s wrapped in a [`MessageEnvelope`]. Messages are immutable
//! once published and always carry the order ID as correlation key.

pub mod commands;
pub mod envelope;
pub mod events;

pub use commands::{Command, CommandKind};
pub use envelope::{Message, MessageEnvelope};
pub use events::{Event, EventKind};
