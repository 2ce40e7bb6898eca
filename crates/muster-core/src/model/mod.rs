//! Domain model: message classification enums, message fields, and the
//! per-recipient state record.

pub mod message;
pub mod recipient;

pub use message::{MessageFields, MessageKind, ParseEnumError, Priority, Role};
pub use recipient::RecipientState;
