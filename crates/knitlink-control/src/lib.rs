//! Control-channel messages.
//!
//! Every text unit on the connection carries one JSON object with an integer
//! `id`, an optional `data` payload and an optional `result` code. Replies use
//! the request id plus [`REPLY_FLAG`].

pub mod envelope;
pub mod error;
pub mod id;
pub mod payload;

pub use envelope::{parse, Envelope};
pub use error::{ControlError, Result};
pub use id::{MessageId, WireId, REPLY_FLAG};
pub use payload::{FileEntry, FileList, FirmwareBuild, NetworkParams, SystemInfo, VersionInfo};
