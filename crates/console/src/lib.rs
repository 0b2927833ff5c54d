//! `rolegate-console`: the permission mutation engine behind the admin console.
//!
//! A [`Console`] owns the committed users and the audit trail. Edits are staged
//! against an explicit [`Session`] and only become the stored truth on
//! [`Console::commit`].

pub mod admission;
pub mod console;
pub mod demo;
pub mod email;
pub mod errors;
pub mod events;
pub mod session;

pub use admission::NewUser;
pub use console::Console;
pub use email::{EmailAvailability, EmailStatus, LookupId, LookupOutcome, LookupRequest};
pub use errors::{ConsoleError, ConsoleResult};
pub use events::ConsoleEvent;
pub use session::Session;
