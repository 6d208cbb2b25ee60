//! Application layer for configurator-bridge.
//!
//! - [`hub`]: fans inbound payloads out to scoped subscriptions.
//! - [`session`]: the [`Harness`], which holds state and forms and sends
//!   commands.
//! - [`console`]: the operator's command language on top of a harness.

pub mod console;
pub mod hub;
pub mod session;

pub use console::{execute, parse_line, ConsoleCommand, ConsoleError, ConsoleOutcome};
pub use hub::{MessageHub, Subscription};
pub use session::Harness;
