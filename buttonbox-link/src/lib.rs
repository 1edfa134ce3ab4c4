//! # Buttonbox Link
//!
//! Keeps one serial link to the button panel alive.
//!
//! The [`Supervisor`] opens the link, retrying until it succeeds, then runs
//! one session of three worker threads bound to it:
//!
//! ```text
//! link --> reader --> inbound queue
//! outbound queue --> writer --> link
//! heartbeat --> outbound queue
//! ```
//!
//! When the panel goes away the session is torn down and the supervisor goes
//! back to opening. The queues outlive sessions, so whatever sits above them
//! never notices a reconnect.

mod cancel;
mod link;
mod queue;
mod session;
mod supervisor;

pub use cancel::CancelToken;
pub use link::{Connector, Link, LinkError, SerialConnector, DEFAULT_BAUD_RATE};
pub use queue::{
    byte_queue, pop, push, ByteReceiver, ByteSender, QueueError, DEFAULT_QUEUE_CAPACITY,
};
pub use session::{run_heartbeat, run_reader, run_writer, Session, SessionQueues};
pub use supervisor::{Supervisor, SupervisorConfig};
