//! Single-Worker-Per-Resource Actor Runtime
//!
//! Every hardware peripheral and the web server is owned by exactly one
//! actor: a worker task draining a bounded mailbox. Producers enqueue
//! messages and never wait for processing; the owning worker executes the
//! hardware operation on its own task and forwards result notifications as
//! further messages. Cross-actor communication is one-way — there is no
//! blocking request/response between actors, so workers cannot deadlock on
//! each other.
//!
//! ```text
//! ┌──────────────┐  send/post   ┌─────────────────────────────┐
//! │  producers   │─────────────▶│ Mailbox (bounded FIFO)      │
//! │ (other actors│              │   └─▶ worker task            │
//! │  callbacks)  │              │        recv → handle → loop  │
//! └──────────────┘              └─────────────────────────────┘
//! ```
//!
//! Two enqueue paths:
//! - [`Mailbox::send`] — asynchronous, blocks the producer only while the
//!   mailbox is full.
//! - [`Mailbox::post`] — for interrupt/callback contexts that must never
//!   block: a full mailbox drops the message, logs, and counts the drop.

pub mod actor;
pub mod mailbox;

pub use actor::{spawn, Actor, Flow};
pub use mailbox::{mailbox, Mailbox, MailboxReceiver, SendError};

/// Default mailbox depth used by every actor in the device.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 32;
