//! Change feed for consumers that re-render on state changes.
//!
//! The store fans out a [`StateChange`] after every recomputation. Delivery
//! never blocks the store: a full watcher buffer drops the event, and a
//! dropped watcher is pruned on the next fan-out.
//!
//! Only the store publishes; consumers get receiving handles and cannot
//! inject events:
//!
//! ```compile_fail
//! use kyrofacet::watch::WatchHub;
//! ```

/// Change event types.
pub mod events;
mod hub;
/// Subscriber handle.
pub mod stream;

pub use events::{ChangeCause, StateChange, WatcherId};
pub(crate) use hub::WatchHub;
pub use stream::StateWatcher;
