//! Engine core: the serial queue, its identifiers, and its bookkeeping.
//!
//! The only public API from this module is [`SerialQueue`] plus the types
//! that appear in its signatures ([`TaskId`], [`QueueSnapshot`]).
//!
//! Internal modules:
//! - [`core`]: the engine itself (submission, cancellation, drain loop);
//! - [`ids`]: identifier allocation;
//! - [`state`]: the guarded pending-queue / registry / reply bookkeeping.

mod core;
pub(crate) mod ids;
mod state;

pub use self::core::SerialQueue;
pub use ids::TaskId;
pub use state::QueueSnapshot;
