//! Deferred scheduling subsystem.
//!
//! Internal only: the pool is owned by
//! [`SerialQueue`](crate::SerialQueue) and reached through the
//! `*_delay` submission methods.

mod pool;

pub(crate) use pool::{DelayCancel, DelayPool};
