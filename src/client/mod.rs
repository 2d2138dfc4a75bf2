//! Client-side state for the voting front end.
//!
//! Everything here is single-writer: the owning component holds the controller or feed
//! and hands read access to children. Network awaits are the only suspension points,
//! and no lock is held across one.

mod api;
mod comments;
mod feed;
mod session;
mod vote;
mod window;

#[cfg(test)]
mod testing;

pub use api::*;
pub use comments::*;
pub use feed::*;
pub use session::*;
pub use vote::*;
pub use window::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a state mutex. A panic while holding it leaves plain data behind, so a
/// poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
