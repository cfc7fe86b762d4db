//! Common types used throughout playlog.
//!
//! Raw source events, their normalized projection, the play timestamp and the tabular store.

mod event;
mod played_at;
mod raw;
mod store;

pub use event::*;
pub use played_at::*;
pub use raw::*;
pub use store::*;
