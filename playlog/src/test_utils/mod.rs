//! Testing utilities for playlog.
//!
//! [`event`] builds raw events shaped like the source's payload, normalized events and stores.
//! [`faulty`] provides sources, stores and logs that fail in controlled ways.

pub mod event;
pub mod faulty;
