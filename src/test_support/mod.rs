//! Helpers shared by unit tests.

pub mod scripted_source;
pub mod socket_guard;
