//! TCP server front end.

pub mod listener;
