//! Scheduler containers

mod protocol;

pub use protocol::Scheduler;
