//! Foundation utilities shared by every subsystem

pub mod collections;
pub mod logging;
pub mod math;
