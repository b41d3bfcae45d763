//! Domain types and the ports the facade talks through.

pub mod gateway;
pub mod money;
pub mod order;
pub mod ports;
