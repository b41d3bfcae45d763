//! Application layer orchestrating the gateway calls.
//!
//! This module defines the `Facade`, the single entry point the checkout flow
//! uses to charge, capture and manage stored cards.

pub mod facade;
