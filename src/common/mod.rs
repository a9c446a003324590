//! Common traits and helpers used across the jsonecho library
//!
//! This module contains the server trait and the test helpers that
//! spin up servers on ephemeral ports.

pub mod test_utils;
pub mod traits;

pub use test_utils::spawn_test_server;
pub use traits::EchoServerTrait;
