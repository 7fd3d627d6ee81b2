//! Domain Layer
//!
//! Core business entity definitions

pub mod agent;
pub mod defense;

pub use agent::*;
pub use defense::*;
