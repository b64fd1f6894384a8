//! Search provider implementations.

pub mod brave;

pub use brave::{BraveConfig, BraveSearchProvider};
