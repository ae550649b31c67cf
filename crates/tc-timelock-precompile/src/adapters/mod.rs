//! # Adapters

pub mod struct_store;

pub use struct_store::*;
