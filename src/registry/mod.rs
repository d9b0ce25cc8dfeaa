//! Model registry on top of object storage
//!
//! The registry is a prefix holding one directory per pushed model, named
//! by integer unix timestamp, each with a single serialized model file.

mod resolver;
mod store;

pub use resolver::{ModelResolver, RegistryEntry};
pub use store::{LocalObjectStore, ObjectStore};
