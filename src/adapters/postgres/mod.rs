//! PostgreSQL adapter for the registry store

pub mod client;
pub mod store;

pub use client::RegistryClient;
pub use store::RegistryStore;
