//! Repositorios del sistema

pub mod fleet_repository;

pub use fleet_repository::{FleetRepository, MemoryFleetRepository};
