//! Configuración del sistema

pub mod environment;

pub use environment::{EnvironmentConfig, TraccarConfig};
