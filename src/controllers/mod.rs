//! Controladores de la API

pub mod dispatch_controller;
pub mod fleet_controller;
pub mod opscenter_controller;
