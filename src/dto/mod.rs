//! DTOs de la API

pub mod fleet_dto;
pub mod opscenter_dto;
pub mod webhook_dto;
