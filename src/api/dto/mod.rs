//! Data Transfer Objects for REST request/response serialization.

pub mod broadcast_dto;
pub mod server_dto;

pub use broadcast_dto::*;
pub use server_dto::*;
