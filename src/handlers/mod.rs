//! HTTP handlers: generic resource CRUD plus the domain operations layered on top.

pub mod adopters;
pub mod adoptions;
pub mod entity;
pub mod pets;
pub mod query;
pub mod shelters;
pub mod upload;
