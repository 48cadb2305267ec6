//! API handlers for Inventra REST endpoints

pub mod health;
pub mod items;
pub mod jobs;
pub mod maintenance;
pub mod openapi;
pub mod transactions;
