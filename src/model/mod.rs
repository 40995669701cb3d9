//! SDK data models

pub mod config;
pub mod token;
