pub mod config;
pub mod dtos;
pub mod services;
