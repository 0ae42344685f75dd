//! Core functionality: document storage, rendering, name validation, and configuration

pub mod config;
pub mod document;
pub mod error;
pub mod file_system;
pub mod render;
pub mod validation;
