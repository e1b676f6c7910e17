//! Utility modules and helper functions
//!
//! This module contains shared utilities and helper functions used across the application.

pub mod file_utils;
pub mod logging;
pub mod network;

// Re-export commonly used utilities
pub use file_utils::*;
pub use logging::*;
pub use network::*;
