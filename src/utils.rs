//! Utility functions for coordinate conversion.

pub mod safe_cast;
