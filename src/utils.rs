//! Utility functions for numeric conversions and image loading.

pub mod image_conversion;
pub mod safe_cast;
