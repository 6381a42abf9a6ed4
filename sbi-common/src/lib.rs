//! Common utilities for the sbi-matrix toolkit

pub mod error;

pub use error::{Error, PointSide, Result};
