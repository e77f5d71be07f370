//! Test Helper Utilities
//!
//! Shared utilities for testing dfscan-core

#![allow(dead_code)]

pub mod image_generator;
pub mod log_capture;

pub use image_generator::{checkerboard, flat, gradient, noisy, skin_patch, warm_gradient, write_image};
pub use log_capture::LogCapture;
