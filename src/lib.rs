//! Progressive GPU path tracer.

pub mod accumulation;
pub mod backend;
pub mod camera;
pub mod demo;
pub mod error;
pub mod geometry;
pub mod gpu_backend;
pub mod headless;
pub mod motion;
pub mod orchestrator;
pub mod passes;
pub mod quality;
pub mod scene;
pub mod settings;
pub mod wgpu_ctx;
pub mod wgpu_utils;

pub use error::{Result, TracerError};
