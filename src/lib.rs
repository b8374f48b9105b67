//! shaderbooth — a pair of GLSL shader demo apps with hot reload.
//!
//! The library holds everything the two binaries share:
//! - `reload`: the shader hot-reload controller (timestamp-poll dirty check)
//! - `shader`: GL program compilation + uniform conventions
//! - `context`: winit/glutin/glow window bootstrap
//! - `geometry`: the four demo shapes
//! - `audio`: microphone capture + FFT spectrum (audio variant only)
//! - `config`: assets discovery and the optional `booth.json`

pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod reload;
pub mod shader;
