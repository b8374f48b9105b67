//! GL program compilation and the demo uniform conventions.
//!
//! Loaded shaders all see the same interface:
//! - `iResolution` (vec2): framebuffer size in pixels
//! - `iGlobalTime` (float): seconds since app start
//! - `iSpectrum` (sampler2D, audio variant): 512x1 FFT magnitude texture
//!
//! Compilation returns `Result` with the driver's info log so a broken save
//! keeps the previous program running instead of tearing the app down.

use std::sync::Arc;

use glow::HasContext;

use crate::error::{ReloadError, ShaderStage};
use crate::reload::ShaderCompiler;

/// `ShaderCompiler` backed by a live glow context.
pub struct GlCompiler {
    gl: Arc<glow::Context>,
}

impl GlCompiler {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }
}

impl ShaderCompiler for GlCompiler {
    type Program = glow::NativeProgram;

    fn compile(&mut self, vert_src: &str, frag_src: &str) -> Result<Self::Program, ReloadError> {
        unsafe { compile_program(&self.gl, vert_src, frag_src) }
    }

    fn release(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) };
    }
}

unsafe fn compile_stage(
    gl: &glow::Context,
    kind: u32,
    stage: ShaderStage,
    src: &str,
) -> Result<glow::NativeShader, ReloadError> {
    let shader = gl
        .create_shader(kind)
        .map_err(|log| ReloadError::Compile { stage, log })?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(ReloadError::Compile { stage, log });
    }
    Ok(shader)
}

unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, ReloadError> {
    let vs = compile_stage(gl, glow::VERTEX_SHADER, ShaderStage::Vertex, vert_src)?;
    let fs = match compile_stage(gl, glow::FRAGMENT_SHADER, ShaderStage::Fragment, frag_src) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(p) => p,
        Err(log) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(ReloadError::Link { log });
        }
    };

    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(ReloadError::Link { log });
    }

    Ok(program)
}

// NOTE: glow uniform calls are unsafe; wrap them here.
pub fn set_i_resolution(gl: &glow::Context, prog: glow::NativeProgram, w: i32, h: i32) {
    unsafe {
        if let Some(loc) = gl.get_uniform_location(prog, "iResolution") {
            gl.uniform_2_f32(Some(&loc), w as f32, h as f32);
        }
    }
}

pub fn set_i_global_time(gl: &glow::Context, prog: glow::NativeProgram, t: f32) {
    unsafe {
        if let Some(loc) = gl.get_uniform_location(prog, "iGlobalTime") {
            gl.uniform_1_f32(Some(&loc), t);
        }
    }
}

pub fn set_i_spectrum_unit(gl: &glow::Context, prog: glow::NativeProgram, unit: i32) {
    unsafe {
        if let Some(loc) = gl.get_uniform_location(prog, "iSpectrum") {
            gl.uniform_1_i32(Some(&loc), unit);
        }
    }
}

/// 512x1 single-channel float texture holding the latest FFT magnitudes.
#[derive(Debug)]
pub struct SpectrumTexture {
    tex: glow::NativeTexture,
    bands: usize,
}

impl SpectrumTexture {
    pub fn create(gl: &glow::Context, bands: usize) -> Self {
        let tex = unsafe {
            let tex = gl.create_texture().expect("create_texture failed");
            gl.bind_texture(glow::TEXTURE_2D, Some(tex));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::R32F as i32,
                bands as i32,
                1,
                0,
                glow::RED,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(None),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            tex
        };
        Self { tex, bands }
    }

    /// Upload the latest magnitudes; `spectrum` must hold `bands` values.
    pub fn update(&self, gl: &glow::Context, spectrum: &[f32]) {
        debug_assert_eq!(spectrum.len(), self.bands);
        unsafe {
            let bytes = core::slice::from_raw_parts(
                spectrum.as_ptr() as *const u8,
                std::mem::size_of_val(spectrum),
            );
            gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                self.bands as i32,
                1,
                glow::RED,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytes)),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    /// Bind on the given texture unit for the draw that follows.
    pub fn bind(&self, gl: &glow::Context, unit: u32) {
        unsafe {
            gl.active_texture(glow::TEXTURE0 + unit);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
        }
    }
}
