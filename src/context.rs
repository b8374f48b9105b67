//! Window + GL context bootstrap shared by both demo binaries.
//!
//! This is the usual winit/glutin/glow dance: pick a config, create a context
//! and window surface, make it current, enable vsync, and hand back a glow
//! context wrapped in `Arc` so the compiler collaborator can hold a handle too.

use std::ffi::CString;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Fullscreen, Window};

pub const DEFAULT_SIZE: (u32, u32) = (1280, 720);

pub struct GlWindow {
    pub window: Window,
    pub gl_surface: Surface<WindowSurface>,
    pub gl_context: PossiblyCurrentContext,
    pub gl: Arc<glow::Context>,
}

impl GlWindow {
    pub fn build(event_loop: &EventLoop<()>, title: &str) -> anyhow::Result<Self> {
        let window_builder = winit::window::WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8).with_depth_size(0);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
                    .unwrap()
            })
            .map_err(|e| anyhow!("failed to build display: {e}"))?;

        let window = window.ok_or_else(|| anyhow!("no window created"))?;

        let raw_window_handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window_handle));

        let not_current_gl_context: NotCurrentContext = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .context("create_context failed")?
        };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(size.width.max(1)).unwrap(),
            NonZeroU32::new(size.height.max(1)).unwrap(),
        );

        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("create_window_surface failed")?
        };

        let gl_context = not_current_gl_context
            .make_current(&gl_surface)
            .context("make_current failed")?;

        gl_surface
            .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::new(1).unwrap()))
            .ok();

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                gl_display.get_proc_address(&CString::new(s).unwrap()) as *const _
            })
        };

        Ok(Self {
            window,
            gl_surface,
            gl_context,
            gl: Arc::new(gl),
        })
    }

    pub fn resize(&self, w: u32, h: u32) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(w), NonZeroU32::new(h)) {
            self.gl_surface.resize(&self.gl_context, w, h);
        }
    }

    pub fn toggle_fullscreen(&self) {
        if self.window.fullscreen().is_some() {
            self.window.set_fullscreen(None);
        } else {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }

    pub fn swap(&self) -> anyhow::Result<()> {
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .context("swap_buffers failed")
    }
}
