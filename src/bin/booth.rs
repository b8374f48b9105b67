//! No-input shader demo.
//!
//! Keys:
//!   i   - info overlay (window title) on/off
//!   esc - fullscreen on/off
//!   v   - pick next vertex shader in assets/shaders
//!   f   - pick next fragment shader in assets/shaders
//!   m   - cycle drawing mode (rect/triangle/circle/sphere)
//!
//! Saving either shader file hot-reloads it on the next frame; a broken save
//! keeps the last good program running and surfaces the compile log.

use std::time::Instant;

use anyhow::anyhow;
use glow::HasContext;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use shaderbooth::config::{self, load_booth_config, next_source, AssetsRoot};
use shaderbooth::context::GlWindow;
use shaderbooth::geometry::{DrawMode, ShapeSet};
use shaderbooth::reload::ShaderReloadController;
use shaderbooth::shader::{self, GlCompiler};
use shaderbooth::{loge, logi};

const TAG: &str = "booth";

fn main() -> anyhow::Result<()> {
    let assets = AssetsRoot::discover(&std::env::current_dir()?)
        .ok_or_else(|| anyhow!("could not locate assets/ (set {})", config::ASSETS_ENV))?;
    let cfg = load_booth_config(&assets.join("booth.json"));
    logi!(TAG, "assets: {}", assets.path().display());

    let vert_path = assets.resolve(&cfg.vert);
    let frag_path = assets.resolve(&cfg.frag);
    let shaders_dir = assets.join("shaders");

    let event_loop = EventLoop::new()?;
    let glw = GlWindow::build(&event_loop, "shaderbooth")?;
    let gl = glw.gl.clone();

    let mut controller =
        ShaderReloadController::new(GlCompiler::new(gl.clone()), vert_path, frag_path);
    controller.reload();
    report_reload(&controller);

    let shapes = ShapeSet::create(&gl);

    let mut mode = cfg.mode;
    let mut overlay = cfg.overlay;
    let start = Instant::now();
    let mut frames = 0u32;
    let mut fps = 0.0f32;
    let mut fps_since = Instant::now();

    set_title(&glw.window, overlay, mode, &controller, fps);

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target.exit(),

                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state.is_pressed() {
                        if let PhysicalKey::Code(code) = event.physical_key {
                            match code {
                                KeyCode::KeyI => overlay = !overlay,
                                KeyCode::Escape => glw.toggle_fullscreen(),
                                KeyCode::KeyM => {
                                    mode = mode.next();
                                    logi!(TAG, "mode -> {}", mode.label());
                                }
                                KeyCode::KeyV => {
                                    if let Some(next) =
                                        next_source(&shaders_dir, "vert", controller.vert_path())
                                    {
                                        logi!(TAG, "vert -> {}", next.display());
                                        let frag = controller.frag_path().to_path_buf();
                                        controller.set_paths(next, frag);
                                        controller.reload();
                                        report_reload(&controller);
                                    }
                                }
                                KeyCode::KeyF => {
                                    if let Some(next) =
                                        next_source(&shaders_dir, "frag", controller.frag_path())
                                    {
                                        logi!(TAG, "frag -> {}", next.display());
                                        let vert = controller.vert_path().to_path_buf();
                                        controller.set_paths(vert, next);
                                        controller.reload();
                                        report_reload(&controller);
                                    }
                                }
                                _ => {}
                            }
                            set_title(&glw.window, overlay, mode, &controller, fps);
                        }
                    }
                }

                WindowEvent::Resized(new_size) => {
                    glw.resize(new_size.width, new_size.height);
                }

                WindowEvent::RedrawRequested => {
                    if controller.poll_and_maybe_reload() {
                        report_reload(&controller);
                        set_title(&glw.window, overlay, mode, &controller, fps);
                    }

                    let size = glw.window.inner_size();
                    let (w, h) = (size.width as i32, size.height as i32);

                    unsafe {
                        gl.viewport(0, 0, w, h);
                        gl.clear_color(0.0, 0.0, 0.0, 1.0);
                        gl.clear(glow::COLOR_BUFFER_BIT);
                    }

                    // Renders nothing until the first successful compile.
                    if let Some(&program) = controller.current_shader() {
                        unsafe { gl.use_program(Some(program)) };
                        shader::set_i_resolution(&gl, program, w, h);
                        shader::set_i_global_time(&gl, program, start.elapsed().as_secs_f32());
                        shapes.mesh(mode).draw(&gl);
                        unsafe { gl.use_program(None) };
                    }

                    if let Err(e) = glw.swap() {
                        loge!(TAG, "{e}");
                    }

                    frames += 1;
                    let elapsed = fps_since.elapsed().as_secs_f32();
                    if elapsed >= 1.0 {
                        fps = frames as f32 / elapsed;
                        frames = 0;
                        fps_since = Instant::now();
                        set_title(&glw.window, overlay, mode, &controller, fps);
                    }
                }

                _ => {}
            },

            Event::AboutToWait => {
                glw.window.request_redraw();
            }

            _ => {}
        }
    })?;

    Ok(())
}

fn report_reload(controller: &ShaderReloadController<GlCompiler>) {
    if controller.current_error().is_empty() {
        logi!(
            TAG,
            "shader loaded: {} + {}",
            controller.vert_path().display(),
            controller.frag_path().display()
        );
    } else {
        loge!(TAG, "{}", controller.current_error());
    }
}

fn set_title(
    window: &Window,
    overlay: bool,
    mode: DrawMode,
    controller: &ShaderReloadController<GlCompiler>,
    fps: f32,
) {
    if !overlay {
        window.set_title("shaderbooth");
        return;
    }

    let file_name = |p: &std::path::Path| {
        p.file_name().and_then(|s| s.to_str()).unwrap_or("?").to_string()
    };

    let mut title = format!(
        "shaderbooth | mode (m): {} | vert (v): {} | frag (f): {} | fps: {:.0}",
        mode.label(),
        file_name(controller.vert_path()),
        file_name(controller.frag_path()),
        fps
    );
    if let Some(first_line) = controller.current_error().lines().next() {
        title.push_str(&format!(" | error: {first_line}"));
    }
    window.set_title(&title);
}
