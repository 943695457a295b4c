use crate::RenderError;
use crate::recorder::{DrawCommand, DrawList};
use actorloop_assets::AssetId;
use actorloop_common::{Aabb, Camera, Color};
use glam::Vec3;
use std::fmt::Write;

/// Where a backend is in the frame's scope nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Between frames.
    Idle,
    /// Inside `begin_frame`/`end_frame`, outside 3D mode.
    Frame,
    /// Inside `begin_3d`/`end_3d`.
    World3d,
}

/// Renderer-agnostic interface to a windowing/rendering library.
///
/// The driver brackets every frame with `begin_frame`/`end_frame` and the
/// world pass with `begin_3d`/`end_3d`. Mesh and wireframe draws belong inside
/// the 3D scope; text and clears belong inside the frame.
pub trait RenderBackend {
    /// Polled once per frame boundary; `true` ends the frame loop.
    fn should_terminate(&self) -> bool;

    fn begin_frame(&mut self) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;

    fn clear_background(&mut self, color: Color);

    fn begin_3d(&mut self, camera: &Camera) -> Result<(), RenderError>;

    fn end_3d(&mut self) -> Result<(), RenderError>;

    fn draw_mesh(&mut self, asset: AssetId, position: Vec3, tint: Color);

    fn draw_wire_box(&mut self, bounds: Aabb, tint: Color);

    fn draw_wire_sphere(&mut self, center: Vec3, radius: f32, tint: Color);

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: u32, tint: Color);
}

/// Text renderer for recorded frames.
///
/// Produces a human-readable listing of a [`DrawList`]. Useful for headless
/// runs, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &DrawList) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ({} commands) ===", frame.frame(), frame.len());
        if let Some(cam) = frame.camera() {
            let _ = writeln!(
                out,
                "Camera: pos=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fovy={:.0}",
                cam.position.x,
                cam.position.y,
                cam.position.z,
                cam.target.x,
                cam.target.y,
                cam.target.z,
                cam.fovy
            );
        }

        for command in frame.commands() {
            match command {
                DrawCommand::Clear(color) => {
                    let _ = writeln!(out, "  clear {}", hex(*color));
                }
                DrawCommand::Mesh {
                    asset,
                    position: p,
                    tint,
                } => {
                    let _ = writeln!(
                        out,
                        "  mesh asset={} pos=({:.3}, {:.3}, {:.3}) tint={}",
                        asset.0,
                        p.x,
                        p.y,
                        p.z,
                        hex(*tint)
                    );
                }
                DrawCommand::WireBox { bounds, tint } => {
                    let (a, b) = (bounds.min, bounds.max);
                    let _ = writeln!(
                        out,
                        "  wire box min=({:.3}, {:.3}, {:.3}) max=({:.3}, {:.3}, {:.3}) tint={}",
                        a.x,
                        a.y,
                        a.z,
                        b.x,
                        b.y,
                        b.z,
                        hex(*tint)
                    );
                }
                DrawCommand::WireSphere {
                    center: c,
                    radius,
                    tint,
                } => {
                    let _ = writeln!(
                        out,
                        "  wire sphere center=({:.3}, {:.3}, {:.3}) r={:.2} tint={}",
                        c.x,
                        c.y,
                        c.z,
                        radius,
                        hex(*tint)
                    );
                }
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    size,
                    tint,
                } => {
                    let _ = writeln!(out, "  text ({x}, {y}) {size}px {} {text:?}", hex(*tint));
                }
            }
        }
        out
    }
}

/// `#RRGGBB` for a color, alpha ignored.
fn hex(color: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02X}{:02X}{:02X}",
        channel(color.r),
        channel(color.g),
        channel(color.b)
    )
}
