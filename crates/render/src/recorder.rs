use crate::RenderError;
use crate::renderer::{RenderBackend, Scope};
use actorloop_assets::AssetId;
use actorloop_common::{Aabb, Camera, Color};
use glam::Vec3;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Mesh {
        asset: AssetId,
        position: Vec3,
        tint: Color,
    },
    WireBox {
        bounds: Aabb,
        tint: Color,
    },
    WireSphere {
        center: Vec3,
        radius: f32,
        tint: Color,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
        size: u32,
        tint: Color,
    },
}

/// Everything drawn during one frame, in call order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    frame: u64,
    camera: Option<Camera>,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Zero-based index of the frame this list was recorded in.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Camera of the frame's 3D scope, if it had one.
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last clear color of the frame.
    pub fn clear_color(&self) -> Option<Color> {
        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::Clear(color) => Some(*color),
            _ => None,
        })
    }

    pub fn meshes(&self) -> impl Iterator<Item = (AssetId, Vec3, Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Mesh {
                asset,
                position,
                tint,
            } => Some((*asset, *position, *tint)),
            _ => None,
        })
    }

    /// Wire boxes and spheres, in call order.
    pub fn wires(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| {
            matches!(
                c,
                DrawCommand::WireBox { .. } | DrawCommand::WireSphere { .. }
            )
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { .. }))
    }
}

/// Backend that records each frame into a [`DrawList`] and checks scope
/// nesting.
///
/// Termination is either requested explicitly or triggered by an optional
/// frame budget. Windowed backends hand the finished list to the GPU; headless
/// runs print it.
#[derive(Debug)]
pub struct FrameRecorder {
    scope: Scope,
    current: DrawList,
    finished: Option<DrawList>,
    frames_recorded: u64,
    frame_limit: Option<u64>,
    terminate_requested: bool,
    out_of_scope: usize,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self {
            scope: Scope::Idle,
            current: DrawList::default(),
            finished: None,
            frames_recorded: 0,
            frame_limit: None,
            terminate_requested: false,
            out_of_scope: 0,
        }
    }
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate after `frames` completed frames.
    pub fn with_frame_limit(frames: u64) -> Self {
        Self {
            frame_limit: Some(frames),
            ..Self::default()
        }
    }

    /// Ask the loop to stop at the next frame boundary.
    pub fn request_terminate(&mut self) {
        self.terminate_requested = true;
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn frames_recorded(&self) -> u64 {
        self.frames_recorded
    }

    /// The most recently completed frame.
    pub fn last_frame(&self) -> Option<&DrawList> {
        self.finished.as_ref()
    }

    /// Take the most recently completed frame.
    pub fn take_frame(&mut self) -> Option<DrawList> {
        self.finished.take()
    }

    fn expect_scope(&self, call: &'static str, expected: Scope) -> Result<(), RenderError> {
        if self.scope == expected {
            Ok(())
        } else {
            Err(RenderError::ScopeMismatch {
                call,
                expected,
                found: self.scope,
            })
        }
    }

    fn record(&mut self, allowed: &[Scope], command: DrawCommand) {
        if allowed.contains(&self.scope) {
            self.current.commands.push(command);
        } else {
            tracing::warn!(scope = ?self.scope, ?command, "draw call outside its scope");
            self.out_of_scope += 1;
        }
    }
}

const IN_FRAME: &[Scope] = &[Scope::Frame, Scope::World3d];
const IN_3D: &[Scope] = &[Scope::World3d];

impl RenderBackend for FrameRecorder {
    fn should_terminate(&self) -> bool {
        self.terminate_requested
            || self
                .frame_limit
                .is_some_and(|limit| self.frames_recorded >= limit)
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.expect_scope("begin_frame", Scope::Idle)?;
        self.scope = Scope::Frame;
        self.current = DrawList {
            frame: self.frames_recorded,
            ..DrawList::default()
        };
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.expect_scope("end_frame", Scope::Frame)?;
        self.scope = Scope::Idle;
        self.frames_recorded += 1;
        self.finished = Some(std::mem::take(&mut self.current));
        let stray = std::mem::take(&mut self.out_of_scope);
        if stray > 0 {
            return Err(RenderError::OutOfScopeDraws(stray));
        }
        Ok(())
    }

    fn clear_background(&mut self, color: Color) {
        self.record(IN_FRAME, DrawCommand::Clear(color));
    }

    fn begin_3d(&mut self, camera: &Camera) -> Result<(), RenderError> {
        self.expect_scope("begin_3d", Scope::Frame)?;
        self.scope = Scope::World3d;
        self.current.camera = Some(*camera);
        Ok(())
    }

    fn end_3d(&mut self) -> Result<(), RenderError> {
        self.expect_scope("end_3d", Scope::World3d)?;
        self.scope = Scope::Frame;
        Ok(())
    }

    fn draw_mesh(&mut self, asset: AssetId, position: Vec3, tint: Color) {
        self.record(
            IN_3D,
            DrawCommand::Mesh {
                asset,
                position,
                tint,
            },
        );
    }

    fn draw_wire_box(&mut self, bounds: Aabb, tint: Color) {
        self.record(IN_3D, DrawCommand::WireBox { bounds, tint });
    }

    fn draw_wire_sphere(&mut self, center: Vec3, radius: f32, tint: Color) {
        self.record(
            IN_3D,
            DrawCommand::WireSphere {
                center,
                radius,
                tint,
            },
        );
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: u32, tint: Color) {
        self.record(
            IN_FRAME,
            DrawCommand::Text {
                text: text.to_string(),
                x,
                y,
                size,
                tint,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_record_a_frame() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        rec.clear_background(Color::RAYWHITE);
        rec.begin_3d(&Camera::default()).unwrap();
        assert_eq!(rec.scope(), Scope::World3d);
        rec.draw_mesh(AssetId(0), Vec3::ZERO, Color::WHITE);
        rec.end_3d().unwrap();
        rec.draw_text("title", 10, 10, 20, Color::DARKGRAY);
        rec.end_frame().unwrap();

        assert_eq!(rec.scope(), Scope::Idle);
        let frame = rec.take_frame().unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.clear_color(), Some(Color::RAYWHITE));
        assert_eq!(frame.meshes().count(), 1);
        assert_eq!(frame.texts().count(), 1);
        assert_eq!(frame.camera(), Some(&Camera::default()));
        assert!(rec.take_frame().is_none());
    }

    #[test]
    fn begin_3d_outside_frame_is_rejected() {
        let mut rec = FrameRecorder::new();
        let err = rec.begin_3d(&Camera::default()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ScopeMismatch {
                call: "begin_3d",
                expected: Scope::Frame,
                found: Scope::Idle
            }
        ));
    }

    #[test]
    fn end_frame_inside_3d_is_rejected() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        rec.begin_3d(&Camera::default()).unwrap();
        assert!(rec.end_frame().is_err());
        assert_eq!(rec.scope(), Scope::World3d);
    }

    #[test]
    fn nested_begin_frame_is_rejected() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        assert!(rec.begin_frame().is_err());
    }

    #[test]
    fn mesh_outside_3d_fails_the_frame() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        rec.draw_mesh(AssetId(0), Vec3::ZERO, Color::WHITE);
        rec.draw_wire_sphere(Vec3::ZERO, 1.0, Color::RED);
        let err = rec.end_frame().unwrap_err();
        assert!(matches!(err, RenderError::OutOfScopeDraws(2)));
        assert!(rec.last_frame().unwrap().is_empty());

        // The count does not leak into the next frame.
        rec.begin_frame().unwrap();
        rec.end_frame().unwrap();
    }

    #[test]
    fn frame_limit_terminates() {
        let mut rec = FrameRecorder::with_frame_limit(2);
        let mut frames = 0;
        while !rec.should_terminate() {
            rec.begin_frame().unwrap();
            rec.end_frame().unwrap();
            frames += 1;
        }
        assert_eq!(frames, 2);
        assert_eq!(rec.last_frame().unwrap().frame(), 1);
    }

    #[test]
    fn request_terminate_stops_unbounded_recorder() {
        let mut rec = FrameRecorder::new();
        assert!(!rec.should_terminate());
        rec.request_terminate();
        assert!(rec.should_terminate());
    }

    #[test]
    fn wires_keep_call_order() {
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        rec.begin_3d(&Camera::default()).unwrap();
        rec.draw_wire_sphere(Vec3::ZERO, 0.5, Color::PURPLE);
        rec.draw_mesh(AssetId(1), Vec3::ZERO, Color::WHITE);
        rec.draw_wire_box(Aabb::new(Vec3::ZERO, Vec3::ONE), Color::RED);
        rec.end_3d().unwrap();
        rec.end_frame().unwrap();

        let frame = rec.take_frame().unwrap();
        let wires: Vec<_> = frame.wires().collect();
        assert_eq!(wires.len(), 2);
        assert!(matches!(wires[0], DrawCommand::WireSphere { .. }));
        assert!(matches!(wires[1], DrawCommand::WireBox { .. }));
    }
}
