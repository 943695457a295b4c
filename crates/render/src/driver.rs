use crate::RenderError;
use crate::renderer::RenderBackend;
use actorloop_assets::AssetStore;
use actorloop_common::{Camera, Color};
use actorloop_kernel::{DebugPrimitive, FrameReport, SceneConfig, Simulation};

/// Screen position of the title text.
pub const TITLE_POSITION: (i32, i32) = (10, 10);
pub const TITLE_FONT_SIZE: u32 = 20;

/// Totals over a [`FrameDriver::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub contacts: usize,
    pub flips: usize,
}

/// Sequences one simulation frame against a [`RenderBackend`].
#[derive(Debug, Clone)]
pub struct FrameDriver {
    pub title: String,
    pub camera: Camera,
    pub background: Color,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::from_scene(&SceneConfig::default())
    }
}

impl FrameDriver {
    pub fn new(title: impl Into<String>, camera: Camera) -> Self {
        Self {
            title: title.into(),
            camera,
            background: Color::RAYWHITE,
        }
    }

    pub fn from_scene(scene: &SceneConfig) -> Self {
        Self::new(scene.title.clone(), scene.camera)
    }

    /// Run one frame: bounding volumes, collisions, then the drawn traversal
    /// inside a 3D scope, then the title.
    pub fn frame<B: RenderBackend + ?Sized>(
        &self,
        sim: &mut Simulation,
        assets: &AssetStore,
        backend: &mut B,
    ) -> Result<FrameReport, RenderError> {
        sim.update_bounding_volumes(assets)?;
        sim.detect_collisions();

        backend.begin_frame()?;
        backend.clear_background(self.background);
        backend.begin_3d(&self.camera)?;

        for primitive in sim.overlay().iter() {
            match *primitive {
                DebugPrimitive::WireBox { bounds, color } => backend.draw_wire_box(bounds, color),
                DebugPrimitive::WireSphere {
                    center,
                    radius,
                    color,
                } => backend.draw_wire_sphere(center, radius, color),
            }
        }

        let report = sim.advance(|entity| {
            backend.draw_mesh(entity.asset_id(), entity.position(), Color::WHITE);
        });

        backend.end_3d()?;
        let (x, y) = TITLE_POSITION;
        backend.draw_text(&self.title, x, y, TITLE_FONT_SIZE, Color::DARKGRAY);
        backend.end_frame()?;
        Ok(report)
    }

    /// Repeat [`FrameDriver::frame`] until the backend asks to stop. The
    /// termination query runs once per frame boundary; `on_frame` sees each
    /// report and the backend after the frame ends.
    pub fn run<B: RenderBackend + ?Sized>(
        &self,
        sim: &mut Simulation,
        assets: &AssetStore,
        backend: &mut B,
        mut on_frame: impl FnMut(&FrameReport, &mut B),
    ) -> Result<RunSummary, RenderError> {
        let mut summary = RunSummary::default();
        while !backend.should_terminate() {
            let report = self.frame(sim, assets, backend)?;
            summary.frames += 1;
            summary.contacts += report.contacts;
            summary.flips += report.flips;
            on_frame(&report, backend);
        }
        tracing::info!(
            frames = summary.frames,
            contacts = summary.contacts,
            flips = summary.flips,
            "frame loop finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{DrawCommand, FrameRecorder};
    use crate::renderer::Scope;
    use actorloop_assets::BUILTIN_CUBE;
    use actorloop_common::Aabb;
    use actorloop_kernel::{BehaviorKind, Tag};
    use glam::Vec3;

    fn setup(xs: &[f32]) -> (Simulation, AssetStore) {
        let mut assets = AssetStore::new();
        let mut sim = Simulation::new();
        for &x in xs {
            let handle = assets.load(BUILTIN_CUBE).unwrap();
            sim.spawn(&assets, handle, Vec3::new(x, 0.0, 0.0), BehaviorKind::default())
                .unwrap();
        }
        (sim, assets)
    }

    #[test]
    fn frame_issues_calls_in_order() {
        let (mut sim, mut assets) = setup(&[0.0, 2.0, -2.0]);
        let driver = FrameDriver::default();
        let mut rec = FrameRecorder::new();

        let report = driver.frame(&mut sim, &assets, &mut rec).unwrap();
        assert_eq!(report.frame, 1);
        assert_eq!(report.contacts, 0);

        let frame = rec.take_frame().unwrap();
        let cmds = frame.commands();
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0], DrawCommand::Clear(Color::RAYWHITE));
        let drawn: Vec<f32> = frame.meshes().map(|(_, p, _)| p.x).collect();
        // Meshes are drawn at the pre-tick positions.
        assert_eq!(drawn, vec![0.0, 2.0, -2.0]);
        assert!(frame.meshes().all(|(_, _, tint)| tint == Color::WHITE));
        assert_eq!(
            cmds[4],
            DrawCommand::Text {
                text: driver.title.clone(),
                x: 10,
                y: 10,
                size: 20,
                tint: Color::DARKGRAY,
            }
        );
        assert_eq!(frame.camera(), Some(&Camera::default()));
        sim.teardown(&mut assets).unwrap();
    }

    #[test]
    fn overlay_is_drawn_before_meshes() {
        let (mut sim, mut assets) = setup(&[0.0, 0.9]);
        let driver = FrameDriver::default();
        let mut rec = FrameRecorder::new();

        let report = driver.frame(&mut sim, &assets, &mut rec).unwrap();
        assert_eq!(report.debug_primitives, 4);

        let frame = rec.take_frame().unwrap();
        let cmds = frame.commands();
        assert!(matches!(
            cmds[1],
            DrawCommand::WireBox { tint, .. } if tint == Color::RED
        ));
        assert!(matches!(
            cmds[2],
            DrawCommand::WireSphere { tint, radius, .. } if tint == Color::PURPLE && radius == 0.5
        ));
        assert_eq!(frame.wires().count(), 4);
        assert!(matches!(cmds[5], DrawCommand::Mesh { .. }));
        sim.teardown(&mut assets).unwrap();
    }

    #[test]
    fn run_stops_at_frame_limit() {
        let (mut sim, mut assets) = setup(&[0.0, 2.0, -2.0]);
        let driver = FrameDriver::default();
        let mut rec = FrameRecorder::with_frame_limit(3);

        let mut seen = Vec::new();
        let summary = driver
            .run(&mut sim, &assets, &mut rec, |report, rec| {
                seen.push((report.frame, rec.take_frame().map(|f| f.frame())));
            })
            .unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(seen, vec![(1, Some(0)), (2, Some(1)), (3, Some(2))]);
        assert_eq!(sim.frame(), 3);

        let tags: Vec<Tag> = sim.registry().iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec![Tag::Backward, Tag::Backward, Tag::Forward]);
        assert_eq!(sim.teardown(&mut assets).unwrap(), 3);
        assert!(assets.is_empty());
    }

    #[test]
    fn run_with_terminated_backend_draws_nothing() {
        let (mut sim, mut assets) = setup(&[0.0]);
        let mut rec = FrameRecorder::new();
        rec.request_terminate();
        let summary = FrameDriver::default()
            .run(&mut sim, &assets, &mut rec, |_, _| {})
            .unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(sim.frame(), 0);
        assert_eq!(rec.frames_recorded(), 0);
        sim.teardown(&mut assets).unwrap();
    }

    #[test]
    fn misnested_backend_fails_the_frame() {
        let (mut sim, mut assets) = setup(&[0.0]);
        let mut rec = FrameRecorder::new();
        rec.begin_frame().unwrap();
        let err = FrameDriver::default()
            .frame(&mut sim, &assets, &mut rec)
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ScopeMismatch {
                call: "begin_frame",
                found: Scope::Frame,
                ..
            }
        ));
        sim.teardown(&mut assets).unwrap();
    }

    #[test]
    fn driver_takes_scene_title_and_camera() {
        let mut scene = SceneConfig::default();
        scene.title = "patrol".into();
        scene.camera.fovy = 60.0;
        let driver = FrameDriver::from_scene(&scene);
        assert_eq!(driver.title, "patrol");
        assert_eq!(driver.camera.fovy, 60.0);
        assert_eq!(driver.background, Color::RAYWHITE);
    }

    #[test]
    fn stationary_entities_stay_put_across_frames() {
        let mut assets = AssetStore::new();
        let mut sim = Simulation::new();
        let handle = assets.load(BUILTIN_CUBE).unwrap();
        sim.spawn(&assets, handle, Vec3::new(1.0, 0.0, 0.0), BehaviorKind::Stationary)
            .unwrap();
        let mut rec = FrameRecorder::with_frame_limit(10);
        FrameDriver::default()
            .run(&mut sim, &assets, &mut rec, |_, _| {})
            .unwrap();
        let e = sim.registry().head().unwrap();
        assert_eq!(e.position(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(
            e.bounds(),
            Aabb::new(Vec3::new(0.5, -0.5, -0.5), Vec3::new(1.5, 0.5, 0.5))
        );
        sim.teardown(&mut assets).unwrap();
    }

    #[test]
    fn long_runs_keep_the_event_log_bounded() {
        let mut assets = AssetStore::new();
        let mut sim = Simulation::with_event_capacity(256);
        for x in [0.0, 2.0, -2.0] {
            let handle = assets.load(BUILTIN_CUBE).unwrap();
            sim.spawn(&assets, handle, Vec3::new(x, 0.0, 0.0), BehaviorKind::default())
                .unwrap();
        }
        let mut rec = FrameRecorder::with_frame_limit(5_000);
        FrameDriver::default()
            .run(&mut sim, &assets, &mut rec, |_, rec| {
                rec.take_frame();
            })
            .unwrap();
        assert_eq!(sim.frame(), 5_000);
        assert_eq!(sim.events().len(), 256);
        sim.teardown(&mut assets).unwrap();
    }
}
