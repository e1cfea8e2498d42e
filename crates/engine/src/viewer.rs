use std::path::PathBuf;
use std::time::Duration;

use orbitview_assets::{AssetLoader, GltfSource, LoadCompletion, LoadHandle, LoadOutcome, ModelSource};
use orbitview_common::Transform;
use orbitview_input::ControlAction;
use orbitview_render::{OrbitControls, PerspectiveCamera, Renderer};
use orbitview_scene::{NodeId, SceneGraph};

use crate::config::ViewerConfig;
use crate::setup::{assemble_scene, place_model};
use crate::{EngineError, Viewport};

/// Where the configured model is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    NotRequested,
    Loading(PathBuf),
    Loaded { node: NodeId },
    Failed(String),
}

impl ModelStatus {
    pub fn label(&self) -> String {
        match self {
            ModelStatus::NotRequested => "not requested".into(),
            ModelStatus::Loading(path) => format!("loading {}", path.display()),
            ModelStatus::Loaded { node } => format!("loaded (node {})", node.0),
            ModelStatus::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

/// What one `tick` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// 1-based index of the frame just rendered.
    pub frame: u64,
    pub elapsed: f64,
    /// Seconds since the previous tick; 0 on the first.
    pub delta: f64,
    pub camera_moved: bool,
}

/// The viewer context. Owns everything a frame touches.
///
/// Hosts drive it with [`Viewer::on_resize`] and [`Viewer::tick`]; pointer
/// input arrives through [`Viewer::handle_action`].
#[derive(Debug)]
pub struct Viewer<R, S = GltfSource> {
    config: ViewerConfig,
    viewport: Viewport,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    scene: SceneGraph,
    camera_node: NodeId,
    renderer: R,
    loader: AssetLoader<S>,
    model_request: Option<LoadHandle>,
    model_status: ModelStatus,
    last_elapsed: Option<f64>,
    frame: u64,
}

impl<R: Renderer> Viewer<R, GltfSource> {
    pub fn new(config: ViewerConfig, renderer: R, viewport: Viewport) -> Self {
        Self::with_loader(config, renderer, viewport, AssetLoader::new())
    }
}

impl<R: Renderer, S: ModelSource> Viewer<R, S> {
    pub fn with_loader(
        config: ViewerConfig,
        renderer: R,
        viewport: Viewport,
        loader: AssetLoader<S>,
    ) -> Self {
        let cam = &config.camera;
        let camera = PerspectiveCamera::new(cam.fov_degrees, viewport.aspect(), cam.near, cam.far)
            .with_position(cam.position);

        let mut controls = OrbitControls::new();
        controls.enable_damping = config.controls.enable_damping;
        controls.damping_factor = config.controls.damping_factor;
        controls.rotate_speed = config.controls.rotate_speed;
        controls.zoom_speed = config.controls.zoom_speed;
        controls.pan_speed = config.controls.pan_speed;

        let assembled = assemble_scene(&config);

        let mut viewer = Self {
            config,
            viewport,
            camera,
            controls,
            scene: assembled.scene,
            camera_node: assembled.camera_node,
            renderer,
            loader,
            model_request: None,
            model_status: ModelStatus::NotRequested,
            last_elapsed: None,
            frame: 0,
        };
        viewer.apply_viewport();
        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            variant = %viewer.config.variant,
            "viewer created"
        );
        viewer
    }

    /// Start loading the configured model. Only the first call requests.
    pub fn request_model(&mut self) -> LoadHandle {
        if let Some(handle) = self.model_request {
            return handle;
        }
        let path = self.config.model_path.clone();
        let handle = self.loader.request_load(path.clone());
        self.model_request = Some(handle);
        self.model_status = ModelStatus::Loading(path);
        handle
    }

    /// Host resize. Zero dimensions (minimized windows) are ignored.
    pub fn on_resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-size resize");
            return;
        }
        self.viewport = Viewport::new(width, height, device_pixel_ratio);
        self.apply_viewport();
    }

    fn apply_viewport(&mut self) {
        self.camera.set_aspect(self.viewport.aspect());
        self.renderer.set_size(self.viewport.width, self.viewport.height);
        self.renderer.set_pixel_ratio(self.viewport.pixel_ratio());
    }

    pub fn handle_action(&mut self, action: ControlAction) {
        if action.is_noop() {
            return;
        }
        self.controls
            .apply(action, self.viewport.height as f32, &self.camera);
    }

    /// Run one frame: integrate finished loads, update the controls, then
    /// render exactly once.
    pub fn tick(&mut self, elapsed: f64) -> Result<FrameStats, EngineError> {
        let delta = self
            .last_elapsed
            .map_or(0.0, |last| (elapsed - last).max(0.0));
        self.last_elapsed = Some(elapsed);

        for completion in self.loader.poll() {
            self.integrate(completion);
        }

        let camera_moved = self.controls.update(&mut self.camera);
        self.scene
            .set_transform(self.camera_node, Transform::from_position(self.camera.position))?;

        self.renderer.render(&self.scene, &self.camera)?;
        self.frame += 1;

        Ok(FrameStats {
            frame: self.frame,
            elapsed,
            delta,
            camera_moved,
        })
    }

    /// Block until the pending model load resolves or `timeout` passes,
    /// then attach it. For headless hosts that want a deterministic scene.
    pub fn await_model(&mut self, timeout: Duration) -> &ModelStatus {
        if matches!(self.model_status, ModelStatus::Loading(_)) {
            if let Some(completion) = self.loader.wait_timeout(timeout) {
                self.integrate(completion);
            }
        }
        &self.model_status
    }

    fn integrate(&mut self, completion: LoadCompletion) {
        if self.model_request != Some(completion.handle) {
            tracing::debug!(handle = ?completion.handle, "ignoring unrelated load completion");
            return;
        }
        match completion.outcome {
            LoadOutcome::Success(part) => {
                if let ModelStatus::Loaded { node } = self.model_status {
                    tracing::warn!(?node, "model already attached, dropping duplicate");
                    return;
                }
                let node = self.scene.add(place_model(part, &self.config));
                tracing::info!(?node, path = %completion.path.display(), "model attached");
                self.model_status = ModelStatus::Loaded { node };
            }
            LoadOutcome::Failure(e) => {
                tracing::warn!(path = %completion.path.display(), "model load failed: {e}");
                self.model_status = ModelStatus::Failed(e.to_string());
            }
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera_node(&self) -> NodeId {
        self.camera_node
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn loader(&self) -> &AssetLoader<S> {
        &self.loader
    }

    pub fn model_status(&self) -> &ModelStatus {
        &self.model_status
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneVariant;
    use glam::Vec3;
    use orbitview_assets::{AssetError, DeferredSource};
    use orbitview_render::{DebugTextRenderer, RenderError};
    use orbitview_scene::{Geometry, Material, MeshNode, ModelPart, NodeKind, NodeKindTag};

    /// Records what the camera looked like at each render call.
    #[derive(Debug, Default)]
    struct RecordingRenderer {
        size: (u32, u32),
        ratio: f64,
        renders: Vec<Vec3>,
        fail_next: bool,
    }

    impl Renderer for RecordingRenderer {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn set_pixel_ratio(&mut self, ratio: f64) {
            self.ratio = orbitview_render::clamp_pixel_ratio(ratio);
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn pixel_ratio(&self) -> f64 {
            self.ratio
        }

        fn render(&mut self, _scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(RenderError::SurfaceTimeout);
            }
            self.renders.push(camera.position);
            Ok(())
        }
    }

    fn deferred_viewer(
        variant: SceneVariant,
    ) -> (Viewer<DebugTextRenderer, DeferredSource>, DeferredSource) {
        let source = DeferredSource::new();
        let config = ViewerConfig {
            variant,
            ..ViewerConfig::default()
        };
        let viewer = Viewer::with_loader(
            config,
            DebugTextRenderer::new(),
            Viewport::new(1920, 1080, 1.0),
            AssetLoader::with_source(source.clone()),
        );
        (viewer, source)
    }

    fn model() -> ModelPart {
        let mesh = MeshNode::new(Geometry::plane(1.0, 1.0), Material::default());
        ModelPart {
            name: Some("face".into()),
            meshes: vec![mesh.clone()],
            children: vec![ModelPart {
                meshes: vec![mesh],
                ..ModelPart::default()
            }],
            ..ModelPart::default()
        }
    }

    #[test]
    fn construction_applies_viewport() {
        let (viewer, _) = deferred_viewer(SceneVariant::Directional);
        assert_eq!(viewer.camera().aspect(), 1920.0 / 1080.0);
        assert_eq!(viewer.renderer().size(), (1920, 1080));
        assert_eq!(viewer.camera().position, Vec3::new(1.0, 1.5, 1.0));
        assert_eq!(viewer.camera().fov_degrees(), 75.0);
        assert!(viewer.controls().enable_damping);
        assert_eq!(viewer.controls().damping_factor, 0.05);
    }

    #[test]
    fn resize_1920x1080_to_800x600() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        viewer.on_resize(800, 600, 1.0);
        assert_eq!(viewer.camera().aspect(), 800.0 / 600.0);
        assert!((viewer.camera().aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(viewer.renderer().size(), (800, 600));
    }

    #[test]
    fn resize_is_idempotent() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        viewer.on_resize(1024, 768, 1.5);
        let first = (
            viewer.camera().projection_matrix(),
            viewer.renderer().size(),
            viewer.renderer().pixel_ratio(),
        );
        viewer.on_resize(1024, 768, 1.5);
        let second = (
            viewer.camera().projection_matrix(),
            viewer.renderer().size(),
            viewer.renderer().pixel_ratio(),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn aspect_tracks_every_positive_resize() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        for (w, h) in [(1, 1), (640, 480), (3840, 2160), (300, 900), (1, 4000)] {
            viewer.on_resize(w, h, 1.0);
            assert_eq!(viewer.camera().aspect(), w as f32 / h as f32);
            assert_eq!(viewer.renderer().size(), (w, h));
        }
    }

    #[test]
    fn pixel_ratio_never_exceeds_two() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        for dpr in [0.5, 1.0, 2.0, 2.5, 3.0, 4.0] {
            viewer.on_resize(800, 600, dpr);
            assert!(viewer.renderer().pixel_ratio() <= 2.0);
            assert_eq!(viewer.renderer().pixel_ratio(), dpr.min(2.0));
        }
    }

    #[test]
    fn zero_size_resize_is_ignored() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        viewer.on_resize(800, 600, 1.0);
        viewer.on_resize(0, 0, 1.0);
        viewer.on_resize(0, 600, 1.0);
        assert_eq!(viewer.renderer().size(), (800, 600));
        assert_eq!(viewer.viewport().width, 800);
        assert!(viewer.camera().aspect().is_finite());
    }

    #[test]
    fn one_render_per_tick_after_controls_update() {
        let mut viewer = Viewer::with_loader(
            ViewerConfig::default(),
            RecordingRenderer::default(),
            Viewport::new(800, 600, 1.0),
            AssetLoader::with_source(DeferredSource::new()),
        );
        viewer.handle_action(ControlAction::Rotate { dx: 120.0, dy: 0.0 });

        for n in 1..=10u64 {
            let before = viewer.camera().position;
            let stats = viewer.tick(n as f64 / 60.0).unwrap();
            assert_eq!(stats.frame, n);
            assert_eq!(viewer.renderer().renders.len() as u64, n);
            // The frame shows the camera after this tick's update.
            let rendered = *viewer.renderer().renders.last().unwrap();
            assert_eq!(rendered, viewer.camera().position);
            assert!(stats.camera_moved);
            assert_ne!(rendered, before);
        }
    }

    #[test]
    fn camera_anchor_follows_camera() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        viewer.handle_action(ControlAction::Dolly { steps: 3.0 });
        viewer.tick(0.0).unwrap();
        let anchor = viewer.scene().get(viewer.camera_node()).unwrap();
        assert_eq!(anchor.transform.position, viewer.camera().position);
    }

    #[test]
    fn delta_is_measured_between_ticks() {
        let (mut viewer, _) = deferred_viewer(SceneVariant::Directional);
        assert_eq!(viewer.tick(1.0).unwrap().delta, 0.0);
        let stats = viewer.tick(1.25).unwrap();
        assert!((stats.delta - 0.25).abs() < 1e-12);
        assert_eq!(stats.elapsed, 1.25);
    }

    #[test]
    fn render_error_propagates() {
        let mut viewer = Viewer::with_loader(
            ViewerConfig::default(),
            RecordingRenderer {
                fail_next: true,
                ..RecordingRenderer::default()
            },
            Viewport::new(800, 600, 1.0),
            AssetLoader::with_source(DeferredSource::new()),
        );
        assert!(matches!(
            viewer.tick(0.0),
            Err(EngineError::Render(RenderError::SurfaceTimeout))
        ));
        assert_eq!(viewer.frame(), 0);
        assert!(viewer.tick(0.1).is_ok());
    }

    #[test]
    fn never_completing_load_leaves_static_scene() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        viewer.request_model();
        for n in 0..100 {
            viewer.tick(n as f64).unwrap();
        }
        assert_eq!(source.pending(), 1);
        let scene = viewer.scene();
        assert_eq!(scene.node_count(), 3);
        assert_eq!(scene.count_of(NodeKindTag::Mesh), 1);
        assert_eq!(scene.count_of(NodeKindTag::Light), 1);
        assert_eq!(scene.count_of(NodeKindTag::Camera), 1);
        assert!(!scene.has_model());
        assert!(matches!(viewer.model_status(), ModelStatus::Loading(_)));
    }

    #[test]
    fn request_model_is_idempotent() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        let a = viewer.request_model();
        let b = viewer.request_model();
        assert_eq!(a, b);
        assert_eq!(source.pending(), 1);
    }

    #[test]
    fn loaded_model_is_placed_once() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        viewer.request_model();
        for reply in source.take_pending() {
            reply.complete(LoadOutcome::Success(model()));
        }
        viewer.tick(0.0).unwrap();
        viewer.tick(0.1).unwrap();

        let ModelStatus::Loaded { node } = viewer.model_status().clone() else {
            panic!("model not loaded: {:?}", viewer.model_status());
        };
        assert_eq!(viewer.scene().count_of(NodeKindTag::Model), 1);
        assert_eq!(viewer.scene().node_count(), 4);

        let model = viewer.scene().get(node).unwrap();
        let (axis, angle) = model.transform.rotation.to_axis_angle();
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((axis - Vec3::Z).length() < 1e-5);
        assert_eq!(model.transform.scale, Vec3::splat(2.0));
        assert!(viewer.renderer().last_frame().contains("model meshes=2"));
    }

    #[test]
    fn shadow_flags_set_only_in_shadow_variant() {
        for (variant, expected) in [
            (SceneVariant::Directional, false),
            (SceneVariant::ShadowedPoint, true),
        ] {
            let (mut viewer, source) = deferred_viewer(variant);
            viewer.request_model();
            for reply in source.take_pending() {
                reply.complete(LoadOutcome::Success(model()));
            }
            viewer.tick(0.0).unwrap();

            let (_, node) = viewer.scene().model().unwrap();
            let NodeKind::Model(part) = &node.kind else {
                panic!("not a model node");
            };
            part.for_each_mesh(&mut |mesh| {
                assert_eq!(mesh.cast_shadow, expected);
                assert_eq!(mesh.receive_shadow, expected);
            });
        }
    }

    #[test]
    fn failed_load_keeps_scene_and_reports() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        viewer.request_model();
        for reply in source.take_pending() {
            reply.complete(LoadOutcome::Failure(AssetError::NoScene));
        }
        viewer.tick(0.0).unwrap();
        assert!(matches!(viewer.model_status(), ModelStatus::Failed(_)));
        assert!(viewer.model_status().label().starts_with("failed"));
        assert_eq!(viewer.scene().node_count(), 3);
    }

    #[test]
    fn dropped_reply_reports_abandoned() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        viewer.request_model();
        drop(source.take_pending());
        viewer.tick(0.0).unwrap();
        let ModelStatus::Failed(reason) = viewer.model_status() else {
            panic!("expected failure");
        };
        assert!(reason.contains("abandoned"));
    }

    #[test]
    fn await_model_blocks_until_completion() {
        let (mut viewer, source) = deferred_viewer(SceneVariant::Directional);
        viewer.request_model();
        for reply in source.take_pending() {
            reply.complete(LoadOutcome::Success(model()));
        }
        let status = viewer.await_model(Duration::from_secs(1));
        assert!(matches!(status, ModelStatus::Loaded { .. }));
        assert!(viewer.scene().has_model());
    }

    #[test]
    fn missing_file_fails_through_real_loader() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig {
            model_path: dir.path().join("missing.gltf"),
            ..ViewerConfig::default()
        };
        let mut viewer = Viewer::new(config, DebugTextRenderer::new(), Viewport::new(640, 480, 1.0));
        viewer.request_model();
        let status = viewer.await_model(Duration::from_secs(10));
        assert!(matches!(status, ModelStatus::Failed(_)));
        viewer.tick(0.0).unwrap();
        assert!(!viewer.scene().has_model());
    }
}
