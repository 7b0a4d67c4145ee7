use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel as xchan;
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, Touch, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::animation::{CubicBezier, Tween};
use crate::config::Configuration;
use crate::events::{CarouselInput, LoadSlide, LoaderEvent, NavKey, PreparedImageCpu};
use crate::gesture::FrameTouches;
use crate::home::{Home, MountedCarousel};
use crate::keyboard::KeyboardHub;
use crate::layout::{Hit, PageLayout};
use crate::render::loader::{LoaderMsg, decode_width, slides_to_request, spawn_loader};
use crate::render::title::TitleRenderer;
use crate::scene::{QuadInstance, SceneInput, build_scene};
use crate::slide::loads_with_priority;

const SHADER: &str = include_str!("shaders/quad.wgsl");

// Poll interval for loader results while requests are in flight.
const LOADER_POLL: Duration = Duration::from_millis(16);

/// Open the carousel window and run until it is closed.
///
/// # Errors
/// Returns an error if the event loop or the rendering backend fails.
pub fn run_windowed(home: Home, cfg: Configuration) -> Result<()> {
    info!(slides = home.slides().len(), "starting carousel viewer");
    let event_loop = EventLoop::new().context("failed to build viewer event loop")?;
    let mut app = App::new(home, cfg)?;
    let run_result = event_loop.run_app(&mut app);
    app.shutdown();
    run_result.context("viewer event loop failed")
}

struct Tex {
    bind: wgpu::BindGroup,
    w: u32,
    h: u32,
}

enum SlideState {
    Pending,
    Requested,
    Ready(Tex),
    Failed,
}

impl SlideState {
    fn size(&self) -> Option<(u32, u32)> {
        match self {
            Self::Ready(tex) => Some((tex.w, tex.h)),
            _ => None,
        }
    }
}

struct Loader {
    to_loader: xchan::Sender<LoaderMsg>,
    from_loader: xchan::Receiver<LoaderEvent>,
    handle: JoinHandle<()>,
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    tex_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    viewport_buf: wgpu::Buffer,
    viewport_bind: wgpu::BindGroup,
    // 1x1 white texture bound for untextured quads
    blank_bind: wgpu::BindGroup,
    instance_buf: wgpu::Buffer,
    instance_cap: usize,
    title: Option<TitleRenderer>,
}

struct App {
    cfg: Configuration,
    hub: KeyboardHub,
    mounted: Option<MountedCarousel>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    loader: Option<Loader>,
    layout: Option<PageLayout>,
    slides: Vec<SlideState>,
    offset: Tween,
    controls: Tween,
    cursor: Option<PhysicalPosition<f64>>,
    touches: FrameTouches,
    pending_redraw: bool,
}

impl App {
    fn new(home: Home, cfg: Configuration) -> Result<Self> {
        let hub = KeyboardHub::new();
        let mounted = home.mount(&hub).context("failed to mount carousel")?;
        let now = Instant::now();
        let slides = home.slides().iter().map(|_| SlideState::Pending).collect();
        let offset = Tween::settled(0.0, cfg.transition, CubicBezier::EASE_IN_OUT, now);
        let controls = Tween::settled(0.0, cfg.controls_fade, CubicBezier::EASE_IN_OUT, now);
        Ok(Self {
            cfg,
            hub,
            mounted: Some(mounted),
            window: None,
            gpu: None,
            loader: None,
            layout: None,
            slides,
            offset,
            controls,
            cursor: None,
            touches: FrameTouches::new(),
            pending_redraw: true,
        })
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let title = self
            .mounted
            .as_ref()
            .map(|m| m.accessible_title())
            .unwrap_or_default();
        let mut attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(LogicalSize::new(
                self.cfg.window.width,
                self.cfg.window.height,
            ));
        if self.cfg.window.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create carousel window");
                None
            }
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to acquire GPU adapter")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|fmt| fmt.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("carousel-device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            ..Default::default()
        }))
        .context("failed to acquire GPU device")?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "carousel surface configured",
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("viewport-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let viewport_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("viewport-uniform"),
            contents: bytemuck::cast_slice(&viewport_uniform(&config)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let viewport_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("viewport-bind"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buf.as_entire_binding(),
            }],
        });

        let tex_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("slide-tex-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("slide-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad-pipeline-layout"),
            bind_group_layouts: &[&viewport_layout, &tex_layout],
            immediate_size: 0,
        });
        const ATTRS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
            0 => Float32x4,
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
        ];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &ATTRS,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let blank = PreparedImageCpu {
            path: Default::default(),
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        let blank_bind = upload_rgba(&device, &queue, &tex_layout, &sampler, &blank).bind;

        let instance_cap = 64;
        let instance_buf = create_instance_buffer(&device, instance_cap);

        let max_dim = self
            .cfg
            .max_texture_dim
            .min(device.limits().max_texture_dimension_2d);
        if max_dim < self.cfg.max_texture_dim {
            warn!(
                configured = self.cfg.max_texture_dim,
                device = max_dim,
                "max-texture-dim exceeds device limit; clamping"
            );
        }
        let (to_loader, loader_rx) = xchan::unbounded();
        let (loader_tx, from_loader) = xchan::unbounded();
        let handle = spawn_loader(loader_rx, loader_tx, max_dim);
        self.loader = Some(Loader {
            to_loader,
            from_loader,
            handle,
        });

        let title = self.mounted.as_ref().and_then(|m| {
            let carousel = m.carousel();
            carousel.title().map(|text| {
                TitleRenderer::new(&device, &queue, format, text, self.cfg.font.as_deref())
            })
        });
        let layout = PageLayout::compute_titled(
            config.width,
            config.height,
            window.scale_factor(),
            self.slides.len(),
            title.is_some(),
        );
        self.layout = Some(layout);
        self.gpu = Some(Gpu {
            surface,
            device,
            queue,
            config,
            pipeline,
            tex_layout,
            sampler,
            viewport_buf,
            viewport_bind,
            blank_bind,
            instance_buf,
            instance_cap,
            title,
        });
        self.sync_title();
        self.request_loads();
        Ok(())
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.config.width = new_size.width.max(1);
            gpu.config.height = new_size.height.max(1);
            gpu.surface.configure(&gpu.device, &gpu.config);
            gpu.queue.write_buffer(
                &gpu.viewport_buf,
                0,
                bytemuck::cast_slice(&viewport_uniform(&gpu.config)),
            );
            debug!(
                width = gpu.config.width,
                height = gpu.config.height,
                "carousel surface resized"
            );
        }
        let titled = self.gpu.as_ref().is_some_and(|gpu| gpu.title.is_some());
        self.layout = Some(PageLayout::compute_titled(
            new_size.width,
            new_size.height,
            window.scale_factor(),
            self.slides.len(),
            titled,
        ));
        self.sync_title();
        self.update_hover(Instant::now());
        window.request_redraw();
    }

    /// Lay the heading out again after the page layout changed.
    fn sync_title(&mut self) {
        let (Some(gpu), Some(layout)) = (self.gpu.as_mut(), self.layout.as_ref()) else {
            return;
        };
        if let (Some(title), Some(heading)) = (gpu.title.as_mut(), layout.heading) {
            title.set_layout(heading, layout.scale, gpu.config.width, gpu.config.height);
        }
    }

    fn scale(&self) -> f32 {
        self.layout.as_ref().map_or(1.0, |l| l.scale)
    }

    /// Ask the loader for whatever is on screen or one step away.
    fn request_loads(&mut self) {
        let (Some(loader), Some(layout), Some(mounted), Some(gpu)) = (
            self.loader.as_ref(),
            self.layout.as_ref(),
            self.mounted.as_ref(),
            self.gpu.as_ref(),
        ) else {
            return;
        };
        let count = self.slides.len();
        let now = Instant::now();
        let visible = layout.visible_slides(self.offset.value_at(now), count);
        let requested: Vec<bool> = self
            .slides
            .iter()
            .map(|s| !matches!(s, SlideState::Pending))
            .collect();
        let current = mounted.carousel().current_index();
        let target_width = decode_width(
            &self.cfg.sizes,
            gpu.config.width,
            f64::from(layout.scale),
            layout.frame.w,
        );
        for index in slides_to_request(&visible, current, count, &requested) {
            let path = match mounted.carousel().slides()[index].local_path() {
                Ok(path) => path,
                Err(err) => {
                    warn!(index, error = %err, "slide cannot be loaded");
                    self.slides[index] = SlideState::Failed;
                    continue;
                }
            };
            let job = LoadSlide {
                index,
                path,
                target_width,
                priority: loads_with_priority(index),
            };
            debug!(index, target_width, priority = job.priority, "requesting slide");
            if let Err(err) = loader.to_loader.send(LoaderMsg::Load(job)) {
                error!(error = %err, "loader thread is gone");
                return;
            }
            self.slides[index] = SlideState::Requested;
        }
    }

    fn drain_loader(&mut self) -> bool {
        let (Some(loader), Some(gpu)) = (self.loader.as_ref(), self.gpu.as_ref()) else {
            return false;
        };
        let mut changed = false;
        while let Ok(event) = loader.from_loader.try_recv() {
            match event {
                LoaderEvent::Loaded(loaded) => {
                    let tex = upload_rgba(
                        &gpu.device,
                        &gpu.queue,
                        &gpu.tex_layout,
                        &gpu.sampler,
                        &loaded.prepared,
                    );
                    if let Some(slot) = self.slides.get_mut(loaded.index) {
                        *slot = SlideState::Ready(tex);
                        changed = true;
                    }
                }
                LoaderEvent::Invalid(invalid) => {
                    if let Some(slot) = self.slides.get_mut(invalid.index) {
                        *slot = SlideState::Failed;
                    }
                }
            }
        }
        changed
    }

    fn apply_changes(&mut self) {
        let Some(mounted) = self.mounted.as_ref() else {
            return;
        };
        let changes = mounted.take_changes();
        if changes.is_empty() {
            return;
        }
        let now = Instant::now();
        for change in &changes {
            info!(from = change.from, to = change.to, "slide changed");
            self.offset.retarget(change.to as f32, now);
        }
        if let Some(window) = self.window.as_ref() {
            window.set_title(&mounted.accessible_title());
            window.request_redraw();
        }
        self.request_loads();
    }

    fn send(&mut self, input: CarouselInput) {
        if let Some(mounted) = self.mounted.as_ref() {
            mounted.handle(input);
        }
        self.apply_changes();
    }

    fn click(&mut self, x: f32, y: f32) {
        let Some(hit) = self.layout.as_ref().and_then(|l| l.hit_test(x, y)) else {
            return;
        };
        if let Some(label) = hit.aria_label() {
            debug!(control = %label, "control activated");
        }
        let input = match hit {
            Hit::Prev => CarouselInput::PrevClicked,
            Hit::Next => CarouselInput::NextClicked,
            Hit::Indicator(i) => CarouselInput::IndicatorClicked(i),
            Hit::Frame => return,
        };
        self.send(input);
    }

    fn update_hover(&mut self, now: Instant) {
        let hovering = match (self.cursor, self.layout.as_ref()) {
            (Some(pos), Some(layout)) => layout.in_frame(pos.x as f32, pos.y as f32),
            _ => false,
        };
        let target = if hovering { 1.0 } else { 0.0 };
        if self.controls.target() != target {
            self.controls.retarget(target, now);
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
    }

    fn on_touch(&mut self, touch: Touch) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        let routed = self.touches.route(
            layout,
            touch.phase,
            touch.id,
            touch.location.x as f32,
            touch.location.y as f32,
            Instant::now(),
        );
        let mut changed = false;
        if let Some(mounted) = self.mounted.as_ref() {
            for input in routed.inputs {
                changed |= mounted.handle(input).is_some();
            }
        }
        self.apply_changes();
        // a tap on a control activates it unless the release already navigated
        if let Some((x, y)) = routed.tap.filter(|_| !changed) {
            self.click(x, y);
        }
    }

    fn drop_touches(&mut self) {
        if let Some(input) = self.touches.reset() {
            debug!("window lost focus; cancelling touch");
            self.send(input);
        }
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        self.request_loads();
        let (Some(gpu), Some(layout), Some(mounted), Some(window)) = (
            self.gpu.as_mut(),
            self.layout.as_ref(),
            self.mounted.as_ref(),
            self.window.as_ref(),
        ) else {
            return;
        };

        let now = Instant::now();
        // keep drawing until the frame at the tween end is on screen
        let still_animating = self.offset.is_running(now) || self.controls.is_running(now);
        let sizes: Vec<Option<(u32, u32)>> = self.slides.iter().map(SlideState::size).collect();
        let cmds = build_scene(&SceneInput {
            layout,
            offset: self.offset.value_at(now),
            current: mounted.carousel().current_index(),
            controls_opacity: self.controls.value_at(now),
            slide_sizes: &sizes,
            fit: self.cfg.fit,
        });

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Outdated) | Err(SurfaceError::Lost) => {
                info!("carousel surface lost; reconfiguring");
                let size = window.inner_size();
                self.handle_resize(size);
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("carousel surface out of memory; exiting event loop");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("carousel surface acquisition timed out");
                return;
            }
            Err(SurfaceError::Other) => {
                warn!("carousel surface reported an unknown error; retrying");
                let size = window.inner_size();
                self.handle_resize(size);
                return;
            }
        };

        if let Some(title) = gpu.title.as_mut() {
            title.prepare(&gpu.device, &gpu.queue);
        }

        let instances: Vec<QuadInstance> = cmds.iter().map(|c| c.instance).collect();
        if instances.len() > gpu.instance_cap {
            gpu.instance_cap = instances.len().next_power_of_two();
            gpu.instance_buf = create_instance_buffer(&gpu.device, gpu.instance_cap);
        }
        gpu.queue
            .write_buffer(&gpu.instance_buf, 0, bytemuck::cast_slice(&instances));

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("carousel-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("carousel-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&gpu.pipeline);
            pass.set_bind_group(0, &gpu.viewport_bind, &[]);
            pass.set_vertex_buffer(0, gpu.instance_buf.slice(..));
            for (i, cmd) in cmds.iter().enumerate() {
                let bind = match cmd.texture.and_then(|k| self.slides.get(k)) {
                    Some(SlideState::Ready(tex)) => &tex.bind,
                    _ => &gpu.blank_bind,
                };
                pass.set_bind_group(1, bind, &[]);
                let i = i as u32;
                pass.draw(0..6, i..i + 1);
            }
            if let Some(title) = gpu.title.as_ref() {
                title.render(&mut pass);
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        if let Some(title) = gpu.title.as_mut() {
            title.trim();
        }
        window.pre_present_notify();
        frame.present();
        self.pending_redraw = still_animating;
    }

    fn animating(&self, now: Instant) -> bool {
        self.offset.is_running(now) || self.controls.is_running(now)
    }

    fn loads_in_flight(&self) -> bool {
        self.slides
            .iter()
            .any(|s| matches!(s, SlideState::Requested))
    }

    fn shutdown(&mut self) {
        // unmount first so the key listener is gone before the hub
        self.mounted = None;
        if let Some(loader) = self.loader.take() {
            let _ = loader.to_loader.send(LoaderMsg::Quit);
            if loader.handle.join().is_err() {
                warn!("loader thread panicked");
            }
        }
        debug!(listeners = self.hub.listener_count(), "carousel viewer shut down");
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.gpu.is_none() {
            if let Err(err) = self.init_gpu(window.clone()) {
                error!(error = ?err, "failed to initialize GPU state");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("carousel window close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    info!("escape pressed; closing");
                    event_loop.exit();
                    return;
                }
                let key = NavKey::from(&event.logical_key);
                if key != NavKey::Other {
                    self.hub.dispatch(key);
                    self.apply_changes();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
                self.update_hover(Instant::now());
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.update_hover(Instant::now());
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(pos) = self.cursor {
                    self.click(pos.x as f32, pos.y as f32);
                }
            }
            WindowEvent::Touch(touch) => self.on_touch(touch),
            WindowEvent::Focused(false) => self.drop_touches(),
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let loaded = self.drain_loader();
        let now = Instant::now();
        if loaded || self.pending_redraw || self.animating(now) {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
        if self.loads_in_flight() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(now + LOADER_POLL));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

fn viewport_uniform(config: &wgpu::SurfaceConfiguration) -> [f32; 4] {
    [config.width as f32, config.height as f32, 0.0, 0.0]
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("quad-instances"),
        size: (capacity * std::mem::size_of::<QuadInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    img: &PreparedImageCpu,
) -> Tex {
    let (w, h) = (img.width.max(1), img.height.max(1));
    let size = wgpu::Extent3d {
        width: w,
        height: h,
        depth_or_array_layers: 1,
    };
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("slide-texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        &img.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        size,
    );
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("slide-bind"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    Tex { bind, w, h }
}
