//! Heading drawn above the carousel frame.

use fontdb::{Database, Family, Query};
use glyphon::cosmic_text::{Align, Weight};
use glyphon::{
    Attrs, Buffer, Cache, Color, FamilyOwned, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer, Viewport, Wrap,
};
use palette::Srgba;
use tracing::{debug, warn};

use crate::layout::{Rect, TITLE_FONT_SIZE, TITLE_LINE_HEIGHT};

const FALLBACK_FONT: &str = "DejaVu Sans";

/// Centered bold title text, rendered with `glyphon` into the carousel pass.
pub struct TitleRenderer {
    viewport: Viewport,
    atlas: TextAtlas,
    text_renderer: TextRenderer,
    buffer: Buffer,
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: FamilyOwned,
    title: String,
    heading: Rect,
    surface: (u32, u32),
}

impl TitleRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        title: &str,
        font: Option<&str>,
    ) -> Self {
        let mut font_system = FontSystem::new();
        let family = resolve_font_family(font_system.db(), font);
        let metrics = heading_metrics(1.0);
        let mut buffer = Buffer::new(&mut font_system, metrics);
        buffer.set_wrap(&mut font_system, Wrap::None);

        let cache = Cache::new(device);
        let viewport = Viewport::new(device, &cache);
        let mut atlas = TextAtlas::new(device, queue, &cache, format);
        let text_renderer =
            TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);

        Self {
            viewport,
            atlas,
            text_renderer,
            buffer,
            font_system,
            swash_cache: SwashCache::new(),
            family,
            title: title.to_owned(),
            heading: Rect::default(),
            surface: (0, 0),
        }
    }

    /// Reshape the title for a new heading rect and surface size.
    pub fn set_layout(&mut self, heading: Rect, scale: f32, width: u32, height: u32) {
        self.heading = heading;
        self.surface = (width, height);
        self.buffer.set_metrics_and_size(
            &mut self.font_system,
            heading_metrics(scale),
            Some(heading.w),
            Some(heading.h),
        );
        let attrs = Attrs::new()
            .family(self.family.as_family())
            .weight(Weight::BOLD);
        self.buffer
            .set_text(&mut self.font_system, &self.title, &attrs, Shaping::Advanced, None);
        for line in &mut self.buffer.lines {
            line.set_align(Some(Align::Center));
        }
        self.buffer.shape_until_scroll(&mut self.font_system, false);
        debug!(x = heading.x, y = heading.y, w = heading.w, "title laid out");
    }

    /// Upload glyphs for the next frame. Call before the render pass begins.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let (width, height) = self.surface;
        if width == 0 || height == 0 {
            return;
        }
        self.viewport.update(queue, Resolution { width, height });
        if let Err(err) = self.text_renderer.prepare(
            device,
            queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            [TextArea {
                buffer: &self.buffer,
                left: self.heading.x,
                top: self.heading.y,
                scale: 1.0,
                bounds: text_bounds(self.heading),
                default_color: title_color(),
                custom_glyphs: &[],
            }],
            &mut self.swash_cache,
        ) {
            warn!(error = %err, "title prepare failed");
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Err(err) = self
            .text_renderer
            .render(&self.atlas, &self.viewport, pass)
        {
            warn!(error = %err, "title draw failed");
        }
    }

    /// Release atlas space for glyphs that were not used this frame.
    pub fn trim(&mut self) {
        self.atlas.trim();
    }
}

/// Font size and line height of the heading at `scale`.
pub fn heading_metrics(scale: f32) -> Metrics {
    Metrics::new(TITLE_FONT_SIZE * scale, TITLE_LINE_HEIGHT * scale)
}

/// Clip rect of the heading in whole physical px.
pub fn text_bounds(heading: Rect) -> TextBounds {
    TextBounds {
        left: heading.x.floor() as i32,
        top: heading.y.floor() as i32,
        right: heading.right().ceil() as i32,
        bottom: heading.bottom().ceil() as i32,
    }
}

fn title_color() -> Color {
    let black: Srgba<u8> = Srgba::new(0.0f32, 0.0, 0.0, 1.0).into_format();
    Color::rgba(black.red, black.green, black.blue, black.alpha)
}

fn resolve_font_family(db: &Database, requested: Option<&str>) -> FamilyOwned {
    if let Some(name) = requested.map(str::trim).filter(|name| !name.is_empty()) {
        if font_available(db, name) {
            return FamilyOwned::Name(name.into());
        }
        warn!(font = %name, "title font not installed; falling back");
    }
    if font_available(db, FALLBACK_FONT) {
        FamilyOwned::Name(FALLBACK_FONT.into())
    } else {
        FamilyOwned::SansSerif
    }
}

fn font_available(db: &Database, name: &str) -> bool {
    let query = Query {
        families: &[Family::Name(name)],
        ..Default::default()
    };
    db.query(&query).is_some()
}
