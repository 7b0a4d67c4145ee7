//! Turns the page layout and carousel state into a flat list of quads.
//!
//! The renderer draws the list in order; nothing here touches the GPU.

use bytemuck::{Pod, Zeroable};
use palette::{LinSrgb, Srgb};

use crate::layout::{place_image, FitMode, PageLayout, Rect, BUTTON_PADDING, FRAME_RADIUS};

pub const BLUE_100: u32 = 0xdbeafe;
pub const WHITE: u32 = 0xffffff;
pub const PURPLE_100: u32 = 0xf3e8ff;
pub const SLATE_800: u32 = 0x1e293b;
pub const GRAY_400: u32 = 0x9ca3af;
pub const BLACK: u32 = 0x000000;

const MODE_SOLID: f32 = 0.0;
const MODE_TEXTURED: f32 = 1.0;
const MODE_CHEVRON_LEFT: f32 = 2.0;
const MODE_CHEVRON_RIGHT: f32 = 3.0;

/// Linear RGBA for an sRGB hex colour.
pub fn linear_rgba(hex: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    let lin: LinSrgb<f32> = Srgb::new(channel(16), channel(8), channel(0)).into_linear();
    [lin.red, lin.green, lin.blue, alpha]
}

/// Per-instance vertex data, mirrored by `QuadInstance` in `quad.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// x, y, w, h in physical px.
    pub rect: [f32; 4],
    /// u0, v0, u1, v1.
    pub uv: [f32; 4],
    /// Diagonal gradient stops (top-left, middle, bottom-right); equal for flat fills.
    pub color_start: [f32; 4],
    pub color_mid: [f32; 4],
    pub color_end: [f32; 4],
    /// Rounded clip rect, x, y, w, h.
    pub clip: [f32; 4],
    /// corner radius, clip radius, mode, opacity.
    pub params: [f32; 4],
}

impl QuadInstance {
    fn solid(rect: Rect, color: [f32; 4], radius: f32, clip: Rect, clip_radius: f32) -> Self {
        Self {
            rect: rect.to_array(),
            uv: [0.0, 0.0, 1.0, 1.0],
            color_start: color,
            color_mid: color,
            color_end: color,
            clip: clip.to_array(),
            params: [radius, clip_radius, MODE_SOLID, 1.0],
        }
    }

    fn with_mode(mut self, mode: f32) -> Self {
        self.params[2] = mode;
        self
    }

    fn with_opacity(mut self, opacity: f32) -> Self {
        self.params[3] = opacity;
        self
    }

    pub fn mode(&self) -> f32 {
        self.params[2]
    }

    pub fn opacity(&self) -> f32 {
        self.params[3]
    }
}

/// One quad plus the slide texture it samples, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCmd {
    pub texture: Option<usize>,
    pub instance: QuadInstance,
}

pub struct SceneInput<'a> {
    pub layout: &'a PageLayout,
    /// Strip position in slides; `1.5` is halfway between slide 1 and 2.
    pub offset: f32,
    pub current: usize,
    pub controls_opacity: f32,
    /// Decoded size of each slide, `None` while still loading.
    pub slide_sizes: &'a [Option<(u32, u32)>],
    pub fit: FitMode,
}

pub fn build_scene(input: &SceneInput<'_>) -> Vec<DrawCmd> {
    let layout = input.layout;
    let frame = layout.frame;
    let radius = FRAME_RADIUS * layout.scale;
    let mut cmds = Vec::with_capacity(8 + 2 * input.slide_sizes.len());
    let mut push = |texture, instance| cmds.push(DrawCmd { texture, instance });

    let mut page = QuadInstance::solid(
        layout.viewport,
        linear_rgba(BLUE_100, 1.0),
        0.0,
        layout.viewport,
        0.0,
    );
    page.color_mid = linear_rgba(WHITE, 1.0);
    page.color_end = linear_rgba(PURPLE_100, 1.0);
    push(None, page);

    push(
        None,
        QuadInstance::solid(frame, linear_rgba(SLATE_800, 1.0), radius, layout.viewport, 0.0),
    );

    for k in layout.visible_slides(input.offset, input.slide_sizes.len()) {
        let Some((w, h)) = input.slide_sizes[k] else {
            continue;
        };
        let slot = layout.slide_rect(k, input.offset);
        let (rect, uv) = place_image(slot, w, h, input.fit);
        let mut quad =
            QuadInstance::solid(rect, [1.0; 4], 0.0, frame, radius).with_mode(MODE_TEXTURED);
        quad.uv = uv;
        push(Some(k), quad);
    }

    let opacity = input.controls_opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return cmds;
    }

    let pad = BUTTON_PADDING * layout.scale;
    for (button, mode) in [
        (layout.prev, MODE_CHEVRON_LEFT),
        (layout.next, MODE_CHEVRON_RIGHT),
    ] {
        push(
            None,
            QuadInstance::solid(button, linear_rgba(BLACK, 0.5), button.w * 0.5, frame, radius)
                .with_opacity(opacity),
        );
        let icon = Rect::new(
            button.x + pad,
            button.y + pad,
            button.w - 2.0 * pad,
            button.h - 2.0 * pad,
        );
        push(
            None,
            QuadInstance::solid(icon, linear_rgba(WHITE, 1.0), 0.0, frame, radius)
                .with_mode(mode)
                .with_opacity(opacity),
        );
    }

    for (i, dot) in layout.indicators.iter().enumerate() {
        let color = if i == input.current { WHITE } else { GRAY_400 };
        push(
            None,
            QuadInstance::solid(*dot, linear_rgba(color, 1.0), dot.w * 0.5, frame, radius)
                .with_opacity(opacity),
        );
    }

    cmds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(
        offset: f32,
        current: usize,
        opacity: f32,
        sizes: &[Option<(u32, u32)>],
    ) -> Vec<DrawCmd> {
        let layout = PageLayout::compute(1920, 1080, 1.0, sizes.len());
        build_scene(&SceneInput {
            layout: &layout,
            offset,
            current,
            controls_opacity: opacity,
            slide_sizes: sizes,
            fit: FitMode::Fill,
        })
    }

    #[test]
    fn srgb_conversion_endpoints() {
        let white = linear_rgba(WHITE, 1.0);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-5));
        let black = linear_rgba(BLACK, 0.5);
        assert!(black[..3].iter().all(|c| c.abs() < 1e-6));
        assert_eq!(black[3], 0.5);
        let mid = linear_rgba(0x808080, 1.0);
        assert!(mid[0] > 0.2 && mid[0] < 0.23);
    }

    #[test]
    fn hidden_controls_are_not_drawn() {
        let cmds = scene(0.0, 0, 0.0, &[Some((10, 10)); 3]);
        // page, frame, one visible slide
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[2].texture, Some(0));
    }

    #[test]
    fn revealed_controls_follow_slides() {
        let cmds = scene(0.0, 1, 0.6, &[Some((10, 10)); 3]);
        // page, frame, slide, 2 × (button + chevron), 3 dots
        assert_eq!(cmds.len(), 3 + 4 + 3);
        assert!(cmds[3..].iter().all(|c| (c.instance.opacity() - 0.6).abs() < 1e-6));
        assert_eq!(cmds[4].instance.mode(), MODE_CHEVRON_LEFT);
        assert_eq!(cmds[6].instance.mode(), MODE_CHEVRON_RIGHT);
        let dots = &cmds[7..];
        assert_eq!(dots[1].instance.color_start, linear_rgba(WHITE, 1.0));
        assert_eq!(dots[0].instance.color_start, linear_rgba(GRAY_400, 1.0));
    }

    #[test]
    fn strip_is_offset_by_whole_frames() {
        let layout = PageLayout::compute(1920, 1080, 1.0, 3);
        let cmds = scene(0.5, 1, 0.0, &[Some((10, 10)); 3]);
        let slides: Vec<_> = cmds.iter().filter(|c| c.texture.is_some()).collect();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].instance.rect[0], layout.frame.x - 0.5 * layout.frame.w);
        assert_eq!(slides[1].instance.rect[0], layout.frame.x + 0.5 * layout.frame.w);
        for s in slides {
            assert_eq!(s.instance.clip, layout.frame.to_array());
            assert_eq!(s.instance.mode(), MODE_TEXTURED);
        }
    }

    #[test]
    fn loading_slides_show_the_placeholder() {
        let cmds = scene(0.0, 0, 0.0, &[None, Some((10, 10))]);
        assert!(cmds.iter().all(|c| c.texture.is_none()));
    }

    #[test]
    fn page_background_is_a_three_stop_gradient() {
        let cmds = scene(0.0, 0, 0.0, &[None]);
        let page = cmds[0].instance;
        assert_eq!(page.color_start, linear_rgba(BLUE_100, 1.0));
        assert_eq!(page.color_mid, linear_rgba(WHITE, 1.0));
        assert_eq!(page.color_end, linear_rgba(PURPLE_100, 1.0));
    }
}
