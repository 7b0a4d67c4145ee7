//! Page geometry in physical pixels.
//!
//! All constants are logical pixels and get multiplied by the window scale
//! factor in [`PageLayout::compute`].

use serde::Deserialize;

pub const PAGE_PADDING: f32 = 16.0;
pub const MAX_FRAME_WIDTH: f32 = 768.0;
pub const FRAME_ASPECT: f32 = 16.0 / 9.0;
pub const FRAME_RADIUS: f32 = 8.0;
pub const BUTTON_INSET: f32 = 8.0;
pub const BUTTON_PADDING: f32 = 4.0;
pub const ICON_SIZE: f32 = 20.0;
pub const INDICATOR_SIZE: f32 = 6.0;
pub const INDICATOR_GAP: f32 = 4.0;
pub const INDICATOR_INSET: f32 = 8.0;
/// Heading font size and line height (`text-2xl`).
pub const TITLE_FONT_SIZE: f32 = 24.0;
pub const TITLE_LINE_HEIGHT: f32 = 32.0;
/// Space between the heading and the frame.
pub const TITLE_GAP: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

/// How a decoded image is placed inside its slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Stretch to the slide, ignoring aspect ratio.
    #[default]
    Fill,
    /// Letterbox inside the slide.
    Contain,
    /// Fill the slide and crop the overflow.
    Cover,
}

/// Destination rect and `[u0, v0, u1, v1]` texture window for an image of
/// `img_w`×`img_h` shown in `slot`.
pub fn place_image(slot: Rect, img_w: u32, img_h: u32, fit: FitMode) -> (Rect, [f32; 4]) {
    let full = [0.0, 0.0, 1.0, 1.0];
    if img_w == 0 || img_h == 0 || slot.w <= 0.0 || slot.h <= 0.0 {
        return (slot, full);
    }
    let img_ar = img_w as f32 / img_h as f32;
    let slot_ar = slot.w / slot.h;
    match fit {
        FitMode::Fill => (slot, full),
        FitMode::Contain => {
            let (w, h) = if img_ar > slot_ar {
                (slot.w, slot.w / img_ar)
            } else {
                (slot.h * img_ar, slot.h)
            };
            let rect = Rect::new(
                slot.x + (slot.w - w) * 0.5,
                slot.y + (slot.h - h) * 0.5,
                w,
                h,
            );
            (rect, full)
        }
        FitMode::Cover => {
            let uv = if img_ar > slot_ar {
                let visible = slot_ar / img_ar;
                let u0 = (1.0 - visible) * 0.5;
                [u0, 0.0, u0 + visible, 1.0]
            } else {
                let visible = img_ar / slot_ar;
                let v0 = (1.0 - visible) * 0.5;
                [0.0, v0, 1.0, v0 + visible]
            };
            (slot, uv)
        }
    }
}

/// What a pointer position lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Prev,
    Next,
    Indicator(usize),
    Frame,
}

impl Hit {
    pub fn aria_label(&self) -> Option<String> {
        match self {
            Self::Prev => Some("Previous slide".to_string()),
            Self::Next => Some("Next slide".to_string()),
            Self::Indicator(i) => Some(format!("Go to slide {}", i + 1)),
            Self::Frame => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub viewport: Rect,
    /// Title line above the frame, `None` for untitled carousels.
    pub heading: Option<Rect>,
    pub frame: Rect,
    pub prev: Rect,
    pub next: Rect,
    pub indicators: Vec<Rect>,
    pub scale: f32,
}

impl PageLayout {
    /// Lay out the page for a `width`×`height` physical-pixel window.
    ///
    /// The frame is as wide as the padded window allows, capped at
    /// [`MAX_FRAME_WIDTH`], and shrinks further when its 16:9 height would not fit.
    pub fn compute(width: u32, height: u32, scale_factor: f64, slide_count: usize) -> Self {
        Self::compute_titled(width, height, scale_factor, slide_count, false)
    }

    /// Like [`PageLayout::compute`], reserving a heading line above the frame
    /// when `titled`. Heading and frame are centered together.
    pub fn compute_titled(
        width: u32,
        height: u32,
        scale_factor: f64,
        slide_count: usize,
        titled: bool,
    ) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor as f32
        } else {
            1.0
        };
        let vw = width.max(1) as f32;
        let vh = height.max(1) as f32;
        let pad = PAGE_PADDING * scale;
        let heading_h = if titled {
            (TITLE_LINE_HEIGHT + TITLE_GAP) * scale
        } else {
            0.0
        };

        let frame_w = (vw - 2.0 * pad)
            .min(MAX_FRAME_WIDTH * scale)
            .min((vh - 2.0 * pad - heading_h) * FRAME_ASPECT)
            .max(1.0);
        let frame_h = frame_w / FRAME_ASPECT;
        let top = (vh - frame_h - heading_h) * 0.5;
        let frame = Rect::new((vw - frame_w) * 0.5, top + heading_h, frame_w, frame_h);
        let heading =
            titled.then(|| Rect::new(frame.x, top, frame_w, TITLE_LINE_HEIGHT * scale));

        let button = (ICON_SIZE + 2.0 * BUTTON_PADDING) * scale;
        let button_y = frame.y + (frame.h - button) * 0.5;
        let prev = Rect::new(frame.x + BUTTON_INSET * scale, button_y, button, button);
        let next = Rect::new(
            frame.right() - BUTTON_INSET * scale - button,
            button_y,
            button,
            button,
        );

        let dot = INDICATOR_SIZE * scale;
        let gap = INDICATOR_GAP * scale;
        let row_w = slide_count as f32 * dot + slide_count.saturating_sub(1) as f32 * gap;
        let row_x = frame.x + (frame.w - row_w) * 0.5;
        let row_y = frame.bottom() - INDICATOR_INSET * scale - dot;
        let indicators = (0..slide_count)
            .map(|i| Rect::new(row_x + i as f32 * (dot + gap), row_y, dot, dot))
            .collect();

        Self {
            viewport: Rect::new(0.0, 0.0, vw, vh),
            heading,
            frame,
            prev,
            next,
            indicators,
            scale,
        }
    }

    /// Where slide `index` sits when the strip is scrolled to `offset` slides.
    pub fn slide_rect(&self, index: usize, offset: f32) -> Rect {
        self.frame
            .translated((index as f32 - offset) * self.frame.w, 0.0)
    }

    /// Slides that overlap the frame at strip position `offset`.
    pub fn visible_slides(&self, offset: f32, count: usize) -> Vec<usize> {
        (0..count)
            .filter(|&k| (k as f32 - offset).abs() < 1.0)
            .collect()
    }

    /// Whether a pointer or touch at `x`, `y` lands on the carousel frame.
    pub fn in_frame(&self, x: f32, y: f32) -> bool {
        self.frame.contains(x, y)
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<Hit> {
        if !self.in_frame(x, y) {
            return None;
        }
        let in_circle = |r: &Rect| {
            let (cx, cy) = r.center();
            let radius = r.w * 0.5;
            (x - cx).powi(2) + (y - cy).powi(2) <= radius * radius
        };
        if in_circle(&self.prev) {
            return Some(Hit::Prev);
        }
        if in_circle(&self.next) {
            return Some(Hit::Next);
        }
        if let Some(i) = self.indicators.iter().position(|r| r.contains(x, y)) {
            return Some(Hit::Indicator(i));
        }
        Some(Hit::Frame)
    }
}
