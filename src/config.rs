use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::carousel::{CarouselOptions, WrapMode, DEFAULT_SWIPE_THRESHOLD};
use crate::layout::FitMode;
use crate::slide::{SizesHint, Slide};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowOptions {
    /// Initial inner size in logical px.
    pub width: u32,
    pub height: u32,
    /// Borderless fullscreen on the current monitor.
    pub fullscreen: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Heading drawn above the carousel, also used as the window title.
    pub title: Option<String>,
    /// Font family for the heading; falls back to DejaVu Sans, then any sans-serif.
    pub font: Option<String>,
    /// Ordered slides; relative sources are resolved against the config file.
    pub slides: Vec<Slide>,
    /// Minimum swipe travel in logical px.
    pub swipe_threshold: f32,
    /// Policy for targets outside `0..slides.len()`.
    pub wrap: WrapMode,
    /// Duration of the strip slide animation.
    #[serde(with = "humantime_serde")]
    pub transition: Duration,
    /// Duration of the hover fade of buttons and indicators.
    #[serde(with = "humantime_serde")]
    pub controls_fade: Duration,
    pub fit: FitMode,
    /// Responsive decode-width hint, `sizes`-attribute syntax.
    pub sizes: SizesHint,
    /// Upper bound for decoded texture width and height.
    pub max_texture_dim: u32,
    pub window: WindowOptions,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            title: None,
            font: None,
            slides: Vec::new(),
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            wrap: WrapMode::default(),
            transition: Duration::from_millis(500),
            controls_fade: Duration::from_millis(150),
            fit: FitMode::default(),
            sizes: SizesHint::default(),
            max_texture_dim: 4096,
            window: WindowOptions::default(),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)?;
        let mut cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if let Some(base) = path.parent() {
            cfg.resolve_sources(base);
        }
        Ok(cfg)
    }

    /// Rewrite relative local slide sources so they are relative to `base`.
    pub fn resolve_sources(&mut self, base: &Path) {
        for slide in &mut self.slides {
            // `file://` prefixes are stripped before deciding whether the path is relative
            let Ok(path) = slide.local_path() else {
                continue;
            };
            if path.is_absolute() {
                continue;
            }
            slide.source = base.join(path).to_string_lossy().into_owned();
        }
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.slides.is_empty(), "slides must list at least one image");
        for (i, slide) in self.slides.iter().enumerate() {
            ensure!(
                !slide.source.trim().is_empty(),
                "slide {} has an empty source",
                i + 1
            );
            if slide.is_remote() {
                warn!(slide = i + 1, source = %slide.source, "remote slide will not be fetched");
            }
        }
        ensure!(
            self.swipe_threshold.is_finite() && self.swipe_threshold > 0.0,
            "swipe-threshold must be a positive number"
        );
        ensure!(
            self.max_texture_dim > 0,
            "max-texture-dim must be greater than zero"
        );
        ensure!(
            self.window.width > 0 && self.window.height > 0,
            "window width and height must be greater than zero"
        );
        Ok(self)
    }

    pub fn carousel_options(&self) -> CarouselOptions {
        CarouselOptions {
            swipe_threshold: self.swipe_threshold,
            wrap: self.wrap,
        }
    }
}
