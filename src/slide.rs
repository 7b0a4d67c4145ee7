//! Slide descriptors and the responsive size hints used to pick decode sizes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One image entry of the carousel: where to load it from and what it shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Slide {
    #[serde(alias = "src")]
    pub source: String,
    #[serde(alias = "alt")]
    pub alt_text: String,
}

impl Slide {
    pub fn new(source: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alt_text: alt_text.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.source.to_ascii_lowercase();
        ["http://", "https://", "data:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
    }

    /// Filesystem location of the image, or `RemoteSource` for URLs.
    pub fn local_path(&self) -> Result<PathBuf> {
        if self.is_remote() {
            return Err(Error::RemoteSource(self.source.clone()));
        }
        let path = self.source.strip_prefix("file://").unwrap_or(&self.source);
        Ok(PathBuf::from(path))
    }
}

/// Only the first slide is fetched ahead of everything else.
pub fn loads_with_priority(index: usize) -> bool {
    index == 0
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Length {
    Vw(f32),
    Px(f32),
}

impl Length {
    fn resolve(self, viewport_w: f32) -> f32 {
        match self {
            Self::Vw(vw) => viewport_w * vw / 100.0,
            Self::Px(px) => px,
        }
    }
}

impl FromStr for Length {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        let s = s.trim();
        if let Some(n) = s.strip_suffix("vw") {
            n.trim().parse().map(Self::Vw).map_err(|_| ())
        } else if let Some(n) = s.strip_suffix("px") {
            n.trim().parse().map(Self::Px).map_err(|_| ())
        } else {
            Err(())
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vw(v) => write!(f, "{v}vw"),
            Self::Px(p) => write!(f, "{p}px"),
        }
    }
}

/// A `sizes`-attribute style list: `(max-width: 768px) 100vw, ..., 33vw`.
///
/// Conditions are checked in order against the viewport width (logical px);
/// the first matching entry wins, the trailing unconditional entry is the fallback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct SizesHint {
    rules: Vec<(f32, Length)>,
    fallback: Length,
}

impl SizesHint {
    /// Displayed width in logical px for a viewport of `viewport_w` logical px.
    pub fn width_for(&self, viewport_w: f32) -> f32 {
        self.rules
            .iter()
            .find(|(max_width, _)| viewport_w <= *max_width)
            .map_or(self.fallback, |(_, len)| *len)
            .resolve(viewport_w)
    }
}

impl Default for SizesHint {
    fn default() -> Self {
        Self {
            rules: vec![(768.0, Length::Vw(100.0)), (1200.0, Length::Vw(50.0))],
            fallback: Length::Vw(33.0),
        }
    }
}

impl FromStr for SizesHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSizes(s.to_string());
        let mut rules = Vec::new();
        let mut fallback = None;
        for entry in s.split(',').map(str::trim) {
            if fallback.is_some() {
                // the unconditional size must come last
                return Err(invalid());
            }
            if let Some(rest) = entry.strip_prefix('(') {
                let (cond, len) = rest.split_once(')').ok_or_else(invalid)?;
                let (feature, value) = cond.split_once(':').ok_or_else(invalid)?;
                if feature.trim() != "max-width" {
                    return Err(invalid());
                }
                let max_width = match value.parse::<Length>() {
                    Ok(Length::Px(px)) => px,
                    _ => return Err(invalid()),
                };
                rules.push((max_width, len.parse().map_err(|_| invalid())?));
            } else {
                fallback = Some(entry.parse().map_err(|_| invalid())?);
            }
        }
        Ok(Self {
            rules,
            fallback: fallback.ok_or_else(invalid)?,
        })
    }
}

impl TryFrom<String> for SizesHint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for SizesHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (max_width, len) in &self.rules {
            write!(f, "(max-width: {max_width}px) {len}, ")?;
        }
        write!(f, "{}", self.fallback)
    }
}
