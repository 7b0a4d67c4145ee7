use std::path::PathBuf;

/// Keys the carousel reacts to; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Interaction delivered to a carousel by its host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarouselInput {
    PrevClicked,
    NextClicked,
    IndicatorClicked(usize),
    Key(NavKey),
    TouchStart { id: u64, x: f32 },
    TouchMove { id: u64, x: f32 },
    TouchEnd { id: u64 },
    TouchCancel { id: u64 },
}

/// Emitted whenever navigation actually moves the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChange {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct LoadSlide {
    pub index: usize,
    pub path: PathBuf,
    /// Maximum decoded width in physical px.
    pub target_width: u32,
    pub priority: bool,
}

#[derive(Debug, Clone)]
pub struct PreparedImageCpu {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SlideLoaded {
    pub index: usize,
    pub prepared: PreparedImageCpu,
}

#[derive(Debug)]
pub struct InvalidSlide {
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

/// Loader output, drained by the viewer between frames.
#[derive(Debug)]
pub enum LoaderEvent {
    Loaded(SlideLoaded),
    Invalid(InvalidSlide),
}
