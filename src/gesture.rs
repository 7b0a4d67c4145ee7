//! Routes window touch events to the carousel.
//!
//! Only touches that start on the carousel frame become gestures. One finger is
//! followed at a time; a release that stayed within [`TAP_SLOP`] of where it
//! started is also reported as a tap so it can activate the control under it.

use std::time::{Duration, Instant};

use tracing::debug;
use winit::event::TouchPhase;

use crate::events::CarouselInput;
use crate::layout::PageLayout;

/// Largest travel in logical px that still counts as a tap.
pub const TAP_SLOP: f32 = 10.0;

/// A gesture with no events for this long is assumed to have lost its end.
pub const STALE_TOUCH: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTouch {
    id: u64,
    start: (f32, f32),
    // furthest distance from `start`, logical px
    travel: f32,
    last_seen: Instant,
}

impl ActiveTouch {
    fn track(&mut self, layout: &PageLayout, x: f32, y: f32, now: Instant) {
        let dx = (x - self.start.0) / layout.scale;
        let dy = (y - self.start.1) / layout.scale;
        self.travel = self.travel.max(dx.hypot(dy));
        self.last_seen = now;
    }
}

/// What a single touch event turned into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routed {
    /// Inputs for the carousel, in order.
    pub inputs: Vec<CarouselInput>,
    /// Physical position of a tap, if the event ended one.
    pub tap: Option<(f32, f32)>,
}

#[derive(Debug, Default)]
pub struct FrameTouches {
    active: Option<ActiveTouch>,
}

impl FrameTouches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the finger being followed.
    pub fn active_id(&self) -> Option<u64> {
        self.active.map(|a| a.id)
    }

    /// Route one touch event at physical `x`, `y`.
    pub fn route(
        &mut self,
        layout: &PageLayout,
        phase: TouchPhase,
        id: u64,
        x: f32,
        y: f32,
        now: Instant,
    ) -> Routed {
        let mut routed = Routed::default();
        let logical_x = x / layout.scale;
        match phase {
            TouchPhase::Started => {
                if !layout.in_frame(x, y) {
                    debug!(id, x, y, "touch outside carousel frame");
                    return routed;
                }
                if let Some(old) = self.active {
                    let stale = now.saturating_duration_since(old.last_seen) >= STALE_TOUCH;
                    if old.id != id && !stale {
                        return routed;
                    }
                    debug!(old = old.id, id, "replacing unfinished touch");
                    routed.inputs.push(CarouselInput::TouchCancel { id: old.id });
                }
                self.active = Some(ActiveTouch {
                    id,
                    start: (x, y),
                    travel: 0.0,
                    last_seen: now,
                });
                routed
                    .inputs
                    .push(CarouselInput::TouchStart { id, x: logical_x });
            }
            TouchPhase::Moved => {
                if let Some(active) = self.active.as_mut().filter(|a| a.id == id) {
                    active.track(layout, x, y, now);
                    routed
                        .inputs
                        .push(CarouselInput::TouchMove { id, x: logical_x });
                }
            }
            TouchPhase::Ended => {
                if let Some(mut active) = self.active.take_if(|a| a.id == id) {
                    active.track(layout, x, y, now);
                    routed.inputs.extend([
                        CarouselInput::TouchMove { id, x: logical_x },
                        CarouselInput::TouchEnd { id },
                    ]);
                    if active.travel <= TAP_SLOP {
                        routed.tap = Some((x, y));
                    }
                }
            }
            TouchPhase::Cancelled => {
                if self.active.take_if(|a| a.id == id).is_some() {
                    routed.inputs.push(CarouselInput::TouchCancel { id });
                }
            }
        }
        routed
    }

    /// Drop the gesture in progress, e.g. when the window loses focus.
    pub fn reset(&mut self) -> Option<CarouselInput> {
        self.active
            .take()
            .map(|a| CarouselInput::TouchCancel { id: a.id })
    }
}
