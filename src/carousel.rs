//! Navigation state of the carousel.
//!
//! Everything here is synchronous and window-free: the viewer feeds
//! [`CarouselInput`]s in and redraws from [`Carousel::current_index`].

use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::events::{CarouselInput, NavKey, SlideChange};
use crate::slide::Slide;

/// Minimum horizontal travel, in logical px, for a touch gesture to count as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 75.0;

/// How an out-of-range target index is brought back into `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapMode {
    /// Below zero goes to the last slide, at or past the end goes to the first.
    SingleStep,
    /// Euclidean remainder; agrees with `SingleStep` for `-1..=count`.
    #[default]
    Modular,
}

impl WrapMode {
    /// Map `index` into `0..count`. `count` must be non-zero.
    pub fn normalize(self, index: isize, count: usize) -> usize {
        debug_assert!(count > 0);
        match self {
            Self::SingleStep => {
                if index < 0 {
                    count - 1
                } else if index as usize >= count {
                    0
                } else {
                    index as usize
                }
            }
            Self::Modular => index.rem_euclid(count as isize) as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselOptions {
    pub swipe_threshold: f32,
    pub wrap: WrapMode,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            wrap: WrapMode::default(),
        }
    }
}

/// Horizontal coordinates of the gesture in progress.
///
/// Only the first finger of a gesture is followed. Starting a gesture resets the
/// end coordinate, so a tap never reuses a previous swipe's travel. A start for
/// the finger already tracked means its end was lost and restarts the gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchTracker {
    active: Option<u64>,
    start_x: f32,
    end_x: f32,
}

impl TouchTracker {
    pub fn begin(&mut self, id: u64, x: f32) {
        if self.active.is_some_and(|active| active != id) {
            return;
        }
        self.active = Some(id);
        self.start_x = x;
        self.end_x = x;
    }

    pub fn update(&mut self, id: u64, x: f32) {
        if self.active == Some(id) {
            self.end_x = x;
        }
    }

    /// Ends the gesture and returns `start - end`, or `None` for an untracked id.
    pub fn finish(&mut self, id: u64) -> Option<f32> {
        if self.active != Some(id) {
            return None;
        }
        self.active = None;
        Some(self.start_x - self.end_x)
    }

    pub fn cancel(&mut self, id: u64) {
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// Travel of the gesture in progress.
    pub fn delta(&self) -> Option<f32> {
        self.active.map(|_| self.start_x - self.end_x)
    }
}

#[derive(Debug, Clone)]
pub struct Carousel {
    slides: Vec<Slide>,
    title: Option<String>,
    current: usize,
    touch: TouchTracker,
    options: CarouselOptions,
}

impl Carousel {
    pub fn new(
        slides: Vec<Slide>,
        title: Option<String>,
        options: CarouselOptions,
    ) -> Result<Self> {
        if slides.is_empty() {
            return Err(Error::EmptySlides);
        }
        Ok(Self {
            slides,
            title,
            current: 0,
            touch: TouchTracker::default(),
            options,
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.current]
    }

    pub fn options(&self) -> CarouselOptions {
        self.options
    }

    pub fn go_to_slide(&mut self, index: isize) -> Option<SlideChange> {
        let to = self.options.wrap.normalize(index, self.slides.len());
        if to == self.current {
            return None;
        }
        let change = SlideChange {
            from: self.current,
            to,
        };
        self.current = to;
        debug!(from = change.from, to, requested = index, "slide changed");
        Some(change)
    }

    pub fn next_slide(&mut self) -> Option<SlideChange> {
        self.go_to_slide(self.current as isize + 1)
    }

    pub fn prev_slide(&mut self) -> Option<SlideChange> {
        self.go_to_slide(self.current as isize - 1)
    }

    pub fn indicator_clicked(&mut self, index: usize) -> Option<SlideChange> {
        self.go_to_slide(index as isize)
    }

    pub fn key_down(&mut self, key: NavKey) -> Option<SlideChange> {
        match key {
            NavKey::ArrowLeft => self.prev_slide(),
            NavKey::ArrowRight => self.next_slide(),
            NavKey::Other => None,
        }
    }

    pub fn touch_start(&mut self, id: u64, x: f32) {
        trace!(id, x, "touch start");
        self.touch.begin(id, x);
    }

    pub fn touch_move(&mut self, id: u64, x: f32) {
        trace!(id, x, "touch move");
        self.touch.update(id, x);
    }

    pub fn touch_end(&mut self, id: u64) -> Option<SlideChange> {
        let delta = self.touch.finish(id)?;
        trace!(id, delta, "touch end");
        let threshold = self.options.swipe_threshold;
        if delta > threshold {
            self.next_slide()
        } else if delta < -threshold {
            self.prev_slide()
        } else {
            None
        }
    }

    pub fn touch_cancel(&mut self, id: u64) {
        trace!(id, "touch cancel");
        self.touch.cancel(id);
    }

    /// Travel of the tracked touch so far, `None` when no gesture is active.
    pub fn swipe_delta(&self) -> Option<f32> {
        self.touch.delta()
    }

    pub fn handle(&mut self, input: CarouselInput) -> Option<SlideChange> {
        match input {
            CarouselInput::PrevClicked => self.prev_slide(),
            CarouselInput::NextClicked => self.next_slide(),
            CarouselInput::IndicatorClicked(index) => self.indicator_clicked(index),
            CarouselInput::Key(key) => self.key_down(key),
            CarouselInput::TouchStart { id, x } => {
                self.touch_start(id, x);
                None
            }
            CarouselInput::TouchMove { id, x } => {
                self.touch_move(id, x);
                None
            }
            CarouselInput::TouchEnd { id } => self.touch_end(id),
            CarouselInput::TouchCancel { id } => {
                self.touch_cancel(id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(n: usize, wrap: WrapMode) -> Carousel {
        let slides = (0..n)
            .map(|i| Slide::new(format!("{i}.jpg"), format!("slide {i}")))
            .collect();
        Carousel::new(
            slides,
            None,
            CarouselOptions {
                wrap,
                ..CarouselOptions::default()
            },
        )
        .unwrap()
    }

    fn swipe(c: &mut Carousel, from: f32, to: f32) -> Option<SlideChange> {
        c.touch_start(1, from);
        c.touch_move(1, to);
        c.touch_end(1)
    }

    #[test]
    fn empty_slides_rejected() {
        let err = Carousel::new(Vec::new(), None, CarouselOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptySlides));
    }

    #[test]
    fn index_stays_in_range_for_every_sequence() {
        for wrap in [WrapMode::SingleStep, WrapMode::Modular] {
            for n in 1..=5 {
                // every next/prev sequence of length 8, bit i picks the i-th step
                for pattern in 0u32..256 {
                    let mut c = carousel(n, wrap);
                    for step in 0..8 {
                        if pattern & (1 << step) != 0 {
                            c.next_slide();
                        } else {
                            c.prev_slide();
                        }
                        assert!(c.current_index() < n, "n={n} pattern={pattern:#b}");
                    }
                }
            }
        }
    }

    #[test]
    fn underflow_wraps_to_last() {
        let mut c = carousel(3, WrapMode::SingleStep);
        let change = c.go_to_slide(-1).unwrap();
        assert_eq!((change.from, change.to), (0, 2));
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn overflow_wraps_to_first() {
        for wrap in [WrapMode::SingleStep, WrapMode::Modular] {
            let mut c = carousel(4, wrap);
            c.go_to_slide(3);
            c.go_to_slide(4);
            assert_eq!(c.current_index(), 0);
        }
    }

    #[test]
    fn far_out_of_range_depends_on_wrap_mode() {
        let mut single = carousel(3, WrapMode::SingleStep);
        single.go_to_slide(3 + 5);
        assert_eq!(single.current_index(), 0);
        single.go_to_slide(-7);
        assert_eq!(single.current_index(), 2);

        let mut modular = carousel(3, WrapMode::Modular);
        modular.go_to_slide(3 + 5);
        assert_eq!(modular.current_index(), 2);
        modular.go_to_slide(-7);
        assert_eq!(modular.current_index(), 2);
        modular.go_to_slide(-4);
        assert_eq!(modular.current_index(), 2);
        modular.go_to_slide(-6);
        assert_eq!(modular.current_index(), 0);
    }

    #[test]
    fn swipe_left_past_threshold_advances() {
        let mut c = carousel(3, WrapMode::default());
        let change = swipe(&mut c, 100.0, 10.0).unwrap();
        assert_eq!((change.from, change.to), (0, 1));
    }

    #[test]
    fn short_swipe_does_nothing() {
        let mut c = carousel(3, WrapMode::default());
        assert!(swipe(&mut c, 100.0, 50.0).is_none());
        assert_eq!(c.current_index(), 0);
        // exactly the threshold is not enough either
        assert!(swipe(&mut c, 100.0, 25.0).is_none());
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn swipe_right_goes_back() {
        let mut c = carousel(3, WrapMode::default());
        swipe(&mut c, 10.0, 100.0);
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn tap_after_swipe_does_not_reuse_old_travel() {
        let mut c = carousel(3, WrapMode::default());
        swipe(&mut c, 200.0, 20.0);
        assert_eq!(c.current_index(), 1);
        c.touch_start(2, 200.0);
        assert_eq!(c.swipe_delta(), Some(0.0));
        assert!(c.touch_end(2).is_none());
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn second_finger_is_ignored() {
        let mut c = carousel(3, WrapMode::default());
        c.touch_start(1, 300.0);
        c.touch_start(2, 0.0);
        c.touch_move(2, 500.0);
        c.touch_move(1, 100.0);
        assert!(c.touch_end(2).is_none());
        assert_eq!(c.touch_end(1).map(|ch| ch.to), Some(1));
    }

    #[test]
    fn restart_of_same_finger_replaces_lost_gesture() {
        let mut c = carousel(3, WrapMode::default());
        c.touch_start(1, 300.0);
        c.touch_move(1, 250.0);
        // end for the first contact never arrived
        c.touch_start(1, 500.0);
        c.touch_move(1, 400.0);
        assert_eq!(c.touch_end(1).map(|ch| ch.to), Some(1));
        c.touch_start(4, 0.0);
        c.touch_move(4, 200.0);
        assert_eq!(c.touch_end(4).map(|ch| ch.to), Some(0));
    }

    #[test]
    fn cancelled_gesture_never_navigates() {
        let mut c = carousel(3, WrapMode::default());
        c.touch_start(1, 300.0);
        c.touch_move(1, 0.0);
        c.touch_cancel(1);
        assert!(c.touch_end(1).is_none());
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn arrow_right_three_times_cycles() {
        let mut c = carousel(3, WrapMode::default());
        let seen: Vec<usize> = (0..3)
            .map(|_| {
                c.key_down(NavKey::ArrowRight);
                c.current_index()
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 0]);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut c = carousel(3, WrapMode::default());
        assert!(c.key_down(NavKey::Other).is_none());
        c.key_down(NavKey::ArrowLeft);
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn indicator_is_absolute() {
        let mut c = carousel(3, WrapMode::default());
        assert_eq!(c.indicator_clicked(1).map(|ch| ch.to), Some(1));
        c.next_slide();
        assert_eq!(c.indicator_clicked(1).map(|ch| ch.to), Some(1));
        assert!(c.indicator_clicked(1).is_none());
    }

    #[test]
    fn single_slide_never_changes() {
        let mut c = carousel(1, WrapMode::SingleStep);
        assert!(c.next_slide().is_none());
        assert!(c.prev_slide().is_none());
        assert!(swipe(&mut c, 500.0, 0.0).is_none());
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn handle_dispatches_inputs() {
        let mut c = carousel(4, WrapMode::default());
        c.handle(CarouselInput::NextClicked);
        c.handle(CarouselInput::NextClicked);
        c.handle(CarouselInput::PrevClicked);
        assert_eq!(c.current_index(), 1);
        c.handle(CarouselInput::IndicatorClicked(3));
        assert_eq!(c.current_index(), 3);
        c.handle(CarouselInput::TouchStart { id: 9, x: 0.0 });
        c.handle(CarouselInput::TouchMove { id: 9, x: 120.0 });
        let change = c.handle(CarouselInput::TouchEnd { id: 9 }).unwrap();
        assert_eq!((change.from, change.to), (3, 2));
    }
}
