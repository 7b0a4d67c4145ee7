//! The page hosting the carousel.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::info;

use crate::carousel::{Carousel, CarouselOptions};
use crate::config::Configuration;
use crate::error::Result;
use crate::events::{CarouselInput, SlideChange};
use crate::keyboard::{KeyListener, KeyboardHub};
use crate::slide::Slide;

/// Static page content: the slide list and optional title.
#[derive(Debug, Clone)]
pub struct Home {
    title: Option<String>,
    slides: Vec<Slide>,
    options: CarouselOptions,
}

impl Home {
    pub fn new(title: Option<String>, slides: Vec<Slide>, options: CarouselOptions) -> Self {
        Self {
            title,
            slides,
            options,
        }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(cfg.title.clone(), cfg.slides.clone(), cfg.carousel_options())
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Create a fresh carousel at slide 0 and attach its arrow-key listener.
    pub fn mount(&self, hub: &KeyboardHub) -> Result<MountedCarousel> {
        let carousel = Rc::new(RefCell::new(Carousel::new(
            self.slides.clone(),
            self.title.clone(),
            self.options,
        )?));
        let changes = Rc::new(RefCell::new(VecDeque::new()));
        let keys = hub.subscribe({
            let carousel = carousel.clone();
            let changes = changes.clone();
            move |key| {
                if let Some(change) = carousel.borrow_mut().key_down(key) {
                    changes.borrow_mut().push_back(change);
                }
            }
        });
        info!(slides = self.slides.len(), title = ?self.title, "carousel mounted");
        Ok(MountedCarousel {
            carousel,
            changes,
            _keys: keys,
        })
    }
}

/// A carousel attached to the page. Dropping it unmounts and removes the key listener.
pub struct MountedCarousel {
    carousel: Rc<RefCell<Carousel>>,
    changes: Rc<RefCell<VecDeque<SlideChange>>>,
    _keys: KeyListener,
}

impl MountedCarousel {
    pub fn carousel(&self) -> Ref<'_, Carousel> {
        self.carousel.borrow()
    }

    pub fn handle(&self, input: CarouselInput) -> Option<SlideChange> {
        let change = self.carousel.borrow_mut().handle(input);
        if let Some(change) = change {
            self.changes.borrow_mut().push_back(change);
        }
        change
    }

    /// Slide changes since the last call, oldest first, from any input path.
    pub fn take_changes(&self) -> Vec<SlideChange> {
        self.changes.borrow_mut().drain(..).collect()
    }

    /// Carousel title plus the alt text of the slide on screen.
    pub fn accessible_title(&self) -> String {
        let carousel = self.carousel.borrow();
        let alt = &carousel.current_slide().alt_text;
        match carousel.title() {
            Some(title) => format!("{title} | {alt}"),
            None => alt.clone(),
        }
    }
}

impl Drop for MountedCarousel {
    fn drop(&mut self) {
        info!(
            at = self.carousel.borrow().current_index(),
            "carousel unmounted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NavKey;

    fn home() -> Home {
        Home::new(
            Some("My Carousel".into()),
            vec![
                Slide::new("a.jpg", "first"),
                Slide::new("b.jpg", "second"),
                Slide::new("c.jpg", "third"),
            ],
            CarouselOptions::default(),
        )
    }

    #[test]
    fn keys_reach_mounted_carousel_only() {
        let hub = KeyboardHub::new();
        let mounted = home().mount(&hub).unwrap();
        hub.dispatch(NavKey::ArrowRight);
        assert_eq!(mounted.carousel().current_index(), 1);
        drop(mounted);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.dispatch(NavKey::ArrowRight), 0);
    }

    #[test]
    fn remount_starts_over_without_leaking() {
        let hub = KeyboardHub::new();
        let page = home();
        for _ in 0..3 {
            let mounted = page.mount(&hub).unwrap();
            assert_eq!(mounted.carousel().current_index(), 0);
            assert_eq!(hub.listener_count(), 1);
            hub.dispatch(NavKey::ArrowLeft);
            assert_eq!(mounted.carousel().current_index(), 2);
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn changes_are_collected_from_keys_and_inputs() {
        let hub = KeyboardHub::new();
        let mounted = home().mount(&hub).unwrap();
        hub.dispatch(NavKey::ArrowRight);
        mounted.handle(CarouselInput::IndicatorClicked(0));
        mounted.handle(CarouselInput::IndicatorClicked(0));
        let changes = mounted.take_changes();
        assert_eq!(
            changes,
            vec![SlideChange { from: 0, to: 1 }, SlideChange { from: 1, to: 0 }]
        );
        assert!(mounted.take_changes().is_empty());
    }

    #[test]
    fn accessible_title_tracks_current_slide() {
        let hub = KeyboardHub::new();
        let mounted = home().mount(&hub).unwrap();
        assert_eq!(mounted.accessible_title(), "My Carousel | first");
        mounted.handle(CarouselInput::NextClicked);
        assert_eq!(mounted.accessible_title(), "My Carousel | second");

        let untitled = Home::new(
            None,
            vec![Slide::new("x.jpg", "only")],
            CarouselOptions::default(),
        );
        let mounted = untitled.mount(&hub).unwrap();
        assert_eq!(mounted.accessible_title(), "only");
    }

    #[test]
    fn empty_page_fails_to_mount() {
        let hub = KeyboardHub::new();
        let page = Home::new(None, Vec::new(), CarouselOptions::default());
        assert!(page.mount(&hub).is_err());
        assert_eq!(hub.listener_count(), 0);
    }
}
