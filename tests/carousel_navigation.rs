use rust_carousel::carousel::CarouselOptions;
use rust_carousel::events::{CarouselInput, NavKey, SlideChange};
use rust_carousel::home::Home;
use rust_carousel::keyboard::KeyboardHub;
use rust_carousel::slide::Slide;

fn three_slides() -> Home {
    Home::new(
        Some("My Carousel".to_string()),
        vec![
            Slide::new("/img/1.jpg", "Slide 1"),
            Slide::new("/img/2.jpg", "Slide 2"),
            Slide::new("/img/3.jpg", "Slide 3"),
        ],
        CarouselOptions::default(),
    )
}

fn current(home: &rust_carousel::home::MountedCarousel) -> usize {
    home.carousel().current_index()
}

#[test]
fn arrow_keys_walk_and_wrap() {
    let hub = KeyboardHub::new();
    let mounted = three_slides().mount(&hub).unwrap();
    for expected in [1, 2, 0] {
        hub.dispatch(NavKey::ArrowRight);
        assert_eq!(current(&mounted), expected);
    }
    hub.dispatch(NavKey::ArrowLeft);
    assert_eq!(current(&mounted), 2);
    hub.dispatch(NavKey::Other);
    assert_eq!(current(&mounted), 2);
}

#[test]
fn buttons_and_indicators() {
    let hub = KeyboardHub::new();
    let mounted = three_slides().mount(&hub).unwrap();
    mounted.handle(CarouselInput::PrevClicked);
    assert_eq!(current(&mounted), 2);
    mounted.handle(CarouselInput::NextClicked);
    assert_eq!(current(&mounted), 0);
    assert_eq!(
        mounted.handle(CarouselInput::IndicatorClicked(1)),
        Some(SlideChange { from: 0, to: 1 })
    );
    assert_eq!(mounted.handle(CarouselInput::IndicatorClicked(1)), None);
}

#[test]
fn swipe_gestures_respect_threshold() {
    let hub = KeyboardHub::new();
    let mounted = three_slides().mount(&hub).unwrap();
    let swipe = |from: f32, to: f32| {
        mounted.handle(CarouselInput::TouchStart { id: 1, x: from });
        mounted.handle(CarouselInput::TouchMove { id: 1, x: to });
        mounted.handle(CarouselInput::TouchEnd { id: 1 })
    };
    // 100 px to the left: next
    assert_eq!(swipe(300.0, 200.0), Some(SlideChange { from: 0, to: 1 }));
    // exactly the threshold is not enough
    assert_eq!(swipe(300.0, 225.0), None);
    // 100 px to the right: previous
    assert_eq!(swipe(200.0, 300.0), Some(SlideChange { from: 1, to: 0 }));
    // a plain tap right after a swipe
    mounted.handle(CarouselInput::TouchStart { id: 2, x: 50.0 });
    assert_eq!(mounted.handle(CarouselInput::TouchEnd { id: 2 }), None);
    assert_eq!(current(&mounted), 0);
}

#[test]
fn custom_threshold_applies() {
    let home = Home::new(
        None,
        vec![Slide::new("a.jpg", "a"), Slide::new("b.jpg", "b")],
        CarouselOptions {
            swipe_threshold: 20.0,
            ..CarouselOptions::default()
        },
    );
    let hub = KeyboardHub::new();
    let mounted = home.mount(&hub).unwrap();
    mounted.handle(CarouselInput::TouchStart { id: 7, x: 100.0 });
    mounted.handle(CarouselInput::TouchMove { id: 7, x: 70.0 });
    assert!(mounted.handle(CarouselInput::TouchEnd { id: 7 }).is_some());
    assert_eq!(current(&mounted), 1);
}

#[test]
fn unmount_detaches_keyboard() {
    let hub = KeyboardHub::new();
    let mounted = three_slides().mount(&hub).unwrap();
    assert_eq!(hub.listener_count(), 1);
    drop(mounted);
    assert_eq!(hub.listener_count(), 0);
    assert_eq!(hub.dispatch(NavKey::ArrowRight), 0);
}

#[test]
fn two_mounted_carousels_both_listen() {
    let hub = KeyboardHub::new();
    let a = three_slides().mount(&hub).unwrap();
    let b = three_slides().mount(&hub).unwrap();
    assert_eq!(hub.dispatch(NavKey::ArrowRight), 2);
    assert_eq!((current(&a), current(&b)), (1, 1));
    drop(a);
    assert_eq!(hub.dispatch(NavKey::ArrowRight), 1);
    assert_eq!(current(&b), 2);
}

#[test]
fn change_log_feeds_the_window_title() {
    let hub = KeyboardHub::new();
    let mounted = three_slides().mount(&hub).unwrap();
    hub.dispatch(NavKey::ArrowLeft);
    let changes = mounted.take_changes();
    assert_eq!(changes, vec![SlideChange { from: 0, to: 2 }]);
    assert_eq!(mounted.accessible_title(), "My Carousel | Slide 3");
}
