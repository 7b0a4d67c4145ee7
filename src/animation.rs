use std::time::{Duration, Instant};

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` timing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl CubicBezier {
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    /// The `ease-in-out` curve of the page stylesheet.
    pub const EASE_IN_OUT: Self = Self::new(0.4, 0.0, 0.2, 1.0);

    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn coefficients(a1: f32, a2: f32) -> (f32, f32, f32) {
        let c = 3.0 * a1;
        let b = 3.0 * (a2 - a1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    fn sample(a1: f32, a2: f32, s: f32) -> f32 {
        let (a, b, c) = Self::coefficients(a1, a2);
        ((a * s + b) * s + c) * s
    }

    fn sample_derivative(a1: f32, a2: f32, s: f32) -> f32 {
        let (a, b, c) = Self::coefficients(a1, a2);
        (3.0 * a * s + 2.0 * b) * s + c
    }

    /// Curve parameter whose x equals `x`.
    fn solve_x(&self, x: f32) -> f32 {
        let mut s = x;
        for _ in 0..8 {
            let err = Self::sample(self.x1, self.x2, s) - x;
            if err.abs() < 1e-6 {
                return s;
            }
            let d = Self::sample_derivative(self.x1, self.x2, s);
            if d.abs() < 1e-6 {
                break;
            }
            s -= err / d;
        }
        // newton stalled; bisect
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = x;
        while hi - lo > 1e-6 {
            if Self::sample(self.x1, self.x2, s) < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }

    /// Eased progress for linear progress `t` in `0..=1`.
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        Self::sample(self.y1, self.y2, self.solve_x(t))
    }
}

/// A value animated from where it currently is towards a target.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    started: Instant,
    duration: Duration,
    curve: CubicBezier,
}

impl Tween {
    /// A tween resting at `value`.
    pub fn settled(value: f32, duration: Duration, curve: CubicBezier, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            started: now,
            duration,
            curve,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let eased = self.curve.ease(self.progress(now));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.from != self.to && self.progress(now) < 1.0
    }

    /// Head for `to`, starting from the value shown at `now`.
    pub fn retarget(&mut self, to: f32, now: Instant) {
        if to == self.to {
            return;
        }
        self.from = self.value_at(now);
        self.to = to;
        self.started = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_endpoints_are_fixed() {
        for curve in [CubicBezier::LINEAR, CubicBezier::EASE_IN_OUT] {
            assert_eq!(curve.ease(0.0), 0.0);
            assert_eq!(curve.ease(1.0), 1.0);
            assert_eq!(curve.ease(-3.0), 0.0);
            assert_eq!(curve.ease(7.0), 1.0);
        }
    }

    #[test]
    fn linear_is_identity() {
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((CubicBezier::LINEAR.ease(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn ease_in_out_is_monotonic_and_slow_at_start() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = CubicBezier::EASE_IN_OUT.ease(i as f32 / 100.0);
            assert!(v >= prev - 1e-5, "not monotonic at {i}");
            prev = v;
        }
        assert!(CubicBezier::EASE_IN_OUT.ease(0.1) < 0.1);
        assert!(CubicBezier::EASE_IN_OUT.ease(0.9) > 0.9);
    }

    #[test]
    fn tween_reaches_target_after_duration() {
        let t0 = Instant::now();
        let mut tween = Tween::settled(
            0.0,
            Duration::from_millis(500),
            CubicBezier::EASE_IN_OUT,
            t0,
        );
        assert!(!tween.is_running(t0));
        tween.retarget(2.0, t0);
        assert!(tween.is_running(t0 + Duration::from_millis(250)));
        let mid = tween.value_at(t0 + Duration::from_millis(250));
        assert!(mid > 0.0 && mid < 2.0);
        assert_eq!(tween.value_at(t0 + Duration::from_millis(500)), 2.0);
        assert!(!tween.is_running(t0 + Duration::from_millis(600)));
    }

    #[test]
    fn retarget_continues_from_shown_value() {
        let t0 = Instant::now();
        let mut tween = Tween::settled(0.0, Duration::from_millis(100), CubicBezier::LINEAR, t0);
        tween.retarget(1.0, t0);
        let t1 = t0 + Duration::from_millis(50);
        let shown = tween.value_at(t1);
        tween.retarget(0.0, t1);
        assert!((tween.value_at(t1) - shown).abs() < 1e-4);
        assert_eq!(tween.target(), 0.0);
        assert_eq!(tween.value_at(t1 + Duration::from_millis(100)), 0.0);
    }

    #[test]
    fn zero_duration_jumps() {
        let t0 = Instant::now();
        let mut tween = Tween::settled(1.0, Duration::ZERO, CubicBezier::EASE_IN_OUT, t0);
        tween.retarget(3.0, t0);
        assert_eq!(tween.value_at(t0), 3.0);
        assert!(!tween.is_running(t0));
    }
}
