//! Easing curves for reveal transitions

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// CSS `ease`
    pub const CSS_EASE: Self = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);

    /// Map linear progress (0.0 to 1.0) onto the curve
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (2.0 - 2.0 * t).powi(3) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => {
                let curve = Bezier::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64);
                curve.solve(t as f64) as f32
            }
        }
    }
}

/// Unit cubic bezier with fixed endpoints (0,0) and (1,1)
struct Bezier {
    x: [f64; 3],
    y: [f64; 3],
}

impl Bezier {
    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: Self::coefficients(x1, x2),
            y: Self::coefficients(y1, y2),
        }
    }

    /// Polynomial coefficients [a, b, c] of a·s³ + b·s² + c·s
    fn coefficients(p1: f64, p2: f64) -> [f64; 3] {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        [a, b, c]
    }

    fn eval(k: &[f64; 3], s: f64) -> f64 {
        ((k[0] * s + k[1]) * s + k[2]) * s
    }

    fn slope(k: &[f64; 3], s: f64) -> f64 {
        (3.0 * k[0] * s + 2.0 * k[1]) * s + k[2]
    }

    /// y for a given x, Newton first and bisection if the slope collapses
    fn solve(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }

        let mut s = x;
        for _ in 0..8 {
            let err = Self::eval(&self.x, s) - x;
            if err.abs() < 1e-7 {
                return Self::eval(&self.y, s);
            }
            let d = Self::slope(&self.x, s);
            if d.abs() < 1e-7 {
                break;
            }
            s -= err / d;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        s = x;
        for _ in 0..24 {
            let value = Self::eval(&self.x, s);
            if (value - x).abs() < 1e-7 {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        Self::eval(&self.y, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::CSS_EASE,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
        }
    }

    #[test]
    fn test_out_of_range_progress_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn test_ease_out_leads_linear() {
        assert!(Easing::EaseOut.apply(0.3) > 0.3);
        assert!(Easing::EaseIn.apply(0.3) < 0.3);
    }

    #[test]
    fn test_linear_bezier_is_identity() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!((linear.apply(t) - t).abs() < 1e-4);
        }
    }
}
