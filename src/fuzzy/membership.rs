//! Piecewise-linear membership functions

use serde::Serialize;

use super::{approx_eq, EPSILON};
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};

/// A membership degree in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    /// True when the degree is exactly zero
    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }
}

/// A membership curve given by `(x, μ)` control points
///
/// Points are sorted by `x` and every `μ` is clamped to [0, 1] on
/// construction. Outside the first and last point the curve extends flat,
/// so a term like `cold = [(0, 1), (10, 0)]` stays fully true below 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipFunction {
    points: Vec<(f64, f64)>,
}

impl MembershipFunction {
    /// Build a curve from control points in any order
    ///
    /// Fails with [`ErrorCode::TooFewPoints`] for fewer than two points and
    /// [`ErrorCode::InvalidPoint`] for non-finite coordinates.
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> FuzzyResult<Self> {
        let mut points: Vec<(f64, f64)> = points.into_iter().collect();

        if points.len() < 2 {
            return Err(FuzzyError::new(
                ErrorCode::TooFewPoints,
                format!("{} control point(s) given, at least 2 required", points.len()),
            ));
        }

        for (index, &(x, mu)) in points.iter().enumerate() {
            if !x.is_finite() || !mu.is_finite() {
                return Err(FuzzyError::new(
                    ErrorCode::InvalidPoint,
                    format!("point #{} ({}, {}) is not a pair of finite numbers", index, x, mu),
                )
                .with_context("point_index", index.to_string()));
            }
        }

        for point in points.iter_mut() {
            point.1 = point.1.clamp(0.0, 1.0);
        }
        // Stable, so points sharing an x keep their given order (vertical steps).
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Self { points })
    }

    /// The sorted, clamped control points
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// `(min x, max x)` over the control points
    pub fn domain(&self) -> (f64, f64) {
        let first = self.points[0].0;
        let last = self.points[self.points.len() - 1].0;
        (first, last)
    }

    /// Membership degree at `x`
    pub fn degree(&self, x: f64) -> f64 {
        let (first_x, first_mu) = self.points[0];
        let (last_x, last_mu) = self.points[self.points.len() - 1];

        if x.is_nan() {
            return 0.0;
        }
        if x <= first_x {
            return first_mu;
        }
        if x >= last_x {
            return last_mu;
        }

        for pair in self.points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];
            if x < x1 || x > x2 {
                continue;
            }
            if x == x2 {
                return y2;
            }
            if approx_eq(x1, x2) {
                return y1.max(y2);
            }
            let t = (x - x1) / (x2 - x1);
            return (y1 + t * (y2 - y1)).clamp(0.0, 1.0);
        }

        0.0
    }

    /// Smallest `x` with `degree(x) >= level`, or `None` if the curve never
    /// gets that high
    pub fn leftmost_at_level(&self, level: f64) -> Option<f64> {
        if level.is_nan() {
            return None;
        }
        let level = level.clamp(0.0, 1.0);

        let (first_x, first_mu) = self.points[0];
        if first_mu >= level - EPSILON {
            return Some(first_x);
        }

        for pair in self.points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];

            if y1 < level - EPSILON && y2 >= level - EPSILON {
                if approx_eq(y1, y2) {
                    continue;
                }
                let t = ((level - y1) / (y2 - y1)).clamp(0.0, 1.0);
                return Some(x1 + t * (x2 - x1));
            }

            if approx_eq(y1, level) && approx_eq(y2, level) {
                return Some(x1);
            }
        }

        None
    }

    /// Leftmost `x` where the curve sits exactly at `level`
    ///
    /// Walks the curve left to right and solves the first segment whose
    /// membership passes through `level`, rising or falling. A curve that
    /// stays above `level` everywhere has no such crossing and falls back to
    /// [`leftmost_at_level`](Self::leftmost_at_level); one that stays below
    /// yields `None`.
    pub fn leftmost_reaching(&self, level: f64) -> Option<f64> {
        if level.is_nan() {
            return None;
        }
        let level = level.clamp(0.0, 1.0);

        let (first_x, first_mu) = self.points[0];
        if approx_eq(first_mu, level) {
            return Some(first_x);
        }

        for pair in self.points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];

            let low = y1.min(y2) - EPSILON;
            let high = y1.max(y2) + EPSILON;
            if level < low || level > high {
                continue;
            }
            if approx_eq(y1, y2) {
                return Some(x1);
            }
            let t = ((level - y1) / (y2 - y1)).clamp(0.0, 1.0);
            return Some(x1 + t * (x2 - x1));
        }

        self.leftmost_at_level(level)
    }

    /// Highest membership on the curve
    pub fn height(&self) -> f64 {
        self.points.iter().map(|&(_, mu)| mu).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mf(points: &[(f64, f64)]) -> MembershipFunction {
        MembershipFunction::new(points.iter().copied()).unwrap()
    }

    #[test]
    fn test_fuzzy_value_clamps() {
        assert_eq!(FuzzyValue::new(1.5).value(), 1.0);
        assert_eq!(FuzzyValue::new(-0.5).value(), 0.0);
        assert!(FuzzyValue::new(0.0).is_zero());
    }

    #[test]
    fn test_fuzzy_value_or_is_max() {
        let a = FuzzyValue::new(0.3);
        let b = FuzzyValue::new(0.7);
        assert_eq!(a.or(&b).value(), 0.7);
        assert_eq!(b.or(&a).value(), 0.7);
    }

    #[test]
    fn test_construction_sorts_and_clamps() {
        let f = mf(&[(10.0, -0.5), (0.0, 1.7), (5.0, 0.5)]);
        assert_eq!(f.points(), &[(0.0, 1.0), (5.0, 0.5), (10.0, 0.0)]);
        assert_eq!(f.domain(), (0.0, 10.0));
    }

    #[test]
    fn test_too_few_points() {
        let err = MembershipFunction::new(vec![(1.0, 1.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooFewPoints);

        let err = MembershipFunction::new(Vec::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooFewPoints);
        assert!(err.context.is_none());
        assert_eq!(err.to_string(), "[1004] 0 control point(s) given, at least 2 required");
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let err = MembershipFunction::new(vec![(0.0, 1.0), (f64::NAN, 0.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPoint);
        assert_eq!(err.context_field("point_index"), Some("1"));

        let err = MembershipFunction::new(vec![(0.0, f64::INFINITY), (1.0, 0.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPoint);
    }

    #[test]
    fn test_degree_interpolates() {
        let cold = mf(&[(0.0, 1.0), (10.0, 0.0)]);
        assert!((cold.degree(2.0) - 0.8).abs() < 1e-12);
        assert!((cold.degree(5.0) - 0.5).abs() < 1e-12);

        let tri = mf(&[(0.0, 0.0), (5.0, 1.0), (10.0, 0.0)]);
        assert!((tri.degree(2.5) - 0.5).abs() < 1e-12);
        assert!((tri.degree(7.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degree_flat_extrapolation() {
        let cold = mf(&[(0.0, 1.0), (10.0, 0.0)]);
        assert_eq!(cold.degree(-100.0), 1.0);
        assert_eq!(cold.degree(100.0), 0.0);

        let hot = mf(&[(10.0, 0.0), (20.0, 1.0)]);
        assert_eq!(hot.degree(0.0), 0.0);
        assert_eq!(hot.degree(1e9), 1.0);
    }

    #[test]
    fn test_degree_exact_at_control_points() {
        let f = mf(&[(0.0, 0.1), (3.0, 0.7), (7.0, 0.3), (9.0, 0.9)]);
        for &(x, mu) in f.points() {
            assert_eq!(f.degree(x), mu);
        }
    }

    #[test]
    fn test_degree_always_in_unit_interval() {
        let f = mf(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.2), (4.0, 0.6), (6.0, 0.0)]);
        let mut x = -5.0;
        while x <= 10.0 {
            let d = f.degree(x);
            assert!((0.0..=1.0).contains(&d), "degree({}) = {}", x, d);
            x += 0.05;
        }
        assert_eq!(f.degree(f64::NAN), 0.0);
    }

    #[test]
    fn test_degree_degenerate_segment_takes_max() {
        // Two points closer than EPSILON straddling x.
        let f = mf(&[(0.0, 0.0), (1.0, 0.2), (1.0 + 1e-13, 0.9), (2.0, 0.9)]);
        assert_eq!(f.degree(1.0 + 5e-14), 0.9);
    }

    #[test]
    fn test_leftmost_at_level_rising() {
        let hot = mf(&[(10.0, 0.0), (20.0, 1.0)]);
        assert!((hot.leftmost_at_level(0.5).unwrap() - 15.0).abs() < 1e-9);
        assert!((hot.leftmost_at_level(1.0).unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(hot.leftmost_at_level(0.0), Some(10.0));
    }

    #[test]
    fn test_leftmost_at_level_first_point_meets_level() {
        let low = mf(&[(0.0, 1.0), (5.0, 0.0)]);
        assert_eq!(low.leftmost_at_level(0.8), Some(0.0));
    }

    #[test]
    fn test_leftmost_at_level_plateau() {
        let f = mf(&[(0.0, 0.0), (2.0, 0.5), (6.0, 0.5), (8.0, 0.0)]);
        assert!((f.leftmost_at_level(0.5).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(f.leftmost_at_level(0.6), None);
    }

    #[test]
    fn test_leftmost_at_level_clamps_level() {
        let hot = mf(&[(10.0, 0.0), (20.0, 1.0)]);
        assert_eq!(hot.leftmost_at_level(1.5), hot.leftmost_at_level(1.0));
        assert_eq!(hot.leftmost_at_level(-1.0), Some(10.0));
    }

    #[test]
    fn test_leftmost_at_level_unattainable() {
        let weak = mf(&[(0.0, 0.0), (5.0, 0.4), (10.0, 0.0)]);
        assert_eq!(weak.leftmost_at_level(0.5), None);
    }

    #[test]
    fn test_leftmost_at_level_monotonic() {
        let f = mf(&[(0.0, 0.0), (2.0, 0.3), (5.0, 0.9), (7.0, 1.0), (9.0, 1.0)]);
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=20 {
            let level = step as f64 / 20.0;
            let x = f.leftmost_at_level(level).unwrap();
            assert!(x >= previous, "level {} gave {} < {}", level, x, previous);
            previous = x;
        }
    }

    #[test]
    fn test_leftmost_reaching_falling_curve() {
        let low = mf(&[(0.0, 1.0), (5.0, 0.0)]);
        assert!((low.leftmost_reaching(0.8).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(low.leftmost_reaching(1.0), Some(0.0));
    }

    #[test]
    fn test_leftmost_reaching_matches_leftmost_on_rising_curve() {
        let hot = mf(&[(10.0, 0.0), (20.0, 1.0)]);
        for &level in &[0.1, 0.25, 0.5, 0.9, 1.0] {
            let a = hot.leftmost_reaching(level).unwrap();
            let b = hot.leftmost_at_level(level).unwrap();
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_leftmost_reaching_vertical_step() {
        let step = mf(&[(0.0, 0.0), (5.0, 0.0), (5.0, 1.0), (10.0, 1.0)]);
        assert!((step.leftmost_reaching(0.6).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_leftmost_reaching_fallbacks() {
        let high = mf(&[(0.0, 0.9), (4.0, 1.0)]);
        assert_eq!(high.leftmost_reaching(0.5), Some(0.0));

        let weak = mf(&[(0.0, 0.0), (5.0, 0.4), (10.0, 0.0)]);
        assert_eq!(weak.leftmost_reaching(0.5), None);
    }

    #[test]
    fn test_height() {
        let weak = mf(&[(0.0, 0.0), (5.0, 0.4), (10.0, 0.0)]);
        assert_eq!(weak.height(), 0.4);
    }
}
