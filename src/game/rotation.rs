//! Centrifuge platform rotation

/// Advances the centrifuge angle at a constant angular rate
pub struct RotationUpdater;

impl RotationUpdater {
    /// Add `rate_rpm` worth of rotation over `elapsed_ms` and wrap into `[0, 360)`.
    pub fn advance(angle: &mut f32, elapsed_ms: f32, rate_rpm: f32) {
        let deg_per_sec = rate_rpm * 6.0;
        *angle = wrap_degrees(*angle + deg_per_sec * elapsed_ms / 1000.0);
    }
}

/// Floor modulo, so negative input still lands in `[0, 360)`
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_rpm_conversion() {
        let mut angle = 0.0;
        // 1 rpm = 6 deg/s
        RotationUpdater::advance(&mut angle, 1_000.0, 1.0);
        assert!(approx(angle, 6.0));
    }

    #[test]
    fn test_wraps_past_full_turn() {
        let mut angle = 350.0;
        // 20 degrees at 10 rpm (60 deg/s) takes 1/3 s
        RotationUpdater::advance(&mut angle, 1_000.0 / 3.0, 10.0);
        assert!(approx(angle, 10.0));
    }

    #[test]
    fn test_wraps_multiple_revolutions() {
        for turns in 1..5 {
            let mut angle = 350.0;
            let degrees = 20.0 + 360.0 * turns as f32;
            RotationUpdater::advance(&mut angle, degrees / 60.0 * 1_000.0, 10.0);
            assert!(approx(angle, 10.0), "turns={turns} angle={angle}");
        }
    }

    #[test]
    fn test_negative_rate_stays_in_range() {
        let mut angle = 5.0;
        RotationUpdater::advance(&mut angle, 1_000.0, -5.0);
        assert!(approx(angle, 335.0));
        assert!((0.0..360.0).contains(&angle));
    }

    #[test]
    fn test_many_small_ticks_stay_in_range() {
        let mut angle = 0.0;
        for _ in 0..10_000 {
            RotationUpdater::advance(&mut angle, 16.0, 3.0);
            assert!((0.0..360.0).contains(&angle));
        }
    }

    #[test]
    fn test_wrap_tiny_negative() {
        let wrapped = wrap_degrees(-1e-9);
        assert!((0.0..360.0).contains(&wrapped));
    }
}
