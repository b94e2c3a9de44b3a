//! Turtle-space ↔ render-space mapping, heading trigonometry and animation timing.
//!
//! Turtle-space is centred on the world with +y up. Render-space has its
//! origin in the top-left corner with +y down.

use std::time::Duration;

/// Offset applied to the heading before the sin/cos pairing in [`end_point`],
/// so that heading 0 points along +x.
const HEADING_OFFSET_DEGREES: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `target`.
    pub fn lerp(self, target: Point, t: f64) -> Point {
        Point::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }
}

pub fn to_render_space(p: Point, world_width: f64, world_height: f64) -> Point {
    Point::new(p.x + world_width / 2.0, world_height / 2.0 - p.y)
}

pub fn from_render_space(p: Point, world_width: f64, world_height: f64) -> Point {
    Point::new(p.x - world_width / 2.0, world_height / 2.0 - p.y)
}

/// Where a turtle at `start` facing `heading` degrees ends up after moving
/// `distance` units.
pub fn end_point(heading: f64, start: Point, distance: f64) -> Point {
    let radians = (HEADING_OFFSET_DEGREES - heading).to_radians();
    Point::new(
        start.x + distance * radians.sin(),
        start.y + distance * radians.cos(),
    )
}

/// Rates used to turn distances and angles into animation durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub pixels_per_speed_unit: f64,
    pub degrees_per_speed_unit: f64,
    /// Stand-in for "instant"; never zero.
    pub min_duration: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            pixels_per_speed_unit: 40.0,
            degrees_per_speed_unit: 36.0,
            min_duration: Duration::from_millis(1),
        }
    }
}

impl Pacing {
    fn scaled(&self, amount: f64, rate_per_unit: f64, speed: u8, tracer: bool) -> Duration {
        if !tracer || speed == 0 {
            return self.min_duration;
        }
        let seconds = amount.abs() / (rate_per_unit * speed as f64);
        if !seconds.is_finite() {
            return self.min_duration;
        }
        // Distances far past the world saturate instead of overflowing.
        Duration::try_from_secs_f64(seconds)
            .unwrap_or(Duration::MAX)
            .max(self.min_duration)
    }
}

pub fn motion_duration(distance: f64, speed: u8, tracer: bool, pacing: &Pacing) -> Duration {
    pacing.scaled(distance, pacing.pixels_per_speed_unit, speed, tracer)
}

/// Rotation time scales with `speed` exactly like motion does.
pub fn rotation_duration(degrees: f64, speed: u8, tracer: bool, pacing: &Pacing) -> Duration {
    pacing.scaled(degrees, pacing.degrees_per_speed_unit, speed, tracer)
}

/// Number of frames used to play an animation of `duration`; at least one.
pub fn frame_count(duration: Duration, max_framerate: f64) -> u32 {
    let frames = (duration.as_secs_f64() * max_framerate).ceil();
    if frames.is_finite() && frames >= 1.0 {
        frames.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn render_space_round_trips() {
        for p in [
            Point::ORIGIN,
            Point::new(-350.0, 350.0),
            Point::new(12.25, -99.5),
        ] {
            let there = to_render_space(p, 700.0, 500.0);
            assert_eq!(from_render_space(there, 700.0, 500.0), p);
        }
    }

    #[test]
    fn world_centre_maps_to_canvas_centre() {
        assert_eq!(
            to_render_space(Point::ORIGIN, 700.0, 700.0),
            Point::new(350.0, 350.0)
        );
        assert_eq!(
            to_render_space(Point::new(-350.0, 350.0), 700.0, 700.0),
            Point::new(0.0, 0.0)
        );
    }

    #[test]
    fn headings_follow_compass_of_unit_circle() {
        let start = Point::new(10.0, 10.0);
        assert!(approx_eq(end_point(0.0, start, 5.0), Point::new(15.0, 10.0)));
        assert!(approx_eq(end_point(90.0, start, 5.0), Point::new(10.0, 15.0)));
        assert!(approx_eq(end_point(180.0, start, 5.0), Point::new(5.0, 10.0)));
        assert!(approx_eq(end_point(270.0, start, 5.0), Point::new(10.0, 5.0)));
        assert!(approx_eq(end_point(-90.0, start, 5.0), Point::new(10.0, 5.0)));
    }

    #[test]
    fn reversed_heading_undoes_motion() {
        for heading in [0.0, 33.0, 145.5, -72.0, 721.0] {
            let start = Point::new(3.0, -4.0);
            let there = end_point(heading, start, 87.5);
            let back = end_point(heading + 180.0, there, 87.5);
            assert!(approx_eq(back, start), "heading {heading}: {back:?}");
        }
    }

    #[test]
    fn motion_duration_scales_with_speed() {
        let pacing = Pacing::default();
        assert_eq!(
            motion_duration(200.0, 5, true, &pacing),
            Duration::from_secs(1)
        );
        assert_eq!(
            motion_duration(-200.0, 10, true, &pacing),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn fastest_or_untraced_motion_is_minimal() {
        let pacing = Pacing::default();
        assert_eq!(motion_duration(500.0, 0, true, &pacing), pacing.min_duration);
        assert_eq!(motion_duration(500.0, 7, false, &pacing), pacing.min_duration);
        assert_eq!(motion_duration(0.0, 7, true, &pacing), pacing.min_duration);
    }

    #[test]
    fn rotation_duration_scales_with_speed() {
        let pacing = Pacing::default();
        assert_eq!(
            rotation_duration(180.0, 5, true, &pacing),
            Duration::from_secs(1)
        );
        assert_eq!(rotation_duration(90.0, 0, true, &pacing), pacing.min_duration);
        assert_eq!(rotation_duration(90.0, 5, false, &pacing), pacing.min_duration);
    }

    #[test]
    fn huge_finite_distances_saturate() {
        let pacing = Pacing::default();
        assert_eq!(motion_duration(1e22, 5, true, &pacing), Duration::MAX);
        let far = Point::new(1e300, 0.0);
        assert_eq!(
            motion_duration(Point::ORIGIN.distance(far), 5, true, &pacing),
            Duration::MAX
        );
        assert_eq!(rotation_duration(-1e300, 1, true, &pacing), Duration::MAX);
        assert_eq!(frame_count(Duration::MAX, 60.0), u32::MAX);
    }

    #[test]
    fn frame_count_is_at_least_one() {
        assert_eq!(frame_count(Duration::from_millis(1), 60.0), 1);
        assert_eq!(frame_count(Duration::ZERO, 60.0), 1);
        assert_eq!(frame_count(Duration::from_secs(1), 60.0), 60);
        assert_eq!(frame_count(Duration::from_millis(1010), 60.0), 61);
    }
}
