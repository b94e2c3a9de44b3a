use crate::color::{ColorMode, Rgb};
use crate::transform::Point;

pub const MAX_SPEED: u8 = 10;

/// The authoritative logical state of the turtle.
///
/// Commands update this synchronously; it never waits on the animation that
/// visualizes the change.
#[derive(Debug, Clone, PartialEq)]
pub struct TurtleState {
    pub(crate) position: Point,
    pub(crate) heading: f64,
    // Rounding error left over from the last turn; `heading + heading_error`
    // is the exact sum of every turn applied.
    pub(crate) heading_error: f64,
    pub(crate) pen_down: bool,
    pub(crate) pen_color: Rgb,
    pub(crate) fill_color: Rgb,
    pub(crate) pen_width: u32,
    pub(crate) speed: u8,
    pub(crate) tracer: bool,
    pub(crate) color_mode: ColorMode,
    pub(crate) fill_path: Option<Vec<Point>>,
}

impl TurtleState {
    /// Centre of the world, facing +x, pen down and black.
    pub fn new(speed: u8) -> Self {
        Self {
            position: Point::ORIGIN,
            heading: 0.0,
            heading_error: 0.0,
            pen_down: true,
            pen_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            pen_width: 1,
            speed: speed.min(MAX_SPEED),
            tracer: true,
            color_mode: ColorMode::Unit,
            fill_path: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Heading in degrees, normalized to `[0, 360)`.
    pub fn heading(&self) -> f64 {
        let normalized = self.heading.rem_euclid(360.0);
        // rem_euclid can round up to the modulus for tiny negative inputs
        if normalized >= 360.0 {
            0.0
        } else {
            normalized
        }
    }

    /// Heading exactly as accumulated by turns, without normalization.
    pub fn raw_heading(&self) -> f64 {
        self.heading
    }

    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    pub fn pen_color(&self) -> Rgb {
        self.pen_color
    }

    pub fn fill_color(&self) -> Rgb {
        self.fill_color
    }

    pub fn pen_width(&self) -> u32 {
        self.pen_width
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_tracing(&self) -> bool {
        self.tracer
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn is_filling(&self) -> bool {
        self.fill_path.is_some()
    }

    /// Adds `delta` degrees with a compensated sum, so that turning by `a`
    /// and then by `-a` lands back on exactly the same heading.
    pub(crate) fn turn(&mut self, delta: f64) {
        let (sum, error) = two_sum(self.heading, delta);
        let (heading, heading_error) = two_sum(sum, error + self.heading_error);
        self.heading = heading;
        self.heading_error = heading_error;
    }

    /// Moves to `to`, recording the vertex if a fill is in progress.
    pub(crate) fn move_to(&mut self, to: Point) {
        self.position = to;
        if let Some(path) = self.fill_path.as_mut() {
            path.push(to);
        }
    }
}

/// Knuth's error-free addition: `a + b == sum + error` exactly.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let sum = a + b;
    let b_virtual = sum - a;
    let a_virtual = sum - b_virtual;
    let error = (a - a_virtual) + (b - b_virtual);
    (sum, error)
}

/// Two-sided clamp of a requested speed into `0..=MAX_SPEED`.
pub fn clamp_speed(requested: i32) -> u8 {
    requested.clamp(0, MAX_SPEED as i32) as u8
}
