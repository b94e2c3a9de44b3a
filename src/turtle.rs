use std::time::Duration;

use tracing::{debug, warn};

use crate::animation::{AnimationDescriptor, AnimationKind, ColorTarget, Sequencer};
use crate::color::{ColorInput, ColorMode, Rgb};
use crate::config::TurtleConfig;
use crate::error::TurtleError;
use crate::state::{clamp_speed, TurtleState};
use crate::surface::{RecordingSurface, RenderSurface, SurfaceLog};
use crate::transform::{end_point, motion_duration, rotation_duration, Pacing, Point};

/// A turtle bound to one render surface.
///
/// Every command updates the logical [`TurtleState`] first, then queues the
/// matching animation and returns once that animation has been played (or the
/// wait for it has timed out). Commands issued from one `Turtle` are therefore
/// drawn strictly in program order.
///
/// ```
/// use turtle::{RecordingSurface, Turtle, TurtleConfig};
///
/// # fn main() -> Result<(), turtle::TurtleError> {
/// let (surface, log) = RecordingSurface::new();
/// let mut turtle = Turtle::new(TurtleConfig::default(), surface)?;
/// turtle.set_tracer(false);
/// turtle.set_pen_color("purple")?;
/// for _ in 0..4 {
///     turtle.forward(100.0)?;
///     turtle.left(90.0)?;
/// }
/// assert_eq!(log.visible_segments().len(), 4);
/// # Ok(())
/// # }
/// ```
pub struct Turtle {
    state: TurtleState,
    config: TurtleConfig,
    pacing: Pacing,
    sequencer: Sequencer,
}

impl Turtle {
    pub fn new<S>(config: TurtleConfig, surface: S) -> Result<Self, TurtleError>
    where
        S: RenderSurface + 'static,
    {
        let sequencer = Sequencer::spawn(surface, &config)?;
        Ok(Self {
            state: TurtleState::new(config.initial_speed),
            pacing: config.pacing(),
            config,
            sequencer,
        })
    }

    /// A turtle drawing onto a [`RecordingSurface`].
    pub fn headless(config: TurtleConfig) -> Result<(Self, SurfaceLog), TurtleError> {
        let (surface, log) = RecordingSurface::new();
        Ok((Self::new(config, surface)?, log))
    }

    pub fn state(&self) -> &TurtleState {
        &self.state
    }

    pub fn position(&self) -> Point {
        self.state.position()
    }

    pub fn heading(&self) -> f64 {
        self.state.heading()
    }

    pub fn is_pen_down(&self) -> bool {
        self.state.is_pen_down()
    }

    pub fn pen_color(&self) -> Rgb {
        self.state.pen_color()
    }

    pub fn fill_color(&self) -> Rgb {
        self.state.fill_color()
    }

    pub fn pen_width(&self) -> u32 {
        self.state.pen_width()
    }

    pub fn speed(&self) -> u8 {
        self.state.speed()
    }

    pub fn is_tracing(&self) -> bool {
        self.state.is_tracing()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.state.color_mode()
    }

    pub fn is_filling(&self) -> bool {
        self.state.is_filling()
    }

    // ========================================================================
    // MOTION
    // ========================================================================

    pub fn forward(&mut self, distance: f64) -> Result<(), TurtleError> {
        let distance = ensure_finite("distance", distance)?;
        let to = end_point(self.state.heading, self.state.position, distance);
        self.move_to(to, distance)
    }

    pub fn backward(&mut self, distance: f64) -> Result<(), TurtleError> {
        let distance = ensure_finite("distance", distance)?;
        let to = end_point(self.state.heading + 180.0, self.state.position, distance);
        self.move_to(to, distance)
    }

    /// Turns counter-clockwise.
    pub fn left(&mut self, degrees: f64) -> Result<(), TurtleError> {
        let degrees = ensure_finite("degrees", degrees)?;
        self.turn(degrees)
    }

    /// Turns clockwise.
    pub fn right(&mut self, degrees: f64) -> Result<(), TurtleError> {
        let degrees = ensure_finite("degrees", degrees)?;
        self.turn(-degrees)
    }

    pub fn go_to(&mut self, x: f64, y: f64) -> Result<(), TurtleError> {
        self.set_position(x, y)
    }

    /// Moves straight to `(x, y)` in turtle-space without changing heading.
    pub fn set_position(&mut self, x: f64, y: f64) -> Result<(), TurtleError> {
        let to = Point::new(ensure_finite("x", x)?, ensure_finite("y", y)?);
        let distance = self.state.position.distance(to);
        self.move_to(to, distance)
    }

    pub fn set_x(&mut self, x: f64) -> Result<(), TurtleError> {
        self.set_position(x, self.state.position.y)
    }

    pub fn set_y(&mut self, y: f64) -> Result<(), TurtleError> {
        self.set_position(self.state.position.x, y)
    }

    fn move_to(&mut self, to: Point, distance: f64) -> Result<(), TurtleError> {
        let from = self.state.position;
        self.state.move_to(to);

        let duration = motion_duration(distance, self.state.speed, self.state.tracer, &self.pacing);
        self.play(
            AnimationKind::Move {
                from,
                to,
                heading: self.state.heading,
                pen_color: self.state.pen_color,
                pen_width: self.state.pen_width,
                drawn: self.state.pen_down,
            },
            duration,
        )
    }

    fn turn(&mut self, delta: f64) -> Result<(), TurtleError> {
        let from_angle = self.state.heading;
        self.state.turn(delta);

        let duration = rotation_duration(delta, self.state.speed, self.state.tracer, &self.pacing);
        self.play(
            AnimationKind::Rotate {
                from_angle,
                to_angle: self.state.heading,
            },
            duration,
        )
    }

    // ========================================================================
    // PEN
    // ========================================================================

    pub fn pen_up(&mut self) {
        self.state.pen_down = false;
    }

    pub fn pen_down(&mut self) {
        self.state.pen_down = true;
    }

    /// Sets the pen color from channels (under the current color mode), a
    /// color name, or an already resolved [`Rgb`].
    pub fn set_pen_color<'a>(&mut self, color: impl Into<ColorInput<'a>>) -> Result<(), TurtleError> {
        let color = color.into().resolve(self.state.color_mode)?;
        self.state.pen_color = color;
        self.recolor(ColorTarget::Pen, color)
    }

    pub fn set_fill_color<'a>(&mut self, color: impl Into<ColorInput<'a>>) -> Result<(), TurtleError> {
        let color = color.into().resolve(self.state.color_mode)?;
        self.state.fill_color = color;
        self.recolor(ColorTarget::Fill, color)
    }

    pub fn set_background_color<'a>(
        &mut self,
        color: impl Into<ColorInput<'a>>,
    ) -> Result<(), TurtleError> {
        let color = color.into().resolve(self.state.color_mode)?;
        self.recolor(ColorTarget::Background, color)
    }

    fn recolor(&mut self, target: ColorTarget, color: Rgb) -> Result<(), TurtleError> {
        self.play(
            AnimationKind::Recolor { target, color },
            self.pacing.min_duration,
        )
    }

    pub fn set_width(&mut self, width: i32) -> Result<(), TurtleError> {
        if width < 0 {
            return Err(TurtleError::invalid(format!(
                "pen width must be non-negative, got {width}"
            )));
        }
        self.state.pen_width = width as u32;
        Ok(())
    }

    pub fn set_pen_size(&mut self, width: i32) -> Result<(), TurtleError> {
        self.set_width(width)
    }

    // ========================================================================
    // PLAYBACK SETTINGS
    // ========================================================================

    /// Clamps into `0..=10`; 0 is instantaneous.
    pub fn set_speed(&mut self, speed: i32) {
        self.state.speed = clamp_speed(speed);
    }

    /// Accepts 1.0 or 255.0. Any other value leaves the mode unchanged.
    pub fn set_color_mode(&mut self, mode: f64) {
        match ColorMode::from_scale(mode) {
            Some(color_mode) => self.state.color_mode = color_mode,
            None => warn!(mode, "ignoring color mode other than 1.0 or 255.0"),
        }
    }

    pub fn set_tracer(&mut self, enabled: bool) {
        self.state.tracer = enabled;
    }

    // ========================================================================
    // FILLS
    // ========================================================================

    /// Starts collecting the vertices of subsequent motions.
    pub fn begin_fill(&mut self) {
        if self.state.fill_path.is_some() {
            debug!("begin_fill while already filling; restarting path");
        }
        self.state.fill_path = Some(vec![self.state.position]);
    }

    /// Fills the polygon traced since [`begin_fill`](Self::begin_fill) with
    /// the current fill color.
    pub fn end_fill(&mut self) -> Result<(), TurtleError> {
        let Some(vertices) = self.state.fill_path.take() else {
            warn!("end_fill called without begin_fill");
            return Ok(());
        };
        if vertices.len() < 3 {
            debug!(vertices = vertices.len(), "fill path too short to enclose an area");
            return Ok(());
        }

        let color = self.state.fill_color;
        self.play(AnimationKind::Fill { vertices, color }, self.pacing.min_duration)
    }

    fn play(&mut self, kind: AnimationKind, duration: Duration) -> Result<(), TurtleError> {
        self.sequencer.play(
            AnimationDescriptor::new(kind, duration),
            self.config.completion_grace,
        )
    }
}

fn ensure_finite(what: &str, value: f64) -> Result<f64, TurtleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TurtleError::invalid(format!("{what} must be finite, got {value}")))
    }
}
