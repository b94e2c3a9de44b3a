use std::time::Duration;

use bon::Builder;

use crate::color::Rgb;
use crate::transform::Pacing;

/// Engine and window settings.
///
/// ```
/// use turtle::TurtleConfig;
///
/// let config = TurtleConfig::builder()
///     .title("H-Tree".to_string())
///     .world_width(900.0)
///     .build();
/// assert_eq!(config.world_height, 700.0);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct TurtleConfig {
    #[builder(default = "Turtle".to_string())]
    pub title: String,

    // World size in pixels; turtle-space spans ±width/2, ±height/2.
    #[builder(default = 700.0)]
    pub world_width: f64,
    #[builder(default = 700.0)]
    pub world_height: f64,
    #[builder(default = Rgb::WHITE)]
    pub background: Rgb,

    // Motion pacing
    #[builder(default = 5)]
    pub initial_speed: u8,
    #[builder(default = 40.0)]
    pub pixels_per_speed_unit: f64,
    #[builder(default = 36.0)]
    pub degrees_per_speed_unit: f64,
    #[builder(default = Duration::from_millis(1))]
    pub min_duration: Duration,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Waits
    /// Slack added to an animation's duration before a command gives up on it.
    #[builder(default = Duration::from_secs(5))]
    pub completion_grace: Duration,
    #[builder(default = Duration::from_secs(10))]
    pub open_timeout: Duration,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TurtleConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            pixels_per_speed_unit: self.pixels_per_speed_unit,
            degrees_per_speed_unit: self.degrees_per_speed_unit,
            min_duration: self.min_duration,
        }
    }
}
