//! Turtle graphics with animated, strictly ordered playback.
//!
//! A [`Turtle`] keeps the logical cursor state and turns each command into an
//! animation descriptor. A single playback thread realizes those descriptors
//! one at a time on a [`RenderSurface`]: either the [`window`] viewer or the
//! headless [`RecordingSurface`].

// ============================================================================
// MODULES
// ============================================================================

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod state;
pub mod surface;
pub mod transform;
pub mod turtle;
pub mod window;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use animation::{AnimationDescriptor, AnimationKind, ColorTarget, Completion, Sequencer};
pub use color::{from_channels, from_name, ColorInput, ColorMode, Rgb};
pub use config::TurtleConfig;
pub use error::{SurfaceError, TurtleError, ViewerError};
pub use state::TurtleState;
pub use surface::{RecordingSurface, RenderSurface, Segment, SurfaceEvent, SurfaceLog};
pub use transform::{end_point, from_render_space, to_render_space, Point};
pub use turtle::Turtle;
pub use window::{ChannelSurface, Viewer};
