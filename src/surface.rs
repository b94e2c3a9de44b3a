//! The rendering collaborator the sequencer drives, plus a headless recorder.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::color::Rgb;
use crate::error::SurfaceError;
use crate::transform::Point;

/// A canvas that realizes animation frames.
///
/// Every call is made from the playback thread, one descriptor at a time.
/// Coordinates are render-space (top-left origin, +y down); headings are
/// turtle-space degrees.
pub trait RenderSurface: Send {
    /// Prepares a `width` x `height` canvas. Called once before any drawing;
    /// later calls must be no-ops.
    fn open(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    fn set_title(&mut self, title: &str) -> Result<(), SurfaceError>;

    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError>;

    /// Draws a segment, or consumes it silently when `visible` is false.
    fn draw_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb,
        width: u32,
        visible: bool,
    ) -> Result<(), SurfaceError>;

    fn update_cursor(&mut self, position: Point, heading: f64) -> Result<(), SurfaceError>;

    fn set_cursor_colors(&mut self, pen: Rgb, fill: Rgb) -> Result<(), SurfaceError>;

    fn fill_polygon(&mut self, vertices: &[Point], color: Rgb) -> Result<(), SurfaceError>;

    /// Completes the current frame.
    fn present(&mut self) -> Result<(), SurfaceError>;
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn open(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        (**self).open(width, height)
    }

    fn set_title(&mut self, title: &str) -> Result<(), SurfaceError> {
        (**self).set_title(title)
    }

    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        (**self).set_background(color)
    }

    fn draw_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb,
        width: u32,
        visible: bool,
    ) -> Result<(), SurfaceError> {
        (**self).draw_segment(from, to, color, width, visible)
    }

    fn update_cursor(&mut self, position: Point, heading: f64) -> Result<(), SurfaceError> {
        (**self).update_cursor(position, heading)
    }

    fn set_cursor_colors(&mut self, pen: Rgb, fill: Rgb) -> Result<(), SurfaceError> {
        (**self).set_cursor_colors(pen, fill)
    }

    fn fill_polygon(&mut self, vertices: &[Point], color: Rgb) -> Result<(), SurfaceError> {
        (**self).fill_polygon(vertices, color)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        (**self).present()
    }
}

// ============================================================================
// RECORDING SURFACE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Opened {
        width: u32,
        height: u32,
    },
    Title(String),
    Background(Rgb),
    Segment(Segment),
    Cursor {
        position: Point,
        heading: f64,
    },
    CursorColors {
        pen: Rgb,
        fill: Rgb,
    },
    Fill {
        vertices: Vec<Point>,
        color: Rgb,
    },
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: Rgb,
    pub width: u32,
    pub visible: bool,
}

/// Read side of a [`RecordingSurface`]; stays valid after the surface has
/// moved to the playback thread.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl SurfaceLog {
    fn lock(&self) -> MutexGuard<'_, Vec<SurfaceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().clone()
    }

    /// Every segment, including pen-up ones.
    pub fn segments(&self) -> Vec<Segment> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Segment(segment) => Some(*segment),
                _ => None,
            })
            .collect()
    }

    pub fn visible_segments(&self) -> Vec<Segment> {
        self.segments().into_iter().filter(|s| s.visible).collect()
    }

    pub fn frames(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Present))
            .count()
    }
}

/// Headless surface that records every primitive it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: SurfaceLog,
    opened: bool,
}

impl RecordingSurface {
    pub fn new() -> (Self, SurfaceLog) {
        let surface = Self::default();
        let log = surface.log.clone();
        (surface, log)
    }

    fn record(&mut self, event: SurfaceEvent) -> Result<(), SurfaceError> {
        self.log.lock().push(event);
        Ok(())
    }
}

impl RenderSurface for RecordingSurface {
    fn open(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;
        self.record(SurfaceEvent::Opened { width, height })
    }

    fn set_title(&mut self, title: &str) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Title(title.to_string()))
    }

    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Background(color))
    }

    fn draw_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb,
        width: u32,
        visible: bool,
    ) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Segment(Segment {
            from,
            to,
            color,
            width,
            visible,
        }))
    }

    fn update_cursor(&mut self, position: Point, heading: f64) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Cursor { position, heading })
    }

    fn set_cursor_colors(&mut self, pen: Rgb, fill: Rgb) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::CursorColors { pen, fill })
    }

    fn fill_polygon(&mut self, vertices: &[Point], color: Rgb) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Fill {
            vertices: vertices.to_vec(),
            color,
        })
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.record(SurfaceEvent::Present)
    }
}
