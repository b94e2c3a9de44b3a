//! Ordered, single-flight playback of animation descriptors.
//!
//! Commands enqueue descriptors on an unbounded FIFO. A dedicated playback
//! thread owns the [`RenderSurface`] and realizes one descriptor at a time,
//! in enqueue order, signalling each descriptor's completion on its own
//! channel before taking the next.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use crate::color::Rgb;
use crate::config::TurtleConfig;
use crate::error::{SurfaceError, TurtleError};
use crate::surface::RenderSurface;
use crate::transform::{frame_count, to_render_space, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    Pen,
    Fill,
    Background,
}

/// One visual change. Points are turtle-space.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
    Move {
        from: Point,
        to: Point,
        heading: f64,
        pen_color: Rgb,
        pen_width: u32,
        drawn: bool,
    },
    Rotate {
        from_angle: f64,
        to_angle: f64,
    },
    Recolor {
        target: ColorTarget,
        color: Rgb,
    },
    Fill {
        vertices: Vec<Point>,
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDescriptor {
    kind: AnimationKind,
    duration: Duration,
}

impl AnimationDescriptor {
    pub fn new(kind: AnimationKind, duration: Duration) -> Self {
        Self { kind, duration }
    }

    pub fn kind(&self) -> &AnimationKind {
        &self.kind
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

struct Job {
    sequence: u64,
    descriptor: AnimationDescriptor,
    done: SyncSender<u64>,
}

// ============================================================================
// SEQUENCER (PRODUCER SIDE)
// ============================================================================

pub struct Sequencer {
    queue: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    next_sequence: u64,
    // Fires once the worker has finished opening the surface.
    ready: Option<Receiver<()>>,
    open_timeout: Duration,
}

impl Sequencer {
    /// Starts the playback thread, which takes ownership of `surface`.
    pub fn spawn<S>(surface: S, config: &TurtleConfig) -> Result<Self, TurtleError>
    where
        S: RenderSurface + 'static,
    {
        let (queue, jobs) = mpsc::channel();
        let (opened, ready) = mpsc::sync_channel(1);
        let player = Player::new(surface, config);
        let worker = thread::Builder::new()
            .name("turtle-playback".to_string())
            .spawn(move || player.run(jobs, opened))?;

        Ok(Self {
            queue: Some(queue),
            worker: Some(worker),
            next_sequence: 0,
            ready: Some(ready),
            open_timeout: config.open_timeout,
        })
    }

    /// Appends `descriptor` to the queue without waiting for it.
    pub fn enqueue(&mut self, descriptor: AnimationDescriptor) -> Result<Completion, TurtleError> {
        let queue = self.queue.as_ref().ok_or(TurtleError::PlaybackStopped)?;

        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let duration = descriptor.duration();
        let (done, receiver) = mpsc::sync_channel(1);

        trace!(sequence, ?descriptor, "enqueue animation");
        queue
            .send(Job {
                sequence,
                descriptor,
                done,
            })
            .map_err(|_| TurtleError::PlaybackStopped)?;

        Ok(Completion {
            sequence,
            duration,
            receiver,
        })
    }

    /// Enqueues `descriptor` and blocks until it has been realized.
    ///
    /// The first call also waits, up to the configured open timeout, for the
    /// surface to finish opening.
    pub fn play(
        &mut self,
        descriptor: AnimationDescriptor,
        grace: Duration,
    ) -> Result<(), TurtleError> {
        let completion = self.enqueue(descriptor)?;
        self.await_ready(grace);
        completion.wait(grace)
    }

    fn await_ready(&mut self, grace: Duration) {
        let Some(ready) = self.ready.take() else {
            return;
        };
        let timeout = self.open_timeout.saturating_add(grace);
        match ready.recv_timeout(timeout) {
            // A dead worker shows up as PlaybackStopped on the completion.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "render surface still opening; not waiting any longer")
            }
        }
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain what is left and exit.
        drop(self.queue.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("playback worker panicked");
            }
        }
    }
}

/// Completion signal for one enqueued descriptor.
#[derive(Debug)]
pub struct Completion {
    sequence: u64,
    duration: Duration,
    receiver: Receiver<u64>,
}

impl Completion {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Waits at most the descriptor's duration plus `grace`.
    pub fn wait(self, grace: Duration) -> Result<(), TurtleError> {
        let timeout = self.duration.saturating_add(grace);
        match self.receiver.recv_timeout(timeout) {
            Ok(_) => Ok(()),
            Err(RecvTimeoutError::Timeout) => Err(TurtleError::PlaybackTimeout {
                sequence: self.sequence,
                timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(TurtleError::PlaybackStopped),
        }
    }
}

// ============================================================================
// PLAYER (CONSUMER SIDE)
// ============================================================================

struct Player<S> {
    surface: S,
    title: String,
    world_width: f64,
    world_height: f64,
    background: Rgb,
    max_framerate: f64,

    // Cursor as last realized, which may lag the logical turtle state.
    position: Point,
    heading: f64,
    pen: Rgb,
    fill: Rgb,
}

impl<S: RenderSurface> Player<S> {
    fn new(surface: S, config: &TurtleConfig) -> Self {
        Self {
            surface,
            title: config.title.clone(),
            world_width: config.world_width,
            world_height: config.world_height,
            background: config.background,
            max_framerate: config.max_framerate,
            position: Point::ORIGIN,
            heading: 0.0,
            pen: Rgb::BLACK,
            fill: Rgb::BLACK,
        }
    }

    fn run(mut self, jobs: Receiver<Job>, opened: SyncSender<()>) {
        if let Err(err) = self.open() {
            warn!(%err, "render surface failed to open; playing animations anyway");
        }
        debug!("playback worker ready");
        let _ = opened.send(());

        while let Ok(Job {
            sequence,
            descriptor,
            done,
        }) = jobs.recv()
        {
            let started = Instant::now();
            if let Err(err) = self.realize(&descriptor) {
                warn!(sequence, %err, "animation playback failed; continuing with next");
            }
            trace!(sequence, elapsed = ?started.elapsed(), "animation complete");

            // The producer may already have given up waiting.
            let _ = done.send(sequence);
        }

        debug!("animation queue closed; playback worker exiting");
    }

    fn open(&mut self) -> Result<(), SurfaceError> {
        let width = self.world_width.round().max(1.0) as u32;
        let height = self.world_height.round().max(1.0) as u32;
        self.surface.open(width, height)?;
        self.surface.set_title(&self.title)?;
        self.surface.set_background(self.background)?;
        self.surface.set_cursor_colors(self.pen, self.fill)?;
        let cursor = self.render_point(self.position);
        self.surface.update_cursor(cursor, self.heading)?;
        self.surface.present()
    }

    fn render_point(&self, p: Point) -> Point {
        to_render_space(p, self.world_width, self.world_height)
    }

    fn realize(&mut self, descriptor: &AnimationDescriptor) -> Result<(), SurfaceError> {
        let duration = descriptor.duration();
        match descriptor.kind() {
            AnimationKind::Move {
                from,
                to,
                heading,
                pen_color,
                pen_width,
                drawn,
            } => {
                let (start, end) = (self.render_point(*from), self.render_point(*to));
                let (heading, color, width, drawn) = (*heading, *pen_color, *pen_width, *drawn);
                self.position = *to;
                self.heading = heading;

                let mut last = start;
                self.animate(duration, |surface, t| {
                    let current = if t >= 1.0 { end } else { start.lerp(end, t) };
                    surface.draw_segment(last, current, color, width, drawn)?;
                    surface.update_cursor(current, heading)?;
                    last = current;
                    Ok(())
                })
            }
            AnimationKind::Rotate {
                from_angle,
                to_angle,
            } => {
                let cursor = self.render_point(self.position);
                let (from_angle, to_angle) = (*from_angle, *to_angle);
                self.heading = to_angle;

                self.animate(duration, |surface, t| {
                    let angle = if t >= 1.0 {
                        to_angle
                    } else {
                        from_angle + (to_angle - from_angle) * t
                    };
                    surface.update_cursor(cursor, angle)
                })
            }
            AnimationKind::Recolor { target, color } => {
                let color = *color;
                match target {
                    ColorTarget::Pen => self.pen = color,
                    ColorTarget::Fill => self.fill = color,
                    ColorTarget::Background => {
                        return self.animate(duration, |surface, _| surface.set_background(color));
                    }
                }
                let (pen, fill) = (self.pen, self.fill);
                self.animate(duration, |surface, _| surface.set_cursor_colors(pen, fill))
            }
            AnimationKind::Fill { vertices, color } => {
                let color = *color;
                let outline: Vec<Point> = vertices.iter().map(|p| self.render_point(*p)).collect();
                self.animate(duration, |surface, t| {
                    if t >= 1.0 {
                        surface.fill_polygon(&outline, color)
                    } else {
                        Ok(())
                    }
                })
            }
        }
    }

    /// Plays `frame` over `duration`, presenting and pacing each frame.
    fn animate<F>(&mut self, duration: Duration, mut frame: F) -> Result<(), SurfaceError>
    where
        F: FnMut(&mut S, f64) -> Result<(), SurfaceError>,
    {
        let frames = frame_count(duration, self.max_framerate);
        let started = Instant::now();

        for index in 1..=frames {
            let t = index as f64 / frames as f64;
            frame(&mut self.surface, t)?;
            self.surface.present()?;

            if let Some(remaining) = duration.mul_f64(t).checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        Ok(())
    }
}
