// ============================================================================
// WINDOWED RENDER SURFACE
// ============================================================================
//
// winit insists on owning the main thread, so the playback thread talks to the
// window through a channel: `ChannelSurface` is the `RenderSurface` handed to
// the turtle, `Viewer` runs the event loop and rasterizes what arrives.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::color::Rgb;
use crate::config::TurtleConfig;
use crate::error::{SurfaceError, ViewerError};
use crate::surface::RenderSurface;
use crate::transform::Point;

/// Arrowhead outline in cursor-local coordinates, tip along +x.
const CURSOR_OUTLINE: [(f64, f64); 4] = [(0.0, 0.0), (-3.75, -5.0), (10.0, 0.0), (-3.75, 5.0)];
const CURSOR_SCALE: f64 = 1.5;

#[derive(Debug)]
enum SurfaceMessage {
    Open {
        width: u32,
        height: u32,
        ready: SyncSender<()>,
    },
    Title(String),
    Background(Rgb),
    Segment {
        from: Point,
        to: Point,
        color: Rgb,
        width: u32,
    },
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

/// Creates a connected surface/viewer pair.
pub fn channel(config: &TurtleConfig) -> (ChannelSurface, Viewer) {
    let (sender, messages) = mpsc::channel();
    let surface = ChannelSurface {
        sender,
        open_timeout: config.open_timeout,
        opened: false,
    };
    let viewer = Viewer {
        messages,
        max_framerate: config.max_framerate,
    };
    (surface, viewer)
}

// ============================================================================
// PLAYBACK SIDE
// ============================================================================

pub struct ChannelSurface {
    sender: Sender<SurfaceMessage>,
    open_timeout: Duration,
    opened: bool,
}

impl ChannelSurface {
    fn send(&self, message: SurfaceMessage) -> Result<(), SurfaceError> {
        self.sender
            .send(message)
            .map_err(|_| SurfaceError::Disconnected)
    }
}

impl RenderSurface for ChannelSurface {
    fn open(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if self.opened {
            return Ok(());
        }

        let (ready, acknowledged) = mpsc::sync_channel(1);
        self.send(SurfaceMessage::Open {
            width,
            height,
            ready,
        })?;
        match acknowledged.recv_timeout(self.open_timeout) {
            Ok(()) => {
                self.opened = true;
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => Err(SurfaceError::OpenTimeout(self.open_timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(SurfaceError::Disconnected),
        }
    }

    fn set_title(&mut self, title: &str) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::Title(title.to_string()))
    }

    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::Background(color))
    }

    fn draw_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb,
        width: u32,
        visible: bool,
    ) -> Result<(), SurfaceError> {
        if !visible {
            return Ok(());
        }
        self.send(SurfaceMessage::Segment {
            from,
            to,
            color,
            width,
        })
    }

    fn update_cursor(&mut self, position: Point, heading: f64) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::Cursor { position, heading })
    }

    fn set_cursor_colors(&mut self, pen: Rgb, fill: Rgb) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::CursorColors { pen, fill })
    }

    fn fill_polygon(&mut self, vertices: &[Point], color: Rgb) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::Fill {
            vertices: vertices.to_vec(),
            color,
        })
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.send(SurfaceMessage::Present)
    }
}

// ============================================================================
// EVENT LOOP SIDE
// ============================================================================

pub struct Viewer {
    messages: Receiver<SurfaceMessage>,
    max_framerate: f64,
}

struct View {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

impl View {
    fn open(
        target: &EventLoopWindowTarget<()>,
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Self, ViewerError> {
        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(LogicalSize::new(width as f64, height as f64))
            .with_resizable(false)
            .build(target)?;
        let window = Arc::new(window);

        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface_texture)?;

        Ok(Self { window, pixels })
    }

    fn render(&mut self, scene: &Scene) -> Result<(), ViewerError> {
        scene.render(self.pixels.frame_mut());
        self.pixels.render()?;
        Ok(())
    }
}

impl Viewer {
    /// Runs the window until it is closed. Must be called on the main thread.
    pub fn run(self) -> Result<(), ViewerError> {
        let Viewer {
            messages,
            max_framerate,
        } = self;

        let event_loop = EventLoop::new()?;
        let frame_duration = Duration::from_secs_f64(1.0 / max_framerate.max(1.0));
        let mut last_frame = Instant::now();
        let mut scene = Scene::default();
        let mut view: Option<View> = None;

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        info!("turtle window closed");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Some(view) = view.as_mut() {
                            if let Err(err) =
                                view.pixels.resize_surface(new_size.width, new_size.height)
                            {
                                warn!(%err, "failed to resize pixel surface");
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(view) = view.as_mut() {
                            if let Err(err) = view.render(&scene) {
                                error!(%err, "failed to render turtle frame");
                                window_target.exit();
                            }
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    for message in messages.try_iter() {
                        match message {
                            SurfaceMessage::Open {
                                width,
                                height,
                                ready,
                            } => {
                                if view.is_none() {
                                    match View::open(window_target, width, height, &scene.title) {
                                        Ok(opened) => {
                                            debug!(width, height, "turtle window opened");
                                            scene.resize(width as usize, height as usize);
                                            view = Some(opened);
                                        }
                                        Err(err) => {
                                            error!(%err, "failed to open turtle window");
                                            window_target.exit();
                                            return;
                                        }
                                    }
                                }
                                let _ = ready.send(());
                            }
                            SurfaceMessage::Title(title) => {
                                if let Some(view) = view.as_ref() {
                                    view.window.set_title(&title);
                                }
                                scene.title = title;
                            }
                            other => scene.apply(other),
                        }
                    }

                    if last_frame.elapsed() >= frame_duration {
                        if let Some(view) = view.as_ref() {
                            if scene.dirty {
                                view.window.request_redraw();
                                scene.dirty = false;
                            }
                        }
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

// ============================================================================
// RETAINED SCENE
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: Point,
    heading: f64,
    pen: Rgb,
    fill: Rgb,
}

impl Cursor {
    /// Outline vertices in render-space. Turtle headings are counter-clockwise
    /// with +y up, render-space has +y down, hence the negated angle.
    fn outline(&self) -> Vec<Point> {
        let (sin, cos) = (-self.heading.to_radians()).sin_cos();
        CURSOR_OUTLINE
            .iter()
            .map(|&(x, y)| {
                let (x, y) = (x * CURSOR_SCALE, y * CURSOR_SCALE);
                Point::new(
                    self.position.x + x * cos - y * sin,
                    self.position.y + x * sin + y * cos,
                )
            })
            .collect()
    }

    fn draw(&self, canvas: &mut Canvas) {
        let outline = self.outline();
        canvas.fill_polygon(&outline, self.fill.to_rgb8());
        let pen = self.pen.to_rgb8();
        for (i, from) in outline.iter().enumerate() {
            let to = outline[(i + 1) % outline.len()];
            canvas.draw_thick_line_aa(*from, to, 1.0, pen);
        }
    }
}

struct Scene {
    title: String,
    width: usize,
    height: usize,
    background: (u8, u8, u8),
    // RGBA strokes and fills, composited over the background each frame.
    layer: Vec<u8>,
    cursor: Cursor,
    dirty: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 0,
            height: 0,
            background: (0xff, 0xff, 0xff),
            layer: Vec::new(),
            cursor: Cursor {
                position: Point::ORIGIN,
                heading: 0.0,
                pen: Rgb::BLACK,
                fill: Rgb::BLACK,
            },
            dirty: true,
        }
    }
}

impl Scene {
    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.layer = vec![0; width * height * 4];
        self.dirty = true;
    }

    fn layer_canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.layer, self.width, self.height)
    }

    fn apply(&mut self, message: SurfaceMessage) {
        match message {
            SurfaceMessage::Background(color) => self.background = color.to_rgb8(),
            SurfaceMessage::Segment {
                from,
                to,
                color,
                width,
            } => {
                let thickness = (width as f32).max(1.0);
                self.layer_canvas()
                    .draw_thick_line_aa(from, to, thickness, color.to_rgb8());
            }
            SurfaceMessage::Cursor { position, heading } => {
                self.cursor.position = position;
                self.cursor.heading = heading;
            }
            SurfaceMessage::CursorColors { pen, fill } => {
                self.cursor.pen = pen;
                self.cursor.fill = fill;
            }
            SurfaceMessage::Fill { vertices, color } => {
                self.layer_canvas().fill_polygon(&vertices, color.to_rgb8());
            }
            SurfaceMessage::Present => {}
            SurfaceMessage::Open { .. } | SurfaceMessage::Title(_) => return,
        }
        self.dirty = true;
    }

    fn render(&self, frame: &mut [u8]) {
        let mut canvas = Canvas::new(frame, self.width, self.height);
        canvas.clear(self.background);
        canvas.composite(&self.layer);
        self.cursor.draw(&mut canvas);
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        // A frame shorter than width x height clips everything past its end.
        let height = if width == 0 {
            0
        } else {
            height.min(frame.len() / (width * 4))
        };
        Self {
            frame,
            width,
            height,
        }
    }

    fn clear(&mut self, color: (u8, u8, u8)) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.0, color.1, color.2, 0xff]);
        }
    }

    /// Source-over blend that respects the destination's own alpha, so the
    /// same primitive works on the opaque frame and the transparent layer.
    fn set_pixel(&mut self, x: i32, y: i32, color: (u8, u8, u8), alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let dst = &mut self.frame[idx..idx + 4];

        let src_a = alpha.clamp(0.0, 1.0);
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let blend = |src: u8, dst: u8| {
            ((src as f32 * src_a + dst as f32 * dst_a * (1.0 - src_a)) / out_a).round() as u8
        };
        let out = [
            blend(color.0, dst[0]),
            blend(color.1, dst[1]),
            blend(color.2, dst[2]),
            (out_a * 255.0).round() as u8,
        ];
        dst.copy_from_slice(&out);
    }

    fn composite(&mut self, layer: &[u8]) {
        let width = self.width;
        for (i, src) in layer.chunks_exact(4).enumerate() {
            if src[3] == 0 {
                continue;
            }
            let (x, y) = ((i % width.max(1)) as i32, (i / width.max(1)) as i32);
            self.set_pixel(x, y, (src[0], src[1], src[2]), src[3] as f32 / 255.0);
        }
    }

    fn draw_thick_line_aa(&mut self, from: Point, to: Point, thickness: f32, color: (u8, u8, u8)) {
        let (x0, y0, x1, y1) = (from.x as f32, from.y as f32, to.x as f32, to.y as f32);
        let reach = thickness.ceil() as i32 + 1;
        // Only the part of the bounding box that lands on the canvas is walked.
        let min_x = (x0.min(x1).floor() as i32).saturating_sub(reach).max(0);
        let max_x = (x0.max(x1).ceil() as i32)
            .saturating_add(reach)
            .min(self.width as i32 - 1);
        let min_y = (y0.min(y1).floor() as i32).saturating_sub(reach).max(0);
        let max_y = (y0.max(y1).ceil() as i32)
            .saturating_add(reach)
            .min(self.height as i32 - 1);
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len_sq = dx * dx + dy * dy;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5 - x0;
                let py = y as f32 + 0.5 - y0;
                let t = if len_sq > 0.0 {
                    ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let lx = x0 + t * dx;
                let ly = y0 + t * dy;
                let dist = ((lx - x as f32 - 0.5).powi(2) + (ly - y as f32 - 0.5).powi(2)).sqrt();
                let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.set_pixel(x, y, color, aa);
                }
            }
        }
    }

    /// Even-odd scanline fill sampled at pixel centres.
    fn fill_polygon(&mut self, vertices: &[Point], color: (u8, u8, u8)) {
        if vertices.len() < 3 {
            return;
        }
        let min_y = vertices.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = vertices.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let first_row = (min_y.floor() as i32).max(0);
        let last_row = (max_y.ceil() as i32).min(self.height as i32 - 1);

        let mut crossings = Vec::new();
        for row in first_row..=last_row {
            let y = row as f64 + 0.5;
            crossings.clear();
            for (i, a) in vertices.iter().enumerate() {
                let b = vertices[(i + 1) % vertices.len()];
                if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                    crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = ((span[0] - 0.5).ceil() as i32).max(0);
                let end = ((span[1] - 0.5).floor() as i32).min(self.width as i32 - 1);
                for x in start..=end {
                    self.set_pixel(x, row, color, 1.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn fill_covers_interior_only() {
        let mut frame = vec![0u8; 10 * 10 * 4];
        let square = [
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            Point::new(8.0, 8.0),
            Point::new(2.0, 8.0),
        ];
        Canvas::new(&mut frame, 10, 10).fill_polygon(&square, (255, 0, 0));

        assert_eq!(pixel(&frame, 10, 5, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 2, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 1, 5), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 10, 8, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn layer_composites_over_background() {
        let mut scene = Scene::default();
        scene.resize(20, 20);
        scene.apply(SurfaceMessage::Background(Rgb::BLACK));
        scene.apply(SurfaceMessage::Segment {
            from: Point::new(0.0, 10.5),
            to: Point::new(20.0, 10.5),
            color: Rgb::WHITE,
            width: 3,
        });

        let mut frame = vec![0u8; 20 * 20 * 4];
        scene.render(&mut frame);
        assert_eq!(pixel(&frame, 20, 5, 10), [255, 255, 255, 255]);
        assert_eq!(pixel(&frame, 20, 15, 18), [0, 0, 0, 255]);
    }

    #[test]
    fn drawing_outside_the_canvas_is_clipped() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.draw_thick_line_aa(Point::new(-10.0, -10.0), Point::new(20.0, 20.0), 2.0, (1, 2, 3));
        canvas.set_pixel(100, 100, (1, 2, 3), 1.0);
        assert_eq!(pixel(&frame, 4, 0, 0)[..3], [1, 2, 3]);
    }

    #[test]
    fn long_segments_only_walk_the_canvas() {
        let mut frame = vec![0u8; 700 * 700 * 4];
        let mut canvas = Canvas::new(&mut frame, 700, 700);
        let started = std::time::Instant::now();
        canvas.draw_thick_line_aa(
            Point::new(-1e6, -1e6),
            Point::new(-1e6, 1e6),
            3.0,
            (9, 9, 9),
        );
        canvas.draw_thick_line_aa(
            Point::new(-20_000.0, -20_000.0),
            Point::new(20_000.0, 20_000.0),
            1.0,
            (9, 9, 9),
        );
        canvas.fill_polygon(
            &[
                Point::new(-1e7, -1e7),
                Point::new(1e7, -1e7),
                Point::new(0.0, 1e7),
            ],
            (7, 7, 7),
        );
        assert!(
            started.elapsed() < std::time::Duration::from_secs(2),
            "took {:?}",
            started.elapsed()
        );
        assert_eq!(pixel(&frame, 700, 699, 0), [7, 7, 7, 255]);
    }

    #[test]
    fn cursor_points_along_heading() {
        let cursor = Cursor {
            position: Point::new(50.0, 50.0),
            heading: 90.0,
            pen: Rgb::BLACK,
            fill: Rgb::BLACK,
        };
        let tip = cursor.outline()[2];
        assert!((tip.x - 50.0).abs() < 1e-9);
        assert!(tip.y < 50.0, "heading 90 should point up the screen, got {tip:?}");
    }

    #[test]
    fn invisible_segments_are_not_sent() {
        let (mut surface, viewer) = channel(&TurtleConfig::default());
        surface
            .draw_segment(Point::ORIGIN, Point::new(1.0, 1.0), Rgb::BLACK, 1, false)
            .unwrap();
        surface.present().unwrap();
        let received: Vec<_> = viewer.messages.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0], SurfaceMessage::Present));
    }

    #[test]
    fn open_fails_once_viewer_is_gone() {
        let (mut surface, viewer) = channel(&TurtleConfig::default());
        drop(viewer);
        assert!(matches!(surface.open(10, 10), Err(SurfaceError::Disconnected)));
    }
}
