use std::env;
use std::thread;

use anyhow::{bail, Result};
use rand::Rng;
use tracing::{error, info};
use turtle::{window, Turtle, TurtleConfig, TurtleError};

const DEMOS: &[&str] = &["htree", "triangles", "fill", "spiral"];

fn main() -> Result<()> {
    init_tracing();

    let mut demo = DEMOS[0].to_string();
    let mut headless = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--headless" => headless = true,
            name if DEMOS.contains(&name) => demo = name.to_string(),
            other => bail!("unknown argument `{other}`; expected one of {DEMOS:?} or --headless"),
        }
    }

    let config = TurtleConfig::builder()
        .title(format!("Turtle: {demo}"))
        .build();

    if headless {
        let (mut turtle, log) = Turtle::headless(config)?;
        turtle.set_tracer(false);
        run_demo(&demo, &mut turtle)?;
        info!(
            demo = %demo,
            segments = log.visible_segments().len(),
            frames = log.frames(),
            "headless drawing finished"
        );
        return Ok(());
    }

    // The window needs the main thread; the drawing program gets its own.
    let (surface, viewer) = window::channel(&config);
    thread::Builder::new()
        .name("turtle-program".to_string())
        .spawn(move || {
            let result =
                Turtle::new(config, surface).and_then(|mut turtle| run_demo(&demo, &mut turtle));
            match result {
                Ok(()) => info!(demo = %demo, "drawing finished; close the window to exit"),
                Err(err) => error!(demo = %demo, %err, "drawing failed"),
            }
        })?;

    viewer.run()?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn run_demo(name: &str, turtle: &mut Turtle) -> Result<(), TurtleError> {
    info!(demo = name, "starting demo");
    match name {
        "triangles" => triangles_demo(turtle),
        "fill" => fill_demo(turtle),
        "spiral" => spiral_demo(turtle),
        _ => {
            turtle.set_speed(10);
            h_tree(turtle, 100.0, 3)
        }
    }
}

// ============================================================================
// DEMO PROGRAMS
// ============================================================================

fn h_tree(turtle: &mut Turtle, length: f64, depth: u32) -> Result<(), TurtleError> {
    if depth == 0 {
        return Ok(());
    }

    turtle.forward(length / 2.0)?;
    turtle.left(90.0)?;
    turtle.forward(length / 2.0)?;
    turtle.right(90.0)?;

    h_tree(turtle, length / 2.0, depth - 1)?;

    turtle.right(90.0)?;
    turtle.forward(length)?;
    turtle.left(90.0)?;

    h_tree(turtle, length / 2.0, depth - 1)?;

    turtle.left(90.0)?;
    turtle.forward(length / 2.0)?;
    turtle.left(90.0)?;
    turtle.forward(length)?;
    turtle.right(90.0)?;
    turtle.forward(length / 2.0)?;
    turtle.right(90.0)?;

    h_tree(turtle, length / 2.0, depth - 1)?;

    turtle.right(90.0)?;
    turtle.forward(length)?;
    turtle.left(90.0)?;

    h_tree(turtle, length / 2.0, depth - 1)?;

    turtle.left(90.0)?;
    turtle.forward(length / 2.0)?;
    turtle.right(90.0)?;
    turtle.forward(length / 2.0)
}

fn triangles_demo(turtle: &mut Turtle) -> Result<(), TurtleError> {
    let size = 300.0;

    turtle.set_speed(10);
    turtle.pen_up();
    turtle.left(90.0)?;
    turtle.backward(size / 2.0)?;
    turtle.right(90.0)?;
    turtle.backward(size / 2.0)?;

    nested_triangles(turtle, 9, size)
}

fn nested_triangles(turtle: &mut Turtle, depth: u32, size: f64) -> Result<(), TurtleError> {
    if depth == 0 {
        return Ok(());
    }

    turtle.pen_down();
    for _ in 0..3 {
        turtle.forward(size)?;
        turtle.left(120.0)?;
    }
    turtle.pen_up();
    turtle.forward(size / 2.0)?;
    turtle.left(60.0)?;
    nested_triangles(turtle, depth - 1, size / 2.0)?;
    turtle.right(60.0)?;
    turtle.backward(size / 2.0)
}

fn fill_demo(turtle: &mut Turtle) -> Result<(), TurtleError> {
    turtle.set_speed(5);
    turtle.set_background_color((0.0, 0.0, 0.0))?;
    turtle.set_pen_color((1.0, 1.0, 1.0))?;
    turtle.set_width(2)?;
    turtle.set_fill_color((1.0, 0.5, 0.5))?;
    turtle.begin_fill();
    for _ in 0..5 {
        turtle.forward(300.0)?;
        turtle.left(144.0)?;
    }
    turtle.end_fill()?;
    turtle.set_background_color((0.5, 0.5, 0.5))?;

    turtle.pen_up();
    turtle.set_position(-200.0, -200.0)?;
    turtle.pen_down();
    turtle.set_width(3)?;
    turtle.begin_fill();
    polygon(turtle, 100.0, 4)?;
    turtle.end_fill()
}

fn polygon(turtle: &mut Turtle, length: f64, sides: u32) -> Result<(), TurtleError> {
    for _ in 0..sides {
        turtle.forward(length)?;
        turtle.left(360.0 / sides as f64)?;
    }
    Ok(())
}

fn spiral_demo(turtle: &mut Turtle) -> Result<(), TurtleError> {
    let mut rng = rand::rng();
    let sides = 10;

    turtle.set_speed(10);
    turtle.set_color_mode(1.0);
    for distance in (1..=100).rev() {
        turtle.set_pen_color((rng.random::<f64>(), rng.random::<f64>(), rng.random::<f64>()))?;
        turtle.forward(distance as f64)?;
        turtle.left(360.0 / sides as f64)?;
    }
    Ok(())
}
