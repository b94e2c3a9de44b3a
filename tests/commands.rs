use turtle::{
    from_channels, from_render_space, ColorMode, Point, Rgb, Segment, SurfaceEvent, SurfaceLog,
    Turtle, TurtleConfig, TurtleError,
};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn assert_point(actual: Point, x: f64, y: f64) {
    assert!(
        approx_eq(actual.x, x) && approx_eq(actual.y, y),
        "expected ({x}, {y}), got ({}, {})",
        actual.x,
        actual.y
    );
}

/// Tracer off: every move plays as a single frame and segment.
fn instant_turtle() -> (Turtle, SurfaceLog) {
    let (mut turtle, log) = Turtle::headless(TurtleConfig::default()).expect("spawn turtle");
    turtle.set_tracer(false);
    (turtle, log)
}

fn world(segment: &Segment) -> (Point, Point) {
    let config = TurtleConfig::default();
    (
        from_render_space(segment.from, config.world_width, config.world_height),
        from_render_space(segment.to, config.world_width, config.world_height),
    )
}

#[test]
fn forward_left_forward_draws_two_segments() {
    let (mut turtle, log) = instant_turtle();

    turtle.forward(100.0).unwrap();
    assert_point(turtle.position(), 100.0, 0.0);
    turtle.left(90.0).unwrap();
    assert!(approx_eq(turtle.heading(), 90.0));
    turtle.forward(100.0).unwrap();
    assert_point(turtle.position(), 100.0, 100.0);

    let segments = log.visible_segments();
    assert_eq!(segments.len(), 2);

    let (from, to) = world(&segments[0]);
    assert_point(from, 0.0, 0.0);
    assert_point(to, 100.0, 0.0);
    let (from, to) = world(&segments[1]);
    assert_point(from, 100.0, 0.0);
    assert_point(to, 100.0, 100.0);
}

#[test]
fn segments_are_drawn_in_render_space() {
    let (mut turtle, log) = instant_turtle();
    turtle.left(90.0).unwrap();
    turtle.forward(50.0).unwrap();

    let segment = log.visible_segments()[0];
    assert_point(segment.from, 350.0, 350.0);
    // +y in turtle-space is up the screen.
    assert_point(segment.to, 350.0, 300.0);
}

#[test]
fn backward_undoes_forward() {
    let (mut turtle, _log) = instant_turtle();
    turtle.left(37.0).unwrap();
    turtle.forward(123.4).unwrap();
    turtle.backward(123.4).unwrap();

    let position = turtle.position();
    assert!(position.x.abs() < EPSILON * 1e3);
    assert!(position.y.abs() < EPSILON * 1e3);
    assert!(approx_eq(turtle.heading(), 37.0));
}

#[test]
fn left_then_right_restores_heading_exactly() {
    let (mut turtle, _log) = instant_turtle();
    turtle.left(33.3).unwrap();
    turtle.right(33.3).unwrap();
    assert_eq!(turtle.state().raw_heading(), 0.0);

    turtle.left(0.1).unwrap();
    let before = turtle.state().raw_heading();
    for degrees in [0.2, 45.0, 1e-3, 987.654, -12.5] {
        turtle.left(degrees).unwrap();
        turtle.right(degrees).unwrap();
        assert_eq!(turtle.state().raw_heading(), before, "turn of {degrees}");
    }
    turtle.right(0.1).unwrap();

    turtle.right(90.0).unwrap();
    assert!(approx_eq(turtle.heading(), 270.0));
}

#[test]
fn speed_is_clamped() {
    let (mut turtle, _log) = instant_turtle();
    turtle.set_speed(42);
    assert_eq!(turtle.speed(), 10);
    turtle.set_speed(-3);
    assert_eq!(turtle.speed(), 0);
    turtle.set_speed(7);
    assert_eq!(turtle.speed(), 7);
}

#[test]
fn negative_pen_size_is_rejected() {
    let (mut turtle, _log) = instant_turtle();
    let err = turtle.set_pen_size(-1).unwrap_err();
    assert!(matches!(err, TurtleError::InvalidArgument(_)));
    assert!(err.to_string().contains("-1"), "{err}");
    assert_eq!(turtle.pen_width(), 1);

    turtle.set_width(0).unwrap();
    assert_eq!(turtle.pen_width(), 0);
}

#[test]
fn pen_up_moves_without_visible_ink() {
    let (mut turtle, log) = instant_turtle();
    turtle.pen_up();
    turtle.forward(80.0).unwrap();
    turtle.pen_down();
    turtle.forward(20.0).unwrap();

    let segments = log.segments();
    assert_eq!(segments.len(), 2);
    assert!(!segments[0].visible);
    assert!(segments[1].visible);
    assert_point(turtle.position(), 100.0, 0.0);
}

#[test]
fn segments_carry_pen_color_and_width() {
    let (mut turtle, log) = instant_turtle();
    turtle.set_color_mode(255.0);
    turtle.set_pen_color((255.0, 0.0, 0.0)).unwrap();
    turtle.set_width(4).unwrap();
    turtle.forward(10.0).unwrap();
    turtle.set_pen_color("Blue").unwrap();
    turtle.forward(10.0).unwrap();

    let segments = log.visible_segments();
    assert_eq!(segments[0].color.to_rgb8(), (255, 0, 0));
    assert_eq!(segments[0].width, 4);
    assert_eq!(segments[1].color.to_rgb8(), (0, 0, 255));
}

#[test]
fn bad_colors_leave_state_untouched() {
    let (mut turtle, _log) = instant_turtle();
    turtle.set_pen_color("purple").unwrap();
    let purple = turtle.pen_color();

    let err = turtle.set_pen_color((2.0, 0.0, 0.0)).unwrap_err();
    assert!(matches!(err, TurtleError::InvalidArgument(_)));
    let err = turtle.set_pen_color("not-a-color").unwrap_err();
    assert!(err.to_string().contains("not-a-color"));
    assert_eq!(turtle.pen_color(), purple);
}

#[test]
fn invalid_color_mode_is_ignored() {
    let (mut turtle, _log) = instant_turtle();
    turtle.set_color_mode(255.0);
    turtle.set_color_mode(100.0);
    assert_eq!(turtle.color_mode(), ColorMode::Byte);

    turtle.set_fill_color((0.0, 128.0, 255.0)).unwrap();
    let expected = from_channels(0.0, 128.0, 255.0, ColorMode::Byte).unwrap();
    assert_eq!(turtle.fill_color(), expected);
}

#[test]
fn set_position_keeps_turtle_space_y() {
    let (mut turtle, log) = instant_turtle();
    turtle.set_position(-200.0, -150.0).unwrap();
    assert_point(turtle.position(), -200.0, -150.0);
    assert!(approx_eq(turtle.heading(), 0.0));

    let (_, to) = world(&log.visible_segments()[0]);
    assert_point(to, -200.0, -150.0);

    turtle.set_x(10.0).unwrap();
    turtle.set_y(20.0).unwrap();
    assert_point(turtle.position(), 10.0, 20.0);
}

#[test]
fn non_finite_arguments_are_rejected() {
    let (mut turtle, log) = instant_turtle();
    assert!(turtle.forward(f64::NAN).is_err());
    assert!(turtle.left(f64::INFINITY).is_err());
    assert!(turtle.go_to(0.0, f64::NEG_INFINITY).is_err());
    assert_point(turtle.position(), 0.0, 0.0);
    assert!(log.segments().is_empty());
}

#[test]
fn filled_square_emits_polygon() {
    let (mut turtle, log) = instant_turtle();
    turtle.set_fill_color("red").unwrap();
    turtle.begin_fill();
    assert!(turtle.is_filling());
    for _ in 0..4 {
        turtle.forward(100.0).unwrap();
        turtle.left(90.0).unwrap();
    }
    turtle.end_fill().unwrap();
    assert!(!turtle.is_filling());

    let fills: Vec<_> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SurfaceEvent::Fill { vertices, color } => Some((vertices, color)),
            _ => None,
        })
        .collect();
    assert_eq!(fills.len(), 1);
    let (vertices, color) = &fills[0];
    assert_eq!(vertices.len(), 5);
    assert_eq!(color.to_rgb8(), (255, 0, 0));
}

#[test]
fn end_fill_without_begin_is_harmless() {
    let (mut turtle, log) = instant_turtle();
    turtle.end_fill().unwrap();
    turtle.begin_fill();
    turtle.forward(10.0).unwrap();
    turtle.end_fill().unwrap();

    let fills = log
        .events()
        .iter()
        .filter(|event| matches!(event, SurfaceEvent::Fill { .. }))
        .count();
    assert_eq!(fills, 0);
}

#[test]
fn background_color_reaches_surface() {
    let (mut turtle, log) = instant_turtle();
    turtle.set_background_color("black").unwrap();

    let backgrounds: Vec<Rgb> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SurfaceEvent::Background(color) => Some(color),
            _ => None,
        })
        .collect();
    assert_eq!(backgrounds.first(), Some(&Rgb::WHITE));
    assert_eq!(backgrounds.last(), Some(&Rgb::BLACK));
}

#[test]
fn animated_move_is_split_into_frames() {
    let config = TurtleConfig::builder().initial_speed(10).build();
    let (mut turtle, log) = Turtle::headless(config).unwrap();

    // 40 px at speed 10 takes 100 ms, or 6 frames at 60 fps.
    turtle.forward(40.0).unwrap();
    let segments = log.visible_segments();
    assert_eq!(segments.len(), 6);
    for pair in segments.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
    let (_, end) = world(&segments[5]);
    assert_point(end, 40.0, 0.0);
}
