use background::{
    ControlPanel, FrameSink, Pipeline, Pixel, PixelBuffer, SurfaceSize, attractor::Point,
};
use rand::{SeedableRng, rngs::StdRng};
use test_log::test;

/// Keeps a copy of every presented frame.
#[derive(Default)]
struct RecordingSink {
    frames: Vec<PixelBuffer>,
}

impl FrameSink for RecordingSink {
    fn present(&mut self, frame: &PixelBuffer) {
        self.frames.push(frame.clone());
    }
}

fn panel() -> ControlPanel {
    ControlPanel {
        pixel_scale: 2,
        circle_count: 3,
        ..ControlPanel::default()
    }
}

#[test]
fn resize_clears_automaton_and_recenters_attractors() {
    let mut p = Pipeline::new(panel());
    let mut sink = RecordingSink::default();

    for _ in 0..30 {
        assert!(p.tick(SurfaceSize::new(240, 160), &mut sink));
    }
    assert!(p.seed_board().unwrap().pixels().iter().any(|px| px.a > 0));

    // An empty surface skips the tick and leaves the boards alone.
    let before = p.seed_board().cloned();
    assert!(!p.tick(SurfaceSize::new(0, 0), &mut sink));
    assert!(!p.resize(SurfaceSize::new(1, 500)));
    assert_eq!(p.seed_board().cloned(), before);
    assert_eq!(sink.frames.len(), 30);

    assert!(p.resize(SurfaceSize::new(300, 100)));
    assert_eq!(p.raster_size(), Some((150, 50)));
    assert!(p.seed_board().unwrap().pixels().iter().all(|px| px.a == 0));
    assert_eq!(p.generator().radius(), 150 / 28);
    for c in p.generator().circles() {
        assert_eq!(c.position, Point::new(75, 25));
    }

    // The next tick at the same size runs on the cleared boards.
    assert!(p.tick(SurfaceSize::new(300, 100), &mut sink));
    assert_eq!(sink.frames.last().unwrap().dims(), (150, 50));
    let board = p.seed_board().unwrap();
    assert!(board.pixels().iter().all(|px| matches!(px.a, 0 | 243 | 255)));
}

#[test]
fn generator_recenters_on_resize() {
    let mut g = background::attractor::PatternGenerator::new(4, 64, 64);
    let mut buf = PixelBuffer::new(64, 64).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..10 {
        g.iterate(&mut buf, &mut rng);
    }
    assert!(g.circles().iter().any(|c| c.position != Point::new(32, 32)));

    g.recenter(90, 30);
    assert_eq!(g.radius(), 3);
    for c in g.circles() {
        assert_eq!(c.position, Point::new(45, 15));
        assert_eq!(c.last_position, Point::new(45, 15));
        assert_eq!(c.desired_position, Point::new(45, 15));
    }

    buf.resize(90, 30).unwrap();
    assert!(buf.pixels().iter().all(|&px| px == Pixel::TRANSPARENT));
}

#[test]
fn every_presented_frame_is_opaque_and_sized() {
    let mut p = Pipeline::new(panel());
    let mut sink = RecordingSink::default();
    for i in 0..12 {
        let size = if i < 6 { (120, 80) } else { (80, 120) };
        p.tick(SurfaceSize::new(size.0, size.1), &mut sink);
    }
    assert_eq!(sink.frames.len(), 12);
    assert_eq!(sink.frames[0].dims(), (60, 40));
    assert_eq!(sink.frames[11].dims(), (40, 60));
    for f in &sink.frames {
        assert!(f.pixels().iter().all(|px| px.a == 255));
    }
}

#[test]
fn texture_sustains_itself() {
    let mut p = Pipeline::new(panel());
    let mut sink = RecordingSink::default();
    for _ in 0..200 {
        p.tick(SurfaceSize::new(160, 160), &mut sink);
    }
    let lit = p
        .seed_board()
        .unwrap()
        .pixels()
        .iter()
        .filter(|px| px.a > 0)
        .count();
    assert!(lit > 0, "attractors keep feeding the board");
    assert_eq!(p.ticks(), 200);
}
