//! Reframing Benchmarks
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package hoopclip-media --bench reframe
//! ```
//!
//! # Metrics Measured
//! - Ball localization latency per frame at common resolutions
//! - Template tracker advance latency
//! - Smoother and crop mapper throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use hoopclip_media::reframe::{
    BallDetector, BallLocator, CropMapper, PositionSmoother, TemplateTracker,
};
use hoopclip_media::{Frame, ReframeConfig, VisualTracker};
use hoopclip_models::{BoundingBox, Confidence, FrameSize, Point2D, SubjectObservation};
use image::{Rgb, RgbImage};

/// Synthetic court frame with some texture and a ball.
fn create_test_frame(width: u32, height: u32, ball_x: u32) -> Frame {
    let mut image = RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 7 + y * 11) % 64) as u8;
        Rgb([30 + v, 50 + v / 2, 90])
    });
    let (cx, cy) = (ball_x as i64, height as i64 / 2);
    for y in (cy - 12)..=(cy + 12) {
        for x in (cx - 12)..=(cx + 12) {
            if (x - cx).pow(2) + (y - cy).pow(2) <= 144 {
                image.put_pixel(x as u32, y as u32, Rgb([230, 110, 30]));
            }
        }
    }
    Frame::new(0.0, image).expect("Failed to create test frame")
}

fn bench_ball_locator(c: &mut Criterion) {
    let mut group = c.benchmark_group("ball_locator");
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    let locator = BallLocator::from_config(&ReframeConfig::default());
    let resolutions = [(1920, 1080), (1280, 720), (640, 360)];

    for (width, height) in resolutions {
        let frame = create_test_frame(width, height, width / 3);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("locate", format!("{}x{}", width, height)),
            &frame,
            |b, frame| b.iter(|| black_box(locator.locate(black_box(frame.image())))),
        );
    }

    group.finish();
}

fn bench_template_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_tracker");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let first = create_test_frame(1280, 720, 400);
    let next = create_test_frame(1280, 720, 410);
    let seed = BoundingBox::centered_on(Point2D::new(400, 360), 150).expect("valid box");

    group.bench_function("advance_1280x720", |b| {
        let mut tracker = TemplateTracker::default();
        b.iter(|| {
            tracker.initialize(&first, seed).expect("init");
            black_box(tracker.advance(black_box(&next)))
        })
    });

    group.finish();
}

fn bench_smooth_and_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth_and_map");

    let mapper = CropMapper::new(
        FrameSize::new(1280, 720).expect("valid size"),
        FrameSize::new(1080, 1920).expect("valid size"),
        0.1,
        [0, 0, 0],
    )
    .expect("valid mapper");

    group.throughput(Throughput::Elements(900));
    group.bench_function("30s_at_30fps", |b| {
        b.iter(|| {
            let mut smoother = PositionSmoother::new(7);
            for i in 0..900 {
                let observation = SubjectObservation::new(
                    i as f64 / 30.0,
                    Point2D::new(300 + (i % 600) as i32, 360),
                    Confidence::Tracked,
                );
                let smoothed = smoother.push(&observation);
                black_box(mapper.map(smoothed.time, smoothed.position).expect("map"));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ball_locator,
    bench_template_tracker,
    bench_smooth_and_map
);
criterion_main!(benches);
