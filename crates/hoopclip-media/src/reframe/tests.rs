//! End-to-end reframing scenarios across locator, lifecycle, smoother and mapper.

use super::*;
use crate::frame::Frame;
use crate::supplier::VecFrameSupplier;
use hoopclip_models::{BoundingBox, CropRectangle, FrameSize, Point2D};
use image::{Rgb, RgbImage};

const COURT: Rgb<u8> = Rgb([40, 60, 90]);
const BALL: Rgb<u8> = Rgb([230, 110, 30]);

fn court_frame(time: f64, width: u32, height: u32, ball: Option<(i32, i32)>) -> Frame {
    let mut image = RgbImage::from_pixel(width, height, COURT);
    if let Some((cx, cy)) = ball {
        let r = 8;
        for y in (cy - r).max(0)..=(cy + r).min(height as i32 - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(width as i32 - 1) {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    image.put_pixel(x as u32, y as u32, BALL);
                }
            }
        }
    }
    Frame::new(time, image).unwrap()
}

/// Two seconds at 10 fps with the ball rolling left to right.
fn rolling_ball_clip() -> VecFrameSupplier {
    let frames = (0..21)
        .map(|i| court_frame(i as f64 / 10.0, 640, 360, Some((100 + i * 20, 180))))
        .collect();
    VecFrameSupplier::new(frames, 10.0).unwrap()
}

/// Reports a player standing just below every ball it can see.
struct PlayerUnderBall(BallLocator);

impl PersonDetector for PlayerUnderBall {
    fn detect(&self, image: &RgbImage) -> crate::error::MediaResult<Vec<BoundingBox>> {
        Ok(self
            .0
            .locate(image)?
            .map(|ball| BoundingBox::new(ball.x - 20, ball.y - 20, 40, 100).unwrap())
            .into_iter()
            .collect())
    }
}

fn player_under_ball() -> Box<dyn PersonDetector> {
    Box::new(PlayerUnderBall(BallLocator::from_config(&ReframeConfig::default())))
}

#[test]
fn test_scenario_ball_matches_player() {
    let selector = SubjectSelector::new(200.0);
    let frame = FrameSize::new(1280, 720).unwrap();
    let people = [BoundingBox::new(600, 250, 100, 220).unwrap()];

    assert_eq!(
        selector.select(Some(Point2D::new(640, 360)), &people, frame),
        Some(Point2D::new(650, 360))
    );
}

#[test]
fn test_scenario_no_ball_uses_center_player() {
    let selector = SubjectSelector::new(200.0);
    let frame = FrameSize::new(1280, 720).unwrap();
    let people = [
        BoundingBox::centered_on(Point2D::new(200, 360), 100).unwrap(),
        BoundingBox::centered_on(Point2D::new(700, 360), 100).unwrap(),
    ];

    assert_eq!(selector.select(None, &people, frame), Some(Point2D::new(700, 360)));
}

#[test]
fn test_scenario_crop_for_landscape_source() {
    let mapper = CropMapper::new(
        FrameSize::new(1280, 720).unwrap(),
        FrameSize::new(1080, 1920).unwrap(),
        0.1,
        [0, 0, 0],
    )
    .unwrap();
    let instruction = mapper.map(0.0, Point2D::new(650, 360)).unwrap();

    assert_eq!(instruction.scaled_size.width(), 3413);
    assert_eq!((instruction.crop.x, instruction.crop.y), (1193, 0));
    assert!(!instruction.padding_required());
}

#[test]
fn test_person_filter_holds_for_any_detector_output() {
    struct Everything;
    impl PersonDetector for Everything {
        fn detect(&self, _image: &RgbImage) -> crate::error::MediaResult<Vec<BoundingBox>> {
            Ok((1..40)
                .map(|i| BoundingBox::new(i * 10, 20, 10 + i * 3, 60).unwrap())
                .collect())
        }
    }

    let locator = ObjectLocator::new(&ReframeConfig::default(), Box::new(Everything));
    let output = locator.locate(&court_frame(0.0, 800, 400, None)).unwrap();
    assert!(!output.people.is_empty());
    for bbox in &output.people {
        assert!(bbox.height() as f64 >= 0.8 * bbox.width() as f64);
    }
}

#[test]
fn test_tracking_plan_follows_the_ball() {
    let config = ReframeConfig::default();
    let pipeline = ReframePipeline::new(config)
        .unwrap()
        .with_person_detector(player_under_ball);

    let mut supplier = rolling_ball_clip();
    let plan = pipeline
        .plan(&mut supplier, ClipWindow::new(0.0, 2.0))
        .unwrap();

    assert_eq!(plan.len(), 21);
    let summary = plan.summary();
    assert_eq!(summary.total(), 21);
    // Redetection every 5 sampled frames at 10 fps.
    assert!(summary.detected >= 5, "{:?}", summary);

    for instruction in plan.instructions() {
        assert!(instruction.crop.fits(instruction.scaled_size));
        assert!(instruction.source_region.fits(plan.source()));
    }

    let first = plan.instructions()[0].crop.x;
    let last = plan.instructions()[20].crop.x;
    assert_eq!(first, 0);
    assert!(last > first + 1000, "crop did not follow: {} -> {}", first, last);
}

#[cfg(feature = "opencv")]
#[test]
fn test_default_pipeline_detects_people_with_hog() {
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();
    assert_eq!(pipeline.person_backend(), "hog");
    assert!(format!("{:?}", pipeline).contains("\"hog\""));
}

#[cfg(not(feature = "opencv"))]
#[test]
fn test_default_pipeline_without_opencv_has_no_people_detector() {
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();
    assert_eq!(pipeline.person_backend(), "none");

    let plan = pipeline
        .plan(&mut rolling_ball_clip(), ClipWindow::new(0.0, 2.0))
        .unwrap();
    assert!(plan.summary().all_fallback());
}

#[test]
fn test_ball_detector_can_be_replaced() {
    struct FixedBall;
    impl BallDetector for FixedBall {
        fn locate(&self, _image: &RgbImage) -> crate::error::MediaResult<Option<Point2D>> {
            Ok(Some(Point2D::new(500, 180)))
        }
    }
    struct PlayerAt500;
    impl PersonDetector for PlayerAt500 {
        fn detect(&self, _image: &RgbImage) -> crate::error::MediaResult<Vec<BoundingBox>> {
            Ok(vec![BoundingBox::new(480, 130, 40, 100).unwrap()])
        }
    }

    let pipeline = ReframePipeline::new(ReframeConfig::default())
        .unwrap()
        .with_ball_detector(|| Box::new(FixedBall) as Box<dyn BallDetector>)
        .with_person_detector(|| Box::new(PlayerAt500) as Box<dyn PersonDetector>);

    // Empty court frames: only the injected ball backend can see anything.
    let frames = (0..5)
        .map(|i| court_frame(i as f64 / 10.0, 640, 360, None))
        .collect();
    let mut supplier = VecFrameSupplier::new(frames, 10.0).unwrap();
    let plan = pipeline.plan(&mut supplier, ClipWindow::new(0.0, 0.4)).unwrap();
    assert!(plan.summary().detected >= 1);
    assert_eq!(pipeline.person_backend(), "custom");
    // Subject at x=500 pulls the crop right of the 1167 px center crop.
    assert!(plan.instructions()[0].crop.x > 1167);
}

#[test]
fn test_plan_timestamps_follow_sampling_interval() {
    let config = ReframeConfig {
        sample_interval_secs: Some(0.25),
        ..Default::default()
    };
    let pipeline = ReframePipeline::new(config).unwrap();
    let mut supplier = rolling_ball_clip();

    let plan = pipeline.plan(&mut supplier, ClipWindow::new(0.5, 1.0)).unwrap();
    let times: Vec<f64> = plan.instructions().iter().map(|i| i.time).collect();
    assert_eq!(times, vec![0.5, 0.75, 1.0, 1.25, 1.5]);
}

#[test]
fn test_plan_stops_at_end_of_stream() {
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();
    let mut supplier = rolling_ball_clip();

    // Clip runs past the 2.1s of footage.
    let plan = pipeline.plan(&mut supplier, ClipWindow::new(1.5, 30.0)).unwrap();
    assert_eq!(plan.len(), 6);
}

#[test]
fn test_empty_court_is_constant_center_crop() {
    let frames = (0..10)
        .map(|i| court_frame(i as f64 / 10.0, 1280, 720, None))
        .collect();
    let mut supplier = VecFrameSupplier::new(frames, 10.0).unwrap();
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();

    let plan = pipeline.plan(&mut supplier, ClipWindow::new(0.0, 0.9)).unwrap();
    assert_eq!(plan.len(), 10);
    assert!(plan.summary().all_fallback());

    let expected = CropRectangle {
        x: 1167,
        y: 0,
        width: 1080,
        height: 1920,
    };
    assert!(plan.instructions().iter().all(|i| i.crop == expected));
}

#[test]
fn test_center_only_mode_skips_localization() {
    let config = ReframeConfig {
        enable_tracking: false,
        ..Default::default()
    };
    let pipeline = ReframePipeline::new(config)
        .unwrap()
        .with_person_detector(|| -> Box<dyn PersonDetector> {
            panic!("detector must not be built in center-only mode")
        });

    let mut supplier = rolling_ball_clip();
    let plan = pipeline.plan(&mut supplier, ClipWindow::new(0.0, 1.0)).unwrap();

    assert_eq!(plan.len(), 11);
    let first = plan.instructions()[0].crop;
    assert!(plan.instructions().iter().all(|i| i.crop == first));
}

#[test]
fn test_resolution_change_is_rejected() {
    let frames = vec![
        court_frame(0.0, 640, 360, None),
        court_frame(0.1, 320, 180, None),
    ];
    let mut supplier = VecFrameSupplier::new(frames, 10.0).unwrap();
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();

    let err = pipeline
        .plan(&mut supplier, ClipWindow::new(0.0, 0.1))
        .unwrap_err();
    assert!(matches!(err, crate::error::MediaError::InvalidInput(_)));
}

#[test]
fn test_missing_first_frame_is_an_error() {
    let mut supplier = VecFrameSupplier::new(Vec::new(), 30.0).unwrap();
    let pipeline = ReframePipeline::new(ReframeConfig::default()).unwrap();
    assert!(pipeline.plan(&mut supplier, ClipWindow::new(0.0, 1.0)).is_err());
}

#[test]
fn test_invalid_config_rejected_by_pipeline() {
    let config = ReframeConfig {
        smoothing_window_size: 0,
        ..Default::default()
    };
    assert!(ReframePipeline::new(config).is_err());
}

#[test]
fn test_parallel_clips_keep_input_order() {
    let pipeline = ReframePipeline::new(ReframeConfig::default())
        .unwrap()
        .with_person_detector(player_under_ball);

    let clips = vec![
        (rolling_ball_clip(), ClipWindow::new(0.0, 0.5)),
        (rolling_ball_clip(), ClipWindow::new(1.0, 1.0)),
        (rolling_ball_clip(), ClipWindow::new(1.9, 5.0)),
    ];
    let plans: Vec<CropPlan> = pipeline
        .plan_clips(clips)
        .into_iter()
        .collect::<crate::error::MediaResult<_>>()
        .unwrap();

    let lengths: Vec<usize> = plans.iter().map(|p| p.len()).collect();
    assert_eq!(lengths, vec![6, 11, 2]);
    assert_eq!(plans[1].instructions()[0].time, 1.0);
}
