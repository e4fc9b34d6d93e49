//! Subject selection: pick the point of interest for one frame.
//!
//! The player nearest the ball is the subject when the ball is found and
//! someone stands close enough to it. Otherwise the player closest to the
//! frame center is used. With no players at all there is no subject.

use hoopclip_models::{BoundingBox, FrameSize, Point2D};
use tracing::trace;

/// How a subject was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionBasis {
    /// Nearest player to the ball, inside the match radius
    BallMatch,
    /// Player nearest the frame center
    CenterFallback,
}

/// A selected subject position and how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub position: Point2D,
    pub basis: SelectionBasis,
}

/// Chooses the subject from locator output.
#[derive(Debug, Clone, Copy)]
pub struct SubjectSelector {
    match_radius: f64,
}

impl SubjectSelector {
    /// Create a selector with the given ball-to-player match radius in pixels.
    pub fn new(match_radius: f64) -> Self {
        Self { match_radius }
    }

    /// Select the subject center.
    pub fn select(
        &self,
        ball: Option<Point2D>,
        people: &[BoundingBox],
        frame: FrameSize,
    ) -> Option<Point2D> {
        self.select_with_basis(ball, people, frame)
            .map(|s| s.position)
    }

    /// Select the subject center and report which rule produced it.
    ///
    /// Ties on distance keep the earliest box in `people`.
    pub fn select_with_basis(
        &self,
        ball: Option<Point2D>,
        people: &[BoundingBox],
        frame: FrameSize,
    ) -> Option<Selection> {
        if people.is_empty() {
            return None;
        }

        if let Some(ball) = ball {
            if let Some((center, distance)) = nearest_center(people, &ball) {
                if distance < self.match_radius {
                    trace!(%ball, %center, distance, "Subject matched to ball");
                    return Some(Selection {
                        position: center,
                        basis: SelectionBasis::BallMatch,
                    });
                }
            }
        }

        let frame_center = frame.center();
        nearest_center(people, &frame_center).map(|(center, _)| Selection {
            position: center,
            basis: SelectionBasis::CenterFallback,
        })
    }
}

/// Center of the box closest to `target`, with its distance.
fn nearest_center(people: &[BoundingBox], target: &Point2D) -> Option<(Point2D, f64)> {
    let mut best: Option<(Point2D, f64)> = None;
    for bbox in people {
        let center = bbox.center();
        let distance = center.distance_to(target);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((center, distance));
        }
    }
    best
}
