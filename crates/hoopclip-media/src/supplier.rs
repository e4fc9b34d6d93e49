//! Frame suppliers: where the pipeline gets its pixels.
//!
//! The pipeline asks for a frame at a time offset and stops at end of
//! stream. Suppliers return the most recent frame at or before the
//! requested time, so sampling coarser than the native rate simply skips
//! frames.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Slack for floating-point timestamp comparisons.
const TIME_EPSILON: f64 = 1e-6;

/// Source of frames addressed by time offset in seconds.
pub trait FrameSupplier: Send {
    /// Native frame rate of the source.
    fn fps(&self) -> f64;

    /// Frame shown at `time`, or `None` once the stream has ended.
    fn frame_at(&mut self, time: f64) -> MediaResult<Option<Frame>>;
}

impl<S: FrameSupplier + ?Sized> FrameSupplier for Box<S> {
    fn fps(&self) -> f64 {
        (**self).fps()
    }

    fn frame_at(&mut self, time: f64) -> MediaResult<Option<Frame>> {
        (**self).frame_at(time)
    }
}

fn frame_period(fps: f64) -> f64 {
    if fps > 0.0 {
        1.0 / fps
    } else {
        0.0
    }
}

/// In-memory supplier over pre-decoded frames.
#[derive(Debug, Clone)]
pub struct VecFrameSupplier {
    frames: Vec<Frame>,
    fps: f64,
}

impl VecFrameSupplier {
    /// Create a supplier. Frames are sorted by time.
    pub fn new(mut frames: Vec<Frame>, fps: f64) -> MediaResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(MediaError::invalid_input(format!("fps must be positive, got {}", fps)));
        }
        frames.sort_by(|a, b| a.time().total_cmp(&b.time()));
        Ok(Self { frames, fps })
    }

    /// Number of frames held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the supplier holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSupplier for VecFrameSupplier {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_at(&mut self, time: f64) -> MediaResult<Option<Frame>> {
        let Some(last) = self.frames.last() else {
            return Ok(None);
        };
        if time > last.time() + frame_period(self.fps) - TIME_EPSILON {
            return Ok(None);
        }

        let idx = self
            .frames
            .partition_point(|f| f.time() <= time + TIME_EPSILON)
            .saturating_sub(1);
        Ok(self.frames.get(idx).cloned())
    }
}

/// Supplier fed by a decoder task over a bounded channel.
///
/// Frames must be sent in time order. `frame_at` blocks on the channel, so
/// drive it from a blocking thread (see
/// [`ReframePipeline::plan_async`](crate::reframe::ReframePipeline::plan_async)).
pub struct ChannelFrameSupplier {
    rx: mpsc::Receiver<Frame>,
    fps: f64,
    current: Option<Frame>,
    lookahead: Option<Frame>,
    closed: bool,
}

impl ChannelFrameSupplier {
    /// Create a supplier and the sender the decoder pushes frames into.
    pub fn channel(fps: f64, capacity: usize) -> (mpsc::Sender<Frame>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx, fps))
    }

    /// Wrap an existing receiver.
    pub fn new(rx: mpsc::Receiver<Frame>, fps: f64) -> Self {
        Self {
            rx,
            fps,
            current: None,
            lookahead: None,
            closed: false,
        }
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if let Some(frame) = self.lookahead.take() {
            return Some(frame);
        }
        if self.closed {
            return None;
        }
        let frame = self.rx.blocking_recv();
        if frame.is_none() {
            debug!("Frame channel closed");
            self.closed = true;
        }
        frame
    }
}

impl FrameSupplier for ChannelFrameSupplier {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_at(&mut self, time: f64) -> MediaResult<Option<Frame>> {
        while let Some(frame) = self.next_frame() {
            if frame.time() <= time + TIME_EPSILON {
                self.current = Some(frame);
            } else {
                self.lookahead = Some(frame);
                break;
            }
        }

        if self.lookahead.is_none() {
            // Source exhausted: only the final frame's own period remains valid.
            match &self.current {
                Some(current)
                    if time <= current.time() + frame_period(self.fps) - TIME_EPSILON => {}
                _ => return Ok(None),
            }
        }

        Ok(self.current.clone().or_else(|| self.lookahead.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frames(count: usize, fps: f64) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(i as f64 / fps, RgbImage::new(4, 4)).unwrap())
            .collect()
    }

    #[test]
    fn test_vec_supplier_returns_latest_frame() {
        let mut supplier = VecFrameSupplier::new(frames(10, 10.0), 10.0).unwrap();
        assert_eq!(supplier.frame_at(0.0).unwrap().unwrap().time(), 0.0);
        assert_eq!(supplier.frame_at(0.25).unwrap().unwrap().time(), 0.2);
        assert_eq!(supplier.frame_at(0.9).unwrap().unwrap().time(), 0.9);
        assert!(supplier.frame_at(1.0).unwrap().is_none());
    }

    #[test]
    fn test_vec_supplier_rejects_bad_fps() {
        assert!(VecFrameSupplier::new(Vec::new(), 0.0).is_err());
        let mut empty = VecFrameSupplier::new(Vec::new(), 30.0).unwrap();
        assert!(empty.frame_at(0.0).unwrap().is_none());
    }

    #[test]
    fn test_channel_supplier_skips_and_ends() {
        let (tx, mut supplier) = ChannelFrameSupplier::channel(10.0, 32);
        for frame in frames(5, 10.0) {
            tx.try_send(frame).unwrap();
        }
        drop(tx);

        assert_eq!(supplier.frame_at(0.0).unwrap().unwrap().time(), 0.0);
        assert_eq!(supplier.frame_at(0.3).unwrap().unwrap().time(), 0.3);
        assert_eq!(supplier.frame_at(0.4).unwrap().unwrap().time(), 0.4);
        assert!(supplier.frame_at(0.6).unwrap().is_none());
    }

    #[test]
    fn test_channel_supplier_before_first_frame() {
        let (tx, mut supplier) = ChannelFrameSupplier::channel(10.0, 4);
        tokio_test::block_on(async move {
            for frame in frames(3, 10.0).into_iter().skip(1) {
                tx.send(frame).await.unwrap();
            }
        });

        // Nothing at or before 0.0: the earliest frame stands in.
        assert_eq!(supplier.frame_at(0.0).unwrap().unwrap().time(), 0.1);
        assert_eq!(supplier.frame_at(0.2).unwrap().unwrap().time(), 0.2);
        assert!(supplier.frame_at(0.3).unwrap().is_none());
    }
}
