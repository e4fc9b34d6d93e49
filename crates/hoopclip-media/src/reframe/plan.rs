//! The crop plan: an ordered crop stream for one clip.

use hoopclip_models::{Confidence, CropInstruction, CropRectangle, FrameSize};
use serde::{Deserialize, Serialize};

use crate::error::MediaResult;

/// Observation and padding counts for a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub detected: usize,
    pub tracked: usize,
    pub fallback: usize,
    pub padded: usize,
}

impl PlanSummary {
    /// Count one sampled frame.
    pub fn record(&mut self, confidence: Confidence, padded: bool) {
        match confidence {
            Confidence::Detected => self.detected += 1,
            Confidence::Tracked => self.tracked += 1,
            Confidence::Fallback => self.fallback += 1,
        }
        if padded {
            self.padded += 1;
        }
    }

    /// Total sampled frames.
    pub fn total(&self) -> usize {
        self.detected + self.tracked + self.fallback
    }

    /// True when no frame had a detected or tracked subject.
    pub fn all_fallback(&self) -> bool {
        self.total() > 0 && self.fallback == self.total()
    }
}

/// Time-ordered crop instructions covering one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPlan {
    source: FrameSize,
    target: FrameSize,
    instructions: Vec<CropInstruction>,
    summary: PlanSummary,
}

impl CropPlan {
    /// Create an empty plan for a source/target pair.
    pub fn new(source: FrameSize, target: FrameSize) -> Self {
        Self {
            source,
            target,
            instructions: Vec::new(),
            summary: PlanSummary::default(),
        }
    }

    /// Append the instruction for the next sampled frame.
    ///
    /// Instructions must arrive in increasing time order.
    pub fn push(&mut self, instruction: CropInstruction, confidence: Confidence) {
        debug_assert!(self
            .instructions
            .last()
            .map_or(true, |last| last.time <= instruction.time));
        self.summary.record(confidence, instruction.padding_required());
        self.instructions.push(instruction);
    }

    pub fn source(&self) -> FrameSize {
        self.source
    }

    pub fn target(&self) -> FrameSize {
        self.target
    }

    pub fn instructions(&self) -> &[CropInstruction] {
        &self.instructions
    }

    pub fn summary(&self) -> PlanSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction whose timestamp is closest to `time`; ties pick the earlier.
    pub fn nearest(&self, time: f64) -> Option<&CropInstruction> {
        let idx = self.instructions.partition_point(|i| i.time < time);
        let after = self.instructions.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.instructions.get(i));

        match (before, after) {
            (Some(b), Some(a)) => {
                if (a.time - time).abs() < (time - b.time).abs() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }

    /// Instruction at an arbitrary time, linearly interpolated between the
    /// neighbouring samples and held constant past either end.
    pub fn interpolate(&self, time: f64) -> Option<CropInstruction> {
        let first = self.instructions.first()?;
        let last = self.instructions.last()?;
        if time <= first.time {
            return Some(CropInstruction { time, ..*first });
        }
        if time >= last.time {
            return Some(CropInstruction { time, ..*last });
        }

        let idx = self.instructions.partition_point(|i| i.time <= time);
        let a = &self.instructions[idx - 1];
        let b = &self.instructions[idx];
        let span = b.time - a.time;
        let t = if span > 0.0 { (time - a.time) / span } else { 0.0 };

        Some(CropInstruction {
            time,
            crop: CropRectangle::lerp(&a.crop, &b.crop, t, a.scaled_size),
            source_region: CropRectangle::lerp(&a.source_region, &b.source_region, t, self.source),
            ..*a
        })
    }

    /// Serialize the plan for the renderer.
    pub fn to_json(&self) -> MediaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a plan previously produced by [`CropPlan::to_json`].
    ///
    /// Every crop must lie inside its scaled source and every source region
    /// inside the plan's source frame.
    pub fn from_json(json: &str) -> MediaResult<Self> {
        let plan: CropPlan = serde_json::from_str(json)?;
        for instruction in &plan.instructions {
            instruction.crop.check_within(instruction.scaled_size)?;
            instruction.source_region.check_within(plan.source)?;
        }
        Ok(plan)
    }
}
