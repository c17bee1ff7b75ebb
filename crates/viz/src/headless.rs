//! Windowless playback for scripting and CI.
//!
//! Steps the scene at a fixed rate and reports what the billboards look
//! like after every frame, one JSON object per line.

use serde::Serialize;
use std::io::Write;

use scene_data::{Cartesian3, Color, EntityId, SceneTime};

use crate::runtime::SceneRuntime;

/// Errors that can occur while writing headless output.
#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// How to step the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessOptions {
    /// Number of frames to run.
    pub frames: u64,
    /// Scene seconds per frame.
    pub step: f64,
    /// Scene time of the first frame.
    pub start: SceneTime,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            frames: 60,
            step: 1.0,
            start: SceneTime::EPOCH,
        }
    }
}

/// One shown billboard in a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillboardReport {
    pub entity: EntityId,
    pub position: Cartesian3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped_position: Option<Cartesian3>,
    pub image: Option<String>,
    pub color: Color,
    pub scale: f64,
}

/// State of the billboards after one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub time: SceneTime,
    /// Entities with a tracking record
    pub tracked: usize,
    /// Billboards bound to an entity and shown
    pub shown: usize,
    /// Whether the frame asked the pool to regroup
    pub dirty: bool,
    pub billboards: Vec<BillboardReport>,
}

/// Runs the scene for `options.frames` frames.
pub fn run(runtime: &SceneRuntime, options: HeadlessOptions) -> Vec<FrameReport> {
    (0..options.frames)
        .map(|frame| {
            let time = options.start.add_seconds(frame as f64 * options.step);
            runtime.step(time);
            report(runtime, frame, time)
        })
        .collect()
}

/// Captures the current billboard state.
pub fn report(runtime: &SceneRuntime, frame: u64, time: SceneTime) -> FrameReport {
    let mut cluster = runtime.cluster.borrow_mut();
    let dirty = cluster.take_dirty();

    let mut billboards: Vec<BillboardReport> = cluster
        .active()
        .filter(|(_, b)| b.show)
        .filter_map(|(_, b)| {
            Some(BillboardReport {
                entity: b.id.clone()?,
                position: b.position,
                clamped_position: b.clamped_position(),
                image: b.image().map(str::to_owned),
                color: b.color,
                scale: b.scale,
            })
        })
        .collect();
    billboards.sort_by(|a, b| a.entity.as_str().cmp(b.entity.as_str()));

    FrameReport {
        frame,
        time,
        tracked: runtime.visualizer.len(),
        shown: billboards.len(),
        dirty,
        billboards,
    }
}

/// Writes reports as JSON lines.
pub fn write_reports(reports: &[FrameReport], mut out: impl Write) -> Result<(), HeadlessError> {
    for report in reports {
        serde_json::to_writer(&mut out, report)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
