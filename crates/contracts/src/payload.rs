//! Tracking payload from the vision service, and the validated run built from it.
//!
//! Wire shape:
//! `{ fps, frames: [ { players: { <slot>: {x, y} }, ball: {x, y, bote?} } ] }`
//! where `x = -1, y = -1` means "not detected".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{ContractError, PlayerSlot};

/// Sentinel value used by the vision service for "not detected"
pub const SENTINEL: f64 = -1.0;

/// 2D court coordinate (court units, metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const NOT_DETECTED: Coordinate = Coordinate {
        x: SENTINEL,
        y: SENTINEL,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A coordinate is usable only when neither axis carries the sentinel.
    pub fn is_detected(&self) -> bool {
        self.x != SENTINEL && self.y != SENTINEL
    }
}

/// Raw ball observation as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBall {
    pub x: f64,
    pub y: f64,
    /// Bounce counter, `bote` on the wire
    #[serde(rename = "bote", default, skip_serializing_if = "Option::is_none")]
    pub bounce: Option<i64>,
}

/// Raw frame as sent on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFrame {
    #[serde(default)]
    pub players: HashMap<String, Coordinate>,
    #[serde(default)]
    pub ball: Option<RawBall>,
}

/// Raw payload as sent on the wire
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as [`ContractError::PayloadInvalid`] naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingPayload {
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub frames: Option<Vec<RawFrame>>,
}

/// Ball observation within a validated frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallObservation {
    pub position: Coordinate,
    pub bounce: Option<i64>,
}

impl BallObservation {
    pub const NOT_DETECTED: BallObservation = BallObservation {
        position: Coordinate::NOT_DETECTED,
        bounce: None,
    };
}

/// One sampled instant of a tracking run
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    /// Ordinal within the run
    pub index: usize,
    /// Slot -> coordinate (possibly the sentinel)
    pub players: BTreeMap<PlayerSlot, Coordinate>,
    pub ball: BallObservation,
}

/// Validated sequence of frames plus frame rate
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRun {
    fps: f64,
    frames: Vec<TrackedFrame>,
}

impl TrackingRun {
    /// Build a run from already-validated parts.
    ///
    /// # Errors
    /// Returns `PayloadInvalid` if `fps` is not a positive finite number.
    pub fn new(fps: f64, frames: Vec<TrackedFrame>) -> Result<Self, ContractError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ContractError::payload_invalid(
                "fps",
                format!("fps must be a positive finite number, got {fps}"),
            ));
        }
        Ok(Self { fps, frames })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames(&self) -> &[TrackedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Nominal spacing between frames in milliseconds
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.fps
    }

    /// Offset of frame `index` from the run start, truncated to whole ms.
    ///
    /// Computed from the index directly so rounding never accumulates.
    pub fn frame_offset_ms(&self, index: usize) -> i64 {
        (index as f64 * self.frame_interval_ms()).floor() as i64
    }

    /// Synthetic time covered by the run, first to last frame
    pub fn span_ms(&self) -> i64 {
        match self.frames.len() {
            0 => 0,
            n => self.frame_offset_ms(n - 1),
        }
    }

    /// Number of detected (non-sentinel) player and ball samples
    pub fn detected_samples(&self) -> (usize, usize) {
        self.frames.iter().fold((0, 0), |(players, balls), frame| {
            let p = frame.players.values().filter(|c| c.is_detected()).count();
            let b = usize::from(frame.ball.position.is_detected());
            (players + p, balls + b)
        })
    }
}

impl TryFrom<TrackingPayload> for TrackingRun {
    type Error = ContractError;

    fn try_from(payload: TrackingPayload) -> Result<Self, Self::Error> {
        let fps = payload
            .fps
            .ok_or_else(|| ContractError::payload_invalid("fps", "missing field"))?;
        let raw_frames = payload
            .frames
            .ok_or_else(|| ContractError::payload_invalid("frames", "missing field"))?;

        let mut frames = Vec::with_capacity(raw_frames.len());
        for (index, raw) in raw_frames.into_iter().enumerate() {
            frames.push(convert_frame(index, raw)?);
        }

        TrackingRun::new(fps, frames)
    }
}

fn convert_frame(index: usize, raw: RawFrame) -> Result<TrackedFrame, ContractError> {
    let mut players = BTreeMap::new();
    for (name, coords) in raw.players {
        let slot: PlayerSlot = name.parse().map_err(|_| {
            ContractError::payload_invalid(
                format!("frames[{index}].players"),
                format!("unknown player slot '{name}'"),
            )
        })?;
        check_finite(index, &name, coords)?;
        players.insert(slot, coords);
    }

    let ball = match raw.ball {
        Some(ball) => {
            let position = Coordinate::new(ball.x, ball.y);
            check_finite(index, "ball", position)?;
            BallObservation {
                position,
                bounce: ball.bounce,
            }
        }
        None => BallObservation::NOT_DETECTED,
    };

    Ok(TrackedFrame {
        index,
        players,
        ball,
    })
}

fn check_finite(index: usize, entity: &str, coords: Coordinate) -> Result<(), ContractError> {
    if coords.x.is_finite() && coords.y.is_finite() {
        Ok(())
    } else {
        Err(ContractError::payload_invalid(
            format!("frames[{index}].{entity}"),
            "coordinates must be finite",
        ))
    }
}
