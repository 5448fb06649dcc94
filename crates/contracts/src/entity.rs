//! Tracked entities: the four player slots and the ball.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Court half a player slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourtHalf {
    /// y in [0, height/2]
    Top,
    /// y in [height/2, height)
    Bottom,
}

/// Fixed court-quadrant identifier used as a stable player tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerSlot {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PlayerSlot {
    /// All slots in tag order
    pub const ALL: [PlayerSlot; 4] = [
        PlayerSlot::TopLeft,
        PlayerSlot::TopRight,
        PlayerSlot::BottomLeft,
        PlayerSlot::BottomRight,
    ];

    /// Tag value written to the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
        }
    }

    /// Half of the court this slot plays in
    pub fn half(&self) -> CourtHalf {
        match self {
            Self::TopLeft | Self::TopRight => CourtHalf::Top,
            Self::BottomLeft | Self::BottomRight => CourtHalf::Bottom,
        }
    }
}

impl FromStr for PlayerSlot {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_left" => Ok(Self::TopLeft),
            "top_right" => Ok(Self::TopRight),
            "bottom_left" => Ok(Self::BottomLeft),
            "bottom_right" => Ok(Self::BottomRight),
            other => Err(ContractError::Other(format!("unknown player slot '{other}'"))),
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `entity` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Ball,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Ball => "ball",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked subject: one player slot or the ball
///
/// Serialized as its bare name (`"top_left"`, `"ball"`) so it can be
/// used directly as a JSON object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Player(PlayerSlot),
    Ball,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Player(_) => EntityKind::Player,
            Self::Ball => EntityKind::Ball,
        }
    }

    pub fn slot(&self) -> Option<PlayerSlot> {
        match self {
            Self::Player(slot) => Some(*slot),
            Self::Ball => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player(slot) => slot.as_str(),
            Self::Ball => "ball",
        }
    }
}

impl From<PlayerSlot> for Entity {
    fn from(slot: PlayerSlot) -> Self {
        Self::Player(slot)
    }
}

impl FromStr for Entity {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ball" {
            Ok(Self::Ball)
        } else {
            s.parse().map(Self::Player)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlayerSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlayerSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
