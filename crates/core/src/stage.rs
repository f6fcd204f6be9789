use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A contest stage number, always in 1..=16. Stage 16 is the master stage
/// (the finale); stages 5..=15 require two correct answers ("steps") before
/// they count as solved.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(u8);

impl Stage {
    pub const FIRST: Stage = Stage(1);
    pub const FINAL: Stage = Stage(16);
    pub const COUNT: u8 = 16;

    pub fn new(n: u8) -> Result<Self, CoreError> {
        if (1..=Self::COUNT).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CoreError::StageOutOfRange(n))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// The stage whose solve unlocks this one. `None` for stage 1.
    pub fn previous(self) -> Option<Stage> {
        if self.0 > 1 { Some(Stage(self.0 - 1)) } else { None }
    }

    pub fn is_final(self) -> bool {
        self == Self::FINAL
    }

    /// Stages 5..=15 carry a second riddle that must also be answered
    /// before the stage is solved.
    pub fn requires_two_steps(self) -> bool {
        (5..=15).contains(&self.0)
    }

    /// The step whose correct answer completes the stage.
    pub fn final_step(self) -> Step {
        if self.requires_two_steps() { Step::Two } else { Step::One }
    }

    /// All stages in ascending order.
    pub fn all() -> impl Iterator<Item = Stage> {
        (1..=Self::COUNT).map(Stage)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage({})", self.0)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A riddle step within a stage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Step {
    One,
    Two,
}

impl Step {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn parse(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(CoreError::InvalidStep(other)),
        }
    }
}

/// An ordered set of solved (or otherwise marked) stages.
///
/// This is the unit the engine merges: local and remote solved sets are
/// always combined as a union so server-confirmed progress is never lost.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageSet(BTreeSet<Stage>);

impl StageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the stage was not already present.
    pub fn insert(&mut self, stage: Stage) -> bool {
        self.0.insert(stage)
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0.contains(&stage)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &StageSet) -> StageSet {
        StageSet(self.0.union(&other.0).copied().collect())
    }

    /// Stages present here but absent from `other`.
    pub fn difference(&self, other: &StageSet) -> StageSet {
        StageSet(self.0.difference(&other.0).copied().collect())
    }

    pub fn max_solved(&self) -> Option<Stage> {
        self.0.last().copied()
    }

    /// The smallest stage not in the set, or `None` when all 16 are present.
    pub fn first_unsolved(&self) -> Option<Stage> {
        Stage::all().find(|s| !self.contains(*s))
    }

    /// The stage the player should be on: the smallest unsolved stage, or
    /// the master stage once everything is solved.
    pub fn next_unsolved(&self) -> Stage {
        self.first_unsolved().unwrap_or(Stage::FINAL)
    }

    pub fn is_complete(&self) -> bool {
        self.first_unsolved().is_none()
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

impl FromIterator<Stage> for StageSet {
    fn from_iter<T: IntoIterator<Item = Stage>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The headline prize attached to a stage. Pure function of the stage number.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PrizeTier {
    /// Stages 1..=14: cash plus a gift card.
    CashAndGiftCard,
    /// Stage 15: the smaller airline-miles prize.
    MilesTierA,
    /// Stage 16, the finale: the grand miles prize.
    MilesTierB,
}

impl PrizeTier {
    pub fn for_stage(stage: Stage) -> Self {
        match stage.number() {
            15 => Self::MilesTierA,
            16 => Self::MilesTierB,
            _ => Self::CashAndGiftCard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CashAndGiftCard => "$50 + $100 GC",
            Self::MilesTierA => "50K Miles",
            Self::MilesTierB => "100K Miles",
        }
    }
}
