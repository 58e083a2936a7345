//! Randomness: dice rolls and winner selection

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::transport::ActorId;
use crate::{Error, Result};

pub const MAX_DICE: u32 = 100;
pub const MIN_FACES: u32 = 2;
pub const MAX_FACES: u32 = 1000;

static DICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)d([0-9]+)$").expect("dice pattern is a valid regex"));

/// Dice notation `NdM`: roll `count` dice with `faces` sides each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSpec {
    count: u32,
    faces: u32,
}

impl DiceSpec {
    /// Validate bounds and build a spec
    pub fn new(count: u64, faces: u64) -> Result<Self> {
        let count_ok = (1..=u64::from(MAX_DICE)).contains(&count);
        let faces_ok = (u64::from(MIN_FACES)..=u64::from(MAX_FACES)).contains(&faces);
        if !count_ok || !faces_ok {
            return Err(Error::DiceRangeExceeded { count, faces });
        }

        // Both bounds fit in u32 after the checks above
        Ok(Self {
            count: count as u32,
            faces: faces as u32,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn faces(&self) -> u32 {
        self.faces
    }
}

impl FromStr for DiceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        let caps = DICE_PATTERN
            .captures(&normalized)
            .ok_or_else(|| Error::InvalidDiceFormat(s.to_string()))?;

        // Digit runs too long for u64 are certainly out of range
        let count = caps[1].parse::<u64>().unwrap_or(u64::MAX);
        let faces = caps[2].parse::<u64>().unwrap_or(u64::MAX);

        Self::new(count, faces)
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)
    }
}

/// Outcome of one roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub values: Vec<u32>,
    pub total: u64,
}

/// Source of session randomness
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDraw;

impl RandomDraw {
    pub fn new() -> Self {
        Self
    }

    /// Draw `count` independent values in `1..=faces`
    pub fn roll_dice(&self, spec: &DiceSpec) -> RollResult {
        let mut rng = rand::thread_rng();
        let values: Vec<u32> = (0..spec.count)
            .map(|_| rng.gen_range(1..=spec.faces))
            .collect();
        let total = values.iter().map(|v| u64::from(*v)).sum();

        RollResult { values, total }
    }

    /// Pick one participant uniformly at random
    ///
    /// Callers check for participants first; an empty pool is a bug.
    pub fn choose_winner(&self, participants: &[ActorId]) -> Result<ActorId> {
        debug_assert!(!participants.is_empty(), "choose_winner called without participants");
        participants
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(Error::EmptyParticipantPool)
    }
}
