//! Set configuration: the tie-break policy for equal timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LwwError;
use crate::record::{OpKind, Timestamp};

/// Which operation wins when an add and a remove of the same element carry
/// the same timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    /// The element stays present on a tie.
    AddWins,
    /// The tombstone wins on a tie.
    #[default]
    RemoveWins,
}

impl Bias {
    /// Whether an element with the given latest add and remove timestamps is present.
    pub fn resolve(self, added: Option<Timestamp>, removed: Option<Timestamp>) -> bool {
        match (added, removed) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(a), Some(r)) if a == r => self == Bias::AddWins,
            (Some(a), Some(r)) => a > r,
        }
    }

    /// The kind that is applied last when replaying equal timestamps.
    pub fn winner(self) -> OpKind {
        match self {
            Bias::AddWins => OpKind::Add,
            Bias::RemoveWins => OpKind::Remove,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::AddWins => f.write_str("add-wins"),
            Bias::RemoveWins => f.write_str("remove-wins"),
        }
    }
}

impl FromStr for Bias {
    type Err = LwwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" | "add-wins" | "add_wins" => Ok(Bias::AddWins),
            "remove" | "remove-wins" | "remove_wins" => Ok(Bias::RemoveWins),
            other => Err(LwwError::InvalidConfig(format!("unknown bias: {}", other))),
        }
    }
}

/// Configuration carried by every set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetConfig {
    /// Tie-break policy for equal add/remove timestamps.
    pub bias: Bias,
}

/// Builder for set configuration.
pub struct SetConfigBuilder {
    config: SetConfig,
}

impl SetConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SetConfig::default(),
        }
    }

    pub fn bias(mut self, bias: Bias) -> Self {
        self.config.bias = bias;
        self
    }

    pub fn add_wins(self) -> Self {
        self.bias(Bias::AddWins)
    }

    pub fn remove_wins(self) -> Self {
        self.bias(Bias::RemoveWins)
    }

    pub fn build(self) -> SetConfig {
        self.config
    }
}

impl Default for SetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
