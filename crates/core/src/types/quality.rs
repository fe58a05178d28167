//! Card condition grades.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a grade code is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality grade: {0} (expected one of NM, SP, MP, HP, DM)")]
pub struct QualityError(pub String);

/// Physical condition of a single card.
///
/// Two copies of the same card in different grades are separate cart lines.
/// Serialized as the two-letter code the inventory service uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Quality {
    /// Near mint.
    #[default]
    NM,
    /// Slightly played.
    SP,
    /// Moderately played.
    MP,
    /// Heavily played.
    HP,
    /// Damaged.
    DM,
}

impl Quality {
    /// Every grade, best condition first.
    pub const ALL: [Self; 5] = [Self::NM, Self::SP, Self::MP, Self::HP, Self::DM];

    /// Two-letter grade code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NM => "NM",
            Self::SP => "SP",
            Self::MP => "MP",
            Self::HP => "HP",
            Self::DM => "DM",
        }
    }

    /// Human-readable grade name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NM => "Near Mint",
            Self::SP => "Slightly Played",
            Self::MP => "Moderately Played",
            Self::HP => "Heavily Played",
            Self::DM => "Damaged",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Quality {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|q| q.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| QualityError(code.to_owned()))
    }
}
