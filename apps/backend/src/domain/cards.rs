//! Card catalog. The engine in [`super::turn`] decides what each card does;
//! this module only names them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardKind {
    TimeManipulation,
    QuickDraw,
    AnswerShield,
    Regeneration,
    MindControl,
    Poison,
}

impl CardKind {
    pub const ALL: [CardKind; 6] = [
        CardKind::TimeManipulation,
        CardKind::QuickDraw,
        CardKind::AnswerShield,
        CardKind::Regeneration,
        CardKind::MindControl,
        CardKind::Poison,
    ];

    pub fn id(self) -> &'static str {
        match self {
            CardKind::TimeManipulation => "time-manipulation",
            CardKind::QuickDraw => "quick-draw",
            CardKind::AnswerShield => "answer-shield",
            CardKind::Regeneration => "regeneration",
            CardKind::MindControl => "mind-control",
            CardKind::Poison => "poison",
        }
    }

    /// Parse an optional card id from a request. Empty and `"no-card"` mean no card.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<CardKind>, DomainError> {
        match raw.map(str::trim) {
            None | Some("") | Some("no-card") => Ok(None),
            Some(id) => id.parse().map(Some),
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CardKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardKind::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown card '{s}'")))
    }
}
