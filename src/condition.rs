//! The two experimental conditions that are compared.

use serde::Serialize;
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Plain mutexes / condition variables
    NoPi,
    /// With priority inheritance
    Pi,
}

impl Condition {
    /// The token used in stat file names, e.g. `stat_no_pi_...`
    pub fn file_token(self) -> &'static str {
        match self {
            Condition::NoPi => "no_pi",
            Condition::Pi => "pi",
        }
    }

    /// Legend label in charts and column prefix in tables
    pub fn label(self) -> &'static str {
        self.file_token()
    }
}
