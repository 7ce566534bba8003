use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::ParseEnumError;

/// Residence halls the service delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hall {
    Azad,
    BcRoy,
    Gokhale,
    Hjb,
    Jcb,
    Llr,
    Lbs,
    Mmm,
    MotherTeresa,
    Nehru,
    Patel,
    Rk,
    Rp,
    SisterNivedita,
    Vs,
}

impl Hall {
    /// Every hall in display order.
    pub const ALL: [Hall; 15] = [
        Hall::Azad,
        Hall::BcRoy,
        Hall::Gokhale,
        Hall::Hjb,
        Hall::Jcb,
        Hall::Llr,
        Hall::Lbs,
        Hall::Mmm,
        Hall::MotherTeresa,
        Hall::Nehru,
        Hall::Patel,
        Hall::Rk,
        Hall::Rp,
        Hall::SisterNivedita,
        Hall::Vs,
    ];

    /// Stable identifier stored in the database and used in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Hall::Azad => "azad",
            Hall::BcRoy => "bc_roy",
            Hall::Gokhale => "gokhale",
            Hall::Hjb => "hjb",
            Hall::Jcb => "jcb",
            Hall::Llr => "llr",
            Hall::Lbs => "lbs",
            Hall::Mmm => "mmm",
            Hall::MotherTeresa => "mother_teresa",
            Hall::Nehru => "nehru",
            Hall::Patel => "patel",
            Hall::Rk => "rk",
            Hall::Rp => "rp",
            Hall::SisterNivedita => "sister_nivedita",
            Hall::Vs => "vs",
        }
    }

    /// Human-readable hall name.
    pub fn label(self) -> &'static str {
        match self {
            Hall::Azad => "Azad",
            Hall::BcRoy => "B.C. Roy",
            Hall::Gokhale => "Gokhale",
            Hall::Hjb => "H.J. Bhabha",
            Hall::Jcb => "J.C. Bose",
            Hall::Llr => "Lala Lajpat Rai",
            Hall::Lbs => "Lal Bahadur Shastri",
            Hall::Mmm => "Madan Mohan Malviya",
            Hall::MotherTeresa => "Mother Teresa",
            Hall::Nehru => "Nehru",
            Hall::Patel => "Patel",
            Hall::Rk => "Radhakrishnan",
            Hall::Rp => "Rajendra Prasad",
            Hall::SisterNivedita => "Sister Nivedita",
            Hall::Vs => "Vidyasagar",
        }
    }
}

impl fmt::Display for Hall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Hall {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Hall::ALL
            .into_iter()
            .find(|hall| hall.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("hall", value))
    }
}

/// Hall identifier and label pair rendered into select boxes.
#[derive(Debug, Clone, Serialize)]
pub struct HallOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// All halls as select options.
pub fn hall_options() -> Vec<HallOption> {
    Hall::ALL
        .into_iter()
        .map(|hall| HallOption {
            value: hall.as_str(),
            label: hall.label(),
        })
        .collect()
}
