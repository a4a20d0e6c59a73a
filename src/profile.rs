//! Premium rate dimensions and the exact-match profile built from them.

use std::fmt;
use std::str::FromStr;

use crate::error::{McpError, Result};

/// Official two-letter canton codes.
pub const CANTONS: &[&str] = &[
    "AG", "AI", "AR", "BE", "BL", "BS", "FR", "GE", "GL", "GR", "JU", "LU", "NE", "NW", "OW",
    "SG", "SH", "SO", "SZ", "TG", "TI", "UR", "VD", "VS", "ZG", "ZH",
];

/// Deductible steps in CHF across all age bands.
pub const DEDUCTIBLES: &[u32] = &[0, 100, 200, 300, 400, 500, 600, 1000, 1500, 2000, 2500];

const CHILD_DEDUCTIBLES: &[u32] = &[0, 100, 200, 300, 400, 500, 600];
const ADULT_DEDUCTIBLES: &[u32] = &[300, 500, 1000, 1500, 2000, 2500];

/// First year with published premium data.
pub const FIRST_YEAR: i32 = 2016;
/// Last year probed for premium data.
pub const LAST_YEAR: i32 = 2026;

/// Validate and uppercase a canton code.
pub fn parse_canton(raw: &str) -> Result<String> {
    let canton = raw.trim().to_uppercase();
    if CANTONS.contains(&canton.as_str()) {
        Ok(canton)
    } else {
        Err(McpError::invalid_arg(
            "canton",
            format!("'{}' is not a Swiss canton code", raw),
        ))
    }
}

/// Age band used as a rate dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBand {
    /// 0 to 18 years
    Child,
    /// 19 to 25 years
    YoungAdult,
    /// 26 years and older
    Adult,
}

impl AgeBand {
    /// All bands, in schema order.
    pub const ALL: [AgeBand; 3] = [AgeBand::Child, AgeBand::YoungAdult, AgeBand::Adult];

    /// Value stored in the `age_band` column.
    pub fn as_str(self) -> &'static str {
        match self {
            AgeBand::Child => "0-18",
            AgeBand::YoungAdult => "19-25",
            AgeBand::Adult => "26+",
        }
    }

    /// Deductible steps offered for this band.
    pub fn deductibles(self) -> &'static [u32] {
        match self {
            AgeBand::Child => CHILD_DEDUCTIBLES,
            AgeBand::YoungAdult | AgeBand::Adult => ADULT_DEDUCTIBLES,
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeBand {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self> {
        AgeBand::ALL
            .into_iter()
            .find(|band| band.as_str() == s.trim())
            .ok_or_else(|| {
                McpError::invalid_arg(
                    "age_band",
                    format!("'{}' is not one of 0-18, 19-25, 26+", s),
                )
            })
    }
}

/// Insurance plan type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Model {
    /// Free choice of doctor
    #[default]
    Standard,
    /// Health maintenance organisation
    Hmo,
    /// Telemedicine hotline first
    Telmed,
    /// Family doctor first
    FamilyDoctor,
    /// Any other alternative model
    Other,
}

impl Model {
    /// All models, in schema order.
    pub const ALL: [Model; 5] = [
        Model::Standard,
        Model::Hmo,
        Model::Telmed,
        Model::FamilyDoctor,
        Model::Other,
    ];

    /// Value stored in the `model` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Model::Standard => "standard",
            Model::Hmo => "hmo",
            Model::Telmed => "telmed",
            Model::FamilyDoctor => "family_doctor",
            Model::Other => "other",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Model::ALL
            .into_iter()
            .find(|model| model.as_str() == wanted)
            .ok_or_else(|| {
                McpError::invalid_arg(
                    "model",
                    format!(
                        "'{}' is not one of standard, hmo, telmed, family_doctor, other",
                        s
                    ),
                )
            })
    }
}

/// Check a deductible against the steps offered for the band.
pub fn check_deductible(band: AgeBand, franchise: u32) -> Result<u32> {
    if band.deductibles().contains(&franchise) {
        Ok(franchise)
    } else {
        Err(McpError::invalid_arg(
            "franchise",
            format!(
                "CHF {} is not offered for age band {} (allowed: {:?})",
                franchise,
                band,
                band.deductibles()
            ),
        ))
    }
}

/// Rate dimensions shared by every premium query except the year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Uppercased canton code
    pub canton: String,
    /// Age band
    pub age_band: AgeBand,
    /// Deductible in CHF
    pub franchise: u32,
    /// Insurance model
    pub model: Model,
    /// Whether accident coverage is included
    pub accident: bool,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "canton {}, age band {}, deductible CHF {}, model {}, accident coverage {}",
            self.canton,
            self.age_band,
            self.franchise,
            self.model,
            if self.accident { "included" } else { "excluded" }
        )
    }
}
