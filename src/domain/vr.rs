//! Value representations
//!
//! Every VR is an explicit variant and [`Vr::class`] is an exhaustive match, so adding a VR
//! forces a decision about how it is cleaned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DICOM value representation
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vr {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FD,
    FL,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OV,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    SV,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    UV,
}

/// Semantic family of a VR, which decides the cleaning substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrClass {
    Date,
    Time,
    DateTime,
    Uid,
    /// Numbers encoded as decimal/integer strings (DS, IS)
    NumericString,
    /// Numbers encoded as binary integers or floats
    Numeric,
    Binary,
    Sequence,
    Text,
}

impl Vr {
    /// Semantic family of this VR
    pub fn class(&self) -> VrClass {
        match self {
            Vr::DA => VrClass::Date,
            Vr::TM => VrClass::Time,
            Vr::DT => VrClass::DateTime,
            Vr::UI => VrClass::Uid,
            Vr::DS | Vr::IS => VrClass::NumericString,
            Vr::FD | Vr::FL | Vr::SL | Vr::SS | Vr::SV | Vr::UL | Vr::US | Vr::UV => {
                VrClass::Numeric
            }
            Vr::OB | Vr::OD | Vr::OF | Vr::OL | Vr::OV | Vr::OW | Vr::UN => VrClass::Binary,
            Vr::SQ => VrClass::Sequence,
            Vr::AE
            | Vr::AS
            | Vr::AT
            | Vr::CS
            | Vr::LO
            | Vr::LT
            | Vr::PN
            | Vr::SH
            | Vr::ST
            | Vr::UC
            | Vr::UR
            | Vr::UT => VrClass::Text,
        }
    }

    /// Maximum length in characters of one value, for the short-string VRs
    pub fn max_length(&self) -> Option<usize> {
        match self {
            Vr::AS => Some(4),
            Vr::AT => Some(8),
            Vr::AE | Vr::CS | Vr::SH => Some(16),
            Vr::LO | Vr::PN | Vr::UI => Some(64),
            _ => None,
        }
    }

    /// Two-letter code
    pub fn as_str(&self) -> &'static str {
        match self {
            Vr::AE => "AE",
            Vr::AS => "AS",
            Vr::AT => "AT",
            Vr::CS => "CS",
            Vr::DA => "DA",
            Vr::DS => "DS",
            Vr::DT => "DT",
            Vr::FD => "FD",
            Vr::FL => "FL",
            Vr::IS => "IS",
            Vr::LO => "LO",
            Vr::LT => "LT",
            Vr::OB => "OB",
            Vr::OD => "OD",
            Vr::OF => "OF",
            Vr::OL => "OL",
            Vr::OV => "OV",
            Vr::OW => "OW",
            Vr::PN => "PN",
            Vr::SH => "SH",
            Vr::SL => "SL",
            Vr::SQ => "SQ",
            Vr::SS => "SS",
            Vr::ST => "ST",
            Vr::SV => "SV",
            Vr::TM => "TM",
            Vr::UC => "UC",
            Vr::UI => "UI",
            Vr::UL => "UL",
            Vr::UN => "UN",
            Vr::UR => "UR",
            Vr::US => "US",
            Vr::UT => "UT",
            Vr::UV => "UV",
        }
    }
}

impl fmt::Display for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vr = match s {
            "AE" => Vr::AE,
            "AS" => Vr::AS,
            "AT" => Vr::AT,
            "CS" => Vr::CS,
            "DA" => Vr::DA,
            "DS" => Vr::DS,
            "DT" => Vr::DT,
            "FD" => Vr::FD,
            "FL" => Vr::FL,
            "IS" => Vr::IS,
            "LO" => Vr::LO,
            "LT" => Vr::LT,
            "OB" => Vr::OB,
            "OD" => Vr::OD,
            "OF" => Vr::OF,
            "OL" => Vr::OL,
            "OV" => Vr::OV,
            "OW" => Vr::OW,
            "PN" => Vr::PN,
            "SH" => Vr::SH,
            "SL" => Vr::SL,
            "SQ" => Vr::SQ,
            "SS" => Vr::SS,
            "ST" => Vr::ST,
            "SV" => Vr::SV,
            "TM" => Vr::TM,
            "UC" => Vr::UC,
            "UI" => Vr::UI,
            "UL" => Vr::UL,
            "UN" => Vr::UN,
            "UR" => Vr::UR,
            "US" => Vr::US,
            "UT" => Vr::UT,
            "UV" => Vr::UV,
            other => return Err(format!("Unknown value representation '{other}'")),
        };
        Ok(vr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vr_round_trip_through_text() {
        for code in ["AE", "DA", "SQ", "UI", "OW", "UV"] {
            let vr: Vr = code.parse().unwrap();
            assert_eq!(vr.as_str(), code);
        }
        assert!("XX".parse::<Vr>().is_err());
        assert!("da".parse::<Vr>().is_err());
    }

    #[test]
    fn test_vr_classes() {
        assert_eq!(Vr::DA.class(), VrClass::Date);
        assert_eq!(Vr::TM.class(), VrClass::Time);
        assert_eq!(Vr::DT.class(), VrClass::DateTime);
        assert_eq!(Vr::UI.class(), VrClass::Uid);
        assert_eq!(Vr::IS.class(), VrClass::NumericString);
        assert_eq!(Vr::US.class(), VrClass::Numeric);
        assert_eq!(Vr::OB.class(), VrClass::Binary);
        assert_eq!(Vr::SQ.class(), VrClass::Sequence);
        assert_eq!(Vr::PN.class(), VrClass::Text);
    }

    #[test]
    fn test_max_length() {
        assert_eq!(Vr::SH.max_length(), Some(16));
        assert_eq!(Vr::AS.max_length(), Some(4));
        assert_eq!(Vr::LO.max_length(), Some(64));
        assert_eq!(Vr::UT.max_length(), None);
    }
}
