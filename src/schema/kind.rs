use crate::error::PassError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pass style; decides which kind sub-object the descriptor carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassKind {
    BoardingPass,
    Coupon,
    EventTicket,
    Generic,
    StoreCard,
}

impl PassKind {
    /// Every kind, in the order descriptor import scans for them
    pub const ALL: [PassKind; 5] = [
        PassKind::BoardingPass,
        PassKind::Coupon,
        PassKind::EventTicket,
        PassKind::Generic,
        PassKind::StoreCard,
    ];

    /// Key of the kind sub-object in `pass.json`
    pub fn as_str(self) -> &'static str {
        match self {
            PassKind::BoardingPass => "boardingPass",
            PassKind::Coupon => "coupon",
            PassKind::EventTicket => "eventTicket",
            PassKind::Generic => "generic",
            PassKind::StoreCard => "storeCard",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassKind {
    type Err = PassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PassError::InvalidKind(s.to_string()))
    }
}

/// Transport mode of a boarding pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitType {
    #[serde(rename = "PKTransitTypeAir")]
    Air,
    #[serde(rename = "PKTransitTypeBoat")]
    Boat,
    #[serde(rename = "PKTransitTypeBus")]
    Bus,
    #[serde(rename = "PKTransitTypeGeneric")]
    Generic,
    #[serde(rename = "PKTransitTypeTrain")]
    Train,
}

impl TransitType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitType::Air => "PKTransitTypeAir",
            TransitType::Boat => "PKTransitTypeBoat",
            TransitType::Bus => "PKTransitTypeBus",
            TransitType::Generic => "PKTransitTypeGeneric",
            TransitType::Train => "PKTransitTypeTrain",
        }
    }
}

impl fmt::Display for TransitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitType {
    type Err = PassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            TransitType::Air,
            TransitType::Boat,
            TransitType::Bus,
            TransitType::Generic,
            TransitType::Train,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| PassError::InvalidTransitType(s.to_string()))
    }
}
