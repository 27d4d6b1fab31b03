use serde::{Deserialize, Serialize};

use crate::shape::{ApiPayload, PayloadShape, Shape};
use crate::UtcDateTime;

macro_rules! payload {
    ($($ty:ident => $shape:ident),+ $(,)?) => {
        $(impl ApiPayload for $ty {
            const SHAPE: PayloadShape = PayloadShape::one(Shape::$shape);
        })+
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub reset_date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(default)]
    pub account_id: Option<String>,
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    pub starting_faction: String,
    #[serde(default)]
    pub ship_count: u32,
}

/// Result of registering a new agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub token: String,
    pub agent: Agent,
    #[serde(default)]
    pub contract: Option<Contract>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub faction_symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub accepted: bool,
    pub fulfilled: bool,
    #[serde(default)]
    pub deadline_to_accept: Option<UtcDateTime>,
}

/// Agent and contract returned by accept and fulfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAgreement {
    pub agent: Agent,
    pub contract: Contract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub is_recruiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub symbol: String,
    pub sector_symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub system_symbol: String,
    pub x: i64,
    pub y: i64,
}

/// Identity of a ship; the full ship document is left undecoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipSummary {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    pub ship_symbol: String,
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    #[serde(default)]
    pub expiration: Option<UtcDateTime>,
}

payload! {
    ServerStatus => Status,
    Agent => Agent,
    Registration => Registration,
    Contract => Contract,
    ContractAgreement => ContractAgreement,
    Faction => Faction,
    System => System,
    Waypoint => Waypoint,
    ShipSummary => Ship,
    Cooldown => Cooldown,
}
