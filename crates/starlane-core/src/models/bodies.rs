use serde::{Deserialize, Serialize};

use crate::shape::{RequestBody, Shape};

macro_rules! request_body {
    ($($ty:ident => $shape:ident),+ $(,)?) => {
        $(impl RequestBody for $ty {
            const SHAPE: Shape = Shape::$shape;
        })+
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgent {
    pub symbol: String,
    pub faction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverCargo {
    pub ship_symbol: String,
    pub trade_symbol: String,
    pub units: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyConstruction {
    pub ship_symbol: String,
    pub trade_symbol: String,
    pub units: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseShip {
    pub ship_type: String,
    pub waypoint_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchShipNav {
    pub flight_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineShip {
    pub produce: String,
}

/// Sell, purchase and jettison all take a trade symbol and unit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeCargo {
    pub symbol: String,
    pub units: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCargo {
    pub trade_symbol: String,
    pub units: u32,
    pub ship_symbol: String,
}

/// Target of a navigate, warp or jump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateShip {
    pub waypoint_symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelShip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_cargo: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountChange {
    pub symbol: String,
}

request_body! {
    RegisterAgent => RegisterAgent,
    DeliverCargo => DeliverCargo,
    SupplyConstruction => SupplyConstruction,
    PurchaseShip => PurchaseShip,
    PatchShipNav => PatchShipNav,
    RefineShip => RefineShip,
    TradeCargo => TradeCargo,
    TransferCargo => TransferCargo,
    RefuelShip => RefuelShip,
    MountChange => MountChange,
}

// jump and warp reuse the navigate body
impl RequestBody for NavigateShip {
    const SHAPE: Shape = Shape::NavigateShip;
}
