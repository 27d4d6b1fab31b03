//! Typed request bodies and a subset of response payloads.
//!
//! The game's full JSON schema is large and mostly inert data; only the
//! shapes the client itself needs to name are modeled here. Any other shape
//! can be decoded by implementing [`ApiPayload`](crate::ApiPayload) for a
//! caller-defined type, or read raw through `Response::raw`.

mod bodies;
mod payloads;

pub use bodies::{
    DeliverCargo, MountChange, NavigateShip, PatchShipNav, PurchaseShip, RefineShip,
    RefuelShip, RegisterAgent, SupplyConstruction, TradeCargo, TransferCargo,
};
pub use payloads::{
    Agent, Contract, ContractAgreement, Cooldown, Faction, Registration, ServerStatus, ShipSummary,
    System, Waypoint,
};
