//! Named JSON shapes exchanged with the game API.
//!
//! Every endpoint declares the shape of the body it accepts and of the
//! payload it returns. Request bodies and decoded payloads carry the same tag
//! through [`RequestBody::SHAPE`] and [`ApiPayload::SHAPE`], so a mismatch is
//! caught before a request is sent or before JSON is reinterpreted as the
//! wrong type.

use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Closed set of request and response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    // request bodies
    RegisterAgent,
    DeliverCargo,
    SupplyConstruction,
    PurchaseShip,
    PatchShipNav,
    RefineShip,
    TradeCargo,
    TransferCargo,
    NavigateShip,
    RefuelShip,
    MountChange,

    // response payloads
    Status,
    Registration,
    Agent,
    Account,
    Contract,
    ContractAgreement,
    ContractDelivery,
    ContractNegotiation,
    Faction,
    System,
    Waypoint,
    Market,
    Shipyard,
    JumpGate,
    Construction,
    ConstructionSupply,
    Ship,
    ShipPurchase,
    Cargo,
    Nav,
    NavUpdate,
    Refinement,
    Chart,
    Cooldown,
    Survey,
    Extraction,
    CargoUpdate,
    Jump,
    Navigation,
    Transaction,
    Refuel,
    SystemScan,
    WaypointScan,
    ShipScan,
    Mount,
    MountUpdate,
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Declared response payload: one object of `shape`, or an array of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadShape {
    pub shape: Shape,
    pub list: bool,
}

impl PayloadShape {
    pub const fn one(shape: Shape) -> Self {
        Self { shape, list: false }
    }

    pub const fn list(shape: Shape) -> Self {
        Self { shape, list: true }
    }

    /// Shape of one element of a list payload.
    pub const fn item(self) -> Self {
        Self::one(self.shape)
    }
}

impl Display for PayloadShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.list {
            write!(f, "[{}]", self.shape)
        } else {
            write!(f, "{}", self.shape)
        }
    }
}

/// A typed request body.
pub trait RequestBody: Serialize {
    const SHAPE: Shape;
}

/// A typed response payload.
pub trait ApiPayload: DeserializeOwned {
    const SHAPE: PayloadShape;
}

impl<T: ApiPayload> ApiPayload for Vec<T> {
    const SHAPE: PayloadShape = PayloadShape::list(T::SHAPE.shape);
}
