//! Static catalog of game API operations.
//!
//! Each [`Endpoint`] variant maps to one immutable [`EndpointDescriptor`]
//! describing the protocol contract of that operation.
//!
//! | Group | Operations |
//! |-------|------------|
//! | Server | status, register |
//! | Agent | my agent, my account, list/get agents |
//! | Contracts | list/get/accept/deliver/fulfill |
//! | Universe | factions, systems, waypoints, market, shipyard, jump gate, construction |
//! | Fleet | ships, cargo, nav, orbit/dock, trade, extraction, scans, mounts |

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{BuildError, ValidationError};
use crate::http_client::HttpMethod;
use crate::shape::{PayloadShape, Shape};

/// Largest page size (and page window bound) the server accepts.
pub const MAX_PAGE_LIMIT: u32 = 20;

/// Token kind an endpoint must be called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    None,
    Account,
    Agent,
}

impl AuthKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Account => "account",
            Self::Agent => "agent",
        }
    }

    pub const fn is_required(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Display for AuthKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol contract of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Path template relative to the base URL, with `{name}` placeholders.
    pub path: &'static str,
    pub method: HttpMethod,
    pub auth: AuthKind,
    pub body: Option<Shape>,
    pub response: Option<PayloadShape>,
    pub paginated: bool,
}

impl EndpointDescriptor {
    const fn new(path: &'static str, method: HttpMethod, auth: AuthKind) -> Self {
        Self {
            path,
            method,
            auth,
            body: None,
            response: None,
            paginated: false,
        }
    }

    const fn get(path: &'static str, auth: AuthKind) -> Self {
        Self::new(path, HttpMethod::Get, auth)
    }

    const fn post(path: &'static str, auth: AuthKind) -> Self {
        Self::new(path, HttpMethod::Post, auth)
    }

    const fn patch(path: &'static str, auth: AuthKind) -> Self {
        Self::new(path, HttpMethod::Patch, auth)
    }

    const fn body(mut self, shape: Shape) -> Self {
        self.body = Some(shape);
        self
    }

    const fn returns(mut self, shape: Shape) -> Self {
        self.response = Some(PayloadShape::one(shape));
        self
    }

    /// Paginated list of `shape`.
    const fn pages_of(mut self, shape: Shape) -> Self {
        self.response = Some(PayloadShape::list(shape));
        self.paginated = true;
        self
    }

    const fn list_of(mut self, shape: Shape) -> Self {
        self.response = Some(PayloadShape::list(shape));
        self
    }

    /// Number of `{name}` placeholders in the path template.
    pub fn placeholder_count(&self) -> usize {
        placeholders(self.path).count()
    }

    pub fn placeholder_names(&self) -> Vec<&'static str> {
        placeholders(self.path).collect()
    }
}

fn placeholders(template: &'static str) -> impl Iterator<Item = &'static str> {
    template
        .split('{')
        .skip(1)
        .filter_map(|segment| segment.split_once('}').map(|(name, _)| name))
}

/// Concrete request path for `descriptor`.
///
/// `params` fill the placeholders in order and are percent-encoded. When the
/// descriptor is paginated and `page` is given as `(page, limit)`, the
/// `page`/`limit` query string is appended.
pub fn substitute_path(
    descriptor: &EndpointDescriptor,
    params: &[String],
    page: Option<(u32, u32)>,
) -> Result<String, BuildError> {
    let expected = descriptor.placeholder_count();
    if params.len() != expected {
        return Err(BuildError::ArityMismatch {
            expected,
            actual: params.len(),
        });
    }

    let mut path = String::with_capacity(descriptor.path.len() + 16);
    let mut values = params.iter();
    let mut rest = descriptor.path;
    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        if let Some(value) = values.next() {
            path.push_str(&urlencoding::encode(value));
        }
        rest = &rest[open + close + 1..];
    }
    path.push_str(rest);

    if let (true, Some((page, limit))) = (descriptor.paginated, page) {
        path.push_str(&format!("?page={page}&limit={limit}"));
    }

    Ok(path)
}

macro_rules! endpoints {
    ($($variant:ident => $name:literal => $descriptor:expr,)+) => {
        /// Closed catalog of game API operations.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Endpoint {
            $($variant,)+
        }

        impl Endpoint {
            pub const ALL: &'static [Endpoint] = &[$(Endpoint::$variant,)+];

            pub const fn descriptor(self) -> EndpointDescriptor {
                use AuthKind::{Account, Agent, None as Public};
                match self {
                    $(Self::$variant => $descriptor,)+
                }
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

endpoints! {
    GetStatus => "get-status" =>
        EndpointDescriptor::get("/", Public).returns(Shape::Status),
    Register => "register" =>
        EndpointDescriptor::post("/register", Account)
            .body(Shape::RegisterAgent)
            .returns(Shape::Registration),

    GetMyAgent => "get-my-agent" =>
        EndpointDescriptor::get("/my/agent", Agent).returns(Shape::Agent),
    GetMyAccount => "get-my-account" =>
        EndpointDescriptor::get("/my/account", Agent).returns(Shape::Account),
    ListAgents => "list-agents" =>
        EndpointDescriptor::get("/agents", Public).pages_of(Shape::Agent),
    GetAgent => "get-agent" =>
        EndpointDescriptor::get("/agents/{agentSymbol}", Public).returns(Shape::Agent),

    ListContracts => "list-contracts" =>
        EndpointDescriptor::get("/my/contracts", Agent).pages_of(Shape::Contract),
    GetContract => "get-contract" =>
        EndpointDescriptor::get("/my/contracts/{contractId}", Agent).returns(Shape::Contract),
    AcceptContract => "accept-contract" =>
        EndpointDescriptor::post("/my/contracts/{contractId}/accept", Agent)
            .returns(Shape::ContractAgreement),
    DeliverContract => "deliver-contract" =>
        EndpointDescriptor::post("/my/contracts/{contractId}/deliver", Agent)
            .body(Shape::DeliverCargo)
            .returns(Shape::ContractDelivery),
    FulfillContract => "fulfill-contract" =>
        EndpointDescriptor::post("/my/contracts/{contractId}/fulfill", Agent)
            .returns(Shape::ContractAgreement),

    ListFactions => "list-factions" =>
        EndpointDescriptor::get("/factions", Public).pages_of(Shape::Faction),
    GetFaction => "get-faction" =>
        EndpointDescriptor::get("/factions/{factionSymbol}", Public).returns(Shape::Faction),

    ListSystems => "list-systems" =>
        EndpointDescriptor::get("/systems", Public).pages_of(Shape::System),
    GetSystem => "get-system" =>
        EndpointDescriptor::get("/systems/{systemSymbol}", Public).returns(Shape::System),
    ListWaypoints => "list-waypoints" =>
        EndpointDescriptor::get("/systems/{systemSymbol}/waypoints", Public)
            .pages_of(Shape::Waypoint),
    GetWaypoint => "get-waypoint" =>
        EndpointDescriptor::get("/systems/{systemSymbol}/waypoints/{waypointSymbol}", Public)
            .returns(Shape::Waypoint),
    GetMarket => "get-market" =>
        EndpointDescriptor::get(
            "/systems/{systemSymbol}/waypoints/{waypointSymbol}/market",
            Public,
        )
        .returns(Shape::Market),
    GetShipyard => "get-shipyard" =>
        EndpointDescriptor::get(
            "/systems/{systemSymbol}/waypoints/{waypointSymbol}/shipyard",
            Public,
        )
        .returns(Shape::Shipyard),
    GetJumpGate => "get-jump-gate" =>
        EndpointDescriptor::get(
            "/systems/{systemSymbol}/waypoints/{waypointSymbol}/jump-gate",
            Public,
        )
        .returns(Shape::JumpGate),
    GetConstruction => "get-construction" =>
        EndpointDescriptor::get(
            "/systems/{systemSymbol}/waypoints/{waypointSymbol}/construction",
            Public,
        )
        .returns(Shape::Construction),
    SupplyConstruction => "supply-construction" =>
        EndpointDescriptor::post(
            "/systems/{systemSymbol}/waypoints/{waypointSymbol}/construction/supply",
            Agent,
        )
        .body(Shape::SupplyConstruction)
        .returns(Shape::ConstructionSupply),

    ListShips => "list-ships" =>
        EndpointDescriptor::get("/my/ships", Agent).pages_of(Shape::Ship),
    PurchaseShip => "purchase-ship" =>
        EndpointDescriptor::post("/my/ships", Agent)
            .body(Shape::PurchaseShip)
            .returns(Shape::ShipPurchase),
    GetShip => "get-ship" =>
        EndpointDescriptor::get("/my/ships/{shipSymbol}", Agent).returns(Shape::Ship),
    GetShipCargo => "get-ship-cargo" =>
        EndpointDescriptor::get("/my/ships/{shipSymbol}/cargo", Agent).returns(Shape::Cargo),
    GetShipNav => "get-ship-nav" =>
        EndpointDescriptor::get("/my/ships/{shipSymbol}/nav", Agent).returns(Shape::Nav),
    PatchShipNav => "patch-ship-nav" =>
        EndpointDescriptor::patch("/my/ships/{shipSymbol}/nav", Agent)
            .body(Shape::PatchShipNav)
            .returns(Shape::Nav),
    OrbitShip => "orbit-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/orbit", Agent).returns(Shape::NavUpdate),
    DockShip => "dock-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/dock", Agent).returns(Shape::NavUpdate),
    RefineShip => "refine-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/refine", Agent)
            .body(Shape::RefineShip)
            .returns(Shape::Refinement),
    CreateChart => "create-chart" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/chart", Agent).returns(Shape::Chart),
    GetShipCooldown => "get-ship-cooldown" =>
        EndpointDescriptor::get("/my/ships/{shipSymbol}/cooldown", Agent)
            .returns(Shape::Cooldown),
    CreateSurvey => "create-survey" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/survey", Agent).returns(Shape::Survey),
    ExtractResources => "extract-resources" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/extract", Agent)
            .returns(Shape::Extraction),
    SiphonResources => "siphon-resources" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/siphon", Agent)
            .returns(Shape::Extraction),
    JettisonCargo => "jettison-cargo" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/jettison", Agent)
            .body(Shape::TradeCargo)
            .returns(Shape::CargoUpdate),
    JumpShip => "jump-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/jump", Agent)
            .body(Shape::NavigateShip)
            .returns(Shape::Jump),
    NavigateShip => "navigate-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/navigate", Agent)
            .body(Shape::NavigateShip)
            .returns(Shape::Navigation),
    WarpShip => "warp-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/warp", Agent)
            .body(Shape::NavigateShip)
            .returns(Shape::Navigation),
    SellCargo => "sell-cargo" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/sell", Agent)
            .body(Shape::TradeCargo)
            .returns(Shape::Transaction),
    PurchaseCargo => "purchase-cargo" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/purchase", Agent)
            .body(Shape::TradeCargo)
            .returns(Shape::Transaction),
    TransferCargo => "transfer-cargo" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/transfer", Agent)
            .body(Shape::TransferCargo)
            .returns(Shape::CargoUpdate),
    RefuelShip => "refuel-ship" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/refuel", Agent)
            .body(Shape::RefuelShip)
            .returns(Shape::Refuel),
    ScanSystems => "scan-systems" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/scan/systems", Agent)
            .returns(Shape::SystemScan),
    ScanWaypoints => "scan-waypoints" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/scan/waypoints", Agent)
            .returns(Shape::WaypointScan),
    ScanShips => "scan-ships" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/scan/ships", Agent)
            .returns(Shape::ShipScan),
    NegotiateContract => "negotiate-contract" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/negotiate/contract", Agent)
            .returns(Shape::ContractNegotiation),
    GetMounts => "get-mounts" =>
        EndpointDescriptor::get("/my/ships/{shipSymbol}/mounts", Agent).list_of(Shape::Mount),
    InstallMount => "install-mount" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/mounts/install", Agent)
            .body(Shape::MountChange)
            .returns(Shape::MountUpdate),
    RemoveMount => "remove-mount" =>
        EndpointDescriptor::post("/my/ships/{shipSymbol}/mounts/remove", Agent)
            .body(Shape::MountChange)
            .returns(Shape::MountUpdate),
}

/// Descriptor for `endpoint`. Total over the closed catalog.
pub const fn lookup(endpoint: Endpoint) -> EndpointDescriptor {
    endpoint.descriptor()
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|endpoint| endpoint.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownEndpoint {
                value: value.to_owned(),
            })
    }
}
