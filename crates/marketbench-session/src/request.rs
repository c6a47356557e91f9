//! Wire payloads for the four state-changing marketplace operations.
//!
//! Field names match what the marketplace application reads from the JSON
//! body. Each struct serializes to exactly its documented field set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound of an acceptable listing price, inclusive.
pub const ITEM_MIN_PRICE: i64 = 100;

/// Upper bound of an acceptable listing price, inclusive.
pub const ITEM_MAX_PRICE: i64 = 1_000_000;

/// Whether `price` is accepted by the marketplace's listing rules.
pub fn price_in_bounds(price: i64) -> bool {
    (ITEM_MIN_PRICE..=ITEM_MAX_PRICE).contains(&price)
}

/// The four operations a negative case can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Login,
    Sell,
    Buy,
    Ship,
}

impl Operation {
    /// Request path on the application URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Sell => "/sell",
            Self::Buy => "/buy",
            Self::Ship => "/ship",
        }
    }

    /// Method and path, as shown in diagnostics.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Login => "POST /login",
            Self::Sell => "POST /sell",
            Self::Buy => "POST /buy",
            Self::Ship => "POST /ship",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// `POST /login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub account_name: String,
    pub password: String,
}

/// `POST /sell` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellRequest {
    pub csrf_token: String,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
}

/// `POST /buy` body. `token` is the payment-service card token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    pub csrf_token: String,
    pub item_id: i64,
    pub token: String,
}

/// `POST /ship` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipRequest {
    pub csrf_token: String,
    pub item_id: i64,
}

/// One request payload, tagged with the operation it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationRequest {
    Login(LoginRequest),
    Sell(SellRequest),
    Buy(BuyRequest),
    Ship(ShipRequest),
}

impl OperationRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Login(_) => Operation::Login,
            Self::Sell(_) => Operation::Sell,
            Self::Buy(_) => Operation::Buy,
            Self::Ship(_) => Operation::Ship,
        }
    }

    /// Serialize to the JSON request body.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl From<LoginRequest> for OperationRequest {
    fn from(req: LoginRequest) -> Self {
        Self::Login(req)
    }
}

impl From<SellRequest> for OperationRequest {
    fn from(req: SellRequest) -> Self {
        Self::Sell(req)
    }
}

impl From<BuyRequest> for OperationRequest {
    fn from(req: BuyRequest) -> Self {
        Self::Buy(req)
    }
}

impl From<ShipRequest> for OperationRequest {
    fn from(req: ShipRequest) -> Self {
        Self::Ship(req)
    }
}
