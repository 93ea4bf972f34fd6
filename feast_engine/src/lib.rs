//! Feast Order Engine
//!
//! The order engine is the core of the Feast marketplace backend. It coordinates food orders between customers,
//! sellers and the payment gateway, and it is provider-agnostic: any storage backend implementing the traits in
//! [`mod@traits`] can drive it.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the bundled backend. You should never need to
//!    access the database directly; use the public APIs instead. The exception is the data types used in the
//!    database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). `OrderFlowApi` is the order state machine, `PaymentApi` verifies gateway
//!    payment proofs and creates orders, `SettlementApi` derives seller payouts, and `OrderQueryApi` serves
//!    read-only lookups.
//! 3. The event hooks ([`mod@events`]). Accepted transitions and order creations are published to subscribers over
//!    a simple actor-style channel, so that notification fan-out never blocks (or fails) the triggering operation.

pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    errors::{OrderFlowError, PaymentApiError, SettlementError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::{PaymentApi, PaymentConfig},
    query_api::OrderQueryApi,
    settlement_api::{SettlementApi, SettlementConfig},
    settlement_objects,
};
