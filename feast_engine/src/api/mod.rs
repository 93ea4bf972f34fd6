pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
pub mod query_api;
pub mod settlement_api;
pub mod settlement_objects;
