//! Small helper functions for the order engine.

mod payment_proof;

pub use payment_proof::{sign_payment_proof, verify_payment_proof, PaymentProof};

use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderId;

pub const ORDER_ID_PREFIX: &str = "FEAST";
const ORDER_ID_SUFFIX_LEN: usize = 8;

/// Generates a new human-readable order id, e.g. `FEAST-9H27TQXK`.
pub fn new_order_id() -> OrderId {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(ORDER_ID_SUFFIX_LEN).map(|c| (c as char).to_ascii_uppercase()).collect();
    OrderId(format!("{ORDER_ID_PREFIX}-{suffix}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_ids_have_the_expected_shape() {
        let id = new_order_id();
        assert!(id.as_str().starts_with("FEAST-"));
        assert_eq!(id.as_str().len(), ORDER_ID_PREFIX.len() + 1 + ORDER_ID_SUFFIX_LEN);
        assert_ne!(new_order_id(), new_order_id());
    }
}
