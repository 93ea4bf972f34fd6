//! Gateway payment proof verification.
//!
//! The payment gateway signs `"{gateway_order_id}|{gateway_payment_id}"` with HMAC-SHA256 under a secret shared
//! with this server, and supplies the signature as lowercase hex. Verification recomputes the MAC and compares via
//! [`Mac::verify_slice`], which is constant-time, so a tampered signature cannot be probed byte by byte.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The proof supplied by the payment gateway callback for an online payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProof {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    /// Hex-encoded HMAC-SHA256 signature over `"{gateway_order_id}|{gateway_payment_id}"`.
    pub signature: String,
}

/// Returns true iff the proof's signature matches the recomputed HMAC.
pub fn verify_payment_proof(secret: &str, proof: &PaymentProof) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(signing_payload(&proof.gateway_order_id, &proof.gateway_payment_id).as_bytes());
    match hex::decode(proof.signature.trim()) {
        Ok(sig) => mac.verify_slice(&sig).is_ok(),
        Err(_) => false,
    }
}

/// Produce the signature the gateway would attach to a proof. Used by the gateway simulator and the test suites.
pub fn sign_payment_proof(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(signing_payload(gateway_order_id, gateway_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn signing_payload(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    format!("{gateway_order_id}|{gateway_payment_id}")
}
