//! Request/response bodies for the transfer HTTP façade.

use crate::setup;
use ark_bn254::Fr;
use ark_groth16::Proof;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct TransferRequest {
    pub from_index: usize,
    pub to_index: usize,
    /// Decimal string so amounts aren't bounded by a 64-bit JSON number.
    pub amount: String,
}

/// The proof-data document from §6: a mapping of 8 proof hex strings and 14
/// public-input hex strings, each `0x`-prefixed.
#[derive(Serialize)]
pub struct ProofResponse {
    pub proof: [String; 8],
    pub inputs: [String; 14],
}

impl ProofResponse {
    pub fn new(proof: &Proof<ark_bn254::Bn254>, public_inputs: &[Fr; 14]) -> Self {
        ProofResponse {
            proof: setup::encode_proof(proof),
            inputs: setup::encode_inputs(public_inputs),
        }
    }
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub index: usize,
    pub n: String,
    pub g: String,
    pub enc_balance: String,
}

#[derive(Serialize)]
pub struct RootResponse {
    pub root: String,
}
