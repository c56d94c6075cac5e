pub mod gadget;
pub mod native;

pub use gadget::*;
pub use native::*;

use crate::config::poseidon_config;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use once_cell::sync::Lazy;

/// Shared, pre-ground Poseidon configuration for the circuit's field of
/// discourse (BN254's scalar field). Generated once and reused by every
/// caller rather than re-grinding the MDS matrix per hash.
pub static BN254_POSEIDON_CONFIG: Lazy<PoseidonConfig<Fr>> = Lazy::new(poseidon_config::<Fr>);

pub fn hash_fr(inputs: &[Fr]) -> Fr {
    native::hash(&BN254_POSEIDON_CONFIG, inputs)
}

pub fn hash_leaf_fr(n: Fr, g: Fr, enc_balance: Fr) -> Fr {
    native::hash_leaf(&BN254_POSEIDON_CONFIG, n, g, enc_balance)
}

pub fn hash_node_fr(left: Fr, right: Fr) -> Fr {
    native::hash_node(&BN254_POSEIDON_CONFIG, left, right)
}
