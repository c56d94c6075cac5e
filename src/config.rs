use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Depth of the balance tree. 2^TREE_DEPTH accounts exist at genesis.
pub const TREE_DEPTH: usize = 5;

/// Bit-width `B` bounding every Paillier modulus, plaintext, ciphertext and
/// randomness value carried through the circuit.
pub const CIPHERTEXT_BITS: u64 = 62;

/// Poseidon configuration shared by the native and in-circuit field-hasher.
///
/// Round constants and the MDS matrix are ground fresh for the field via the
/// standard Grain LFSR construction (`find_poseidon_ark_and_mds`) rather than
/// compiled in, since a fixed placeholder matrix would collapse the
/// permutation. Rate 2 / capacity 1 matches the rate-1 absorption contract:
/// each call to the sponge absorbs at most two field elements per
/// permutation before squeezing.
pub fn poseidon_config<F: PrimeField>() -> PoseidonConfig<F> {
    let full_rounds = 8;
    let partial_rounds = 31;
    let alpha = 5u64;
    let rate = 2;
    let capacity = 1;

    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        rate,
        full_rounds as u64,
        partial_rounds as u64,
        0,
    );

    PoseidonConfig::new(full_rounds, partial_rounds, alpha, mds, ark, rate, capacity)
}
