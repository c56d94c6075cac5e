use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{constraints::PoseidonSpongeVar, PoseidonConfig},
    Absorb,
};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::gr1cs::{ConstraintSystemRef, SynthesisError};

const LOG_TARGET: &str = "field_hash::gadget";

/// In-circuit counterpart of [`super::native::hash`]: absorbs `inputs` in
/// order into a fresh Poseidon sponge and returns the single squeezed
/// element. Leaf and node digests share this gadget with no domain tag.
pub fn hash_gadget<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    config: &PoseidonConfig<F>,
    inputs: &[FpVar<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, config);
    sponge.absorb(&inputs.to_vec())?;
    let squeezed = sponge.squeeze_field_elements(1)?;
    tracing::trace!(target: LOG_TARGET, arity = inputs.len(), "absorbed and squeezed in-circuit");
    Ok(squeezed[0].clone())
}

pub fn hash_leaf_gadget<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    config: &PoseidonConfig<F>,
    n: &FpVar<F>,
    g: &FpVar<F>,
    enc_balance: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    hash_gadget(cs, config, &[n.clone(), g.clone(), enc_balance.clone()])
}

pub fn hash_node_gadget<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    config: &PoseidonConfig<F>,
    left: &FpVar<F>,
    right: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    hash_gadget(cs, config, &[left.clone(), right.clone()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::poseidon_config;
    use crate::field_hash::native;
    use ark_bn254::Fr;
    use ark_r1cs_std::{alloc::AllocVar, R1CSVar};
    use ark_relations::gr1cs::ConstraintSystem;

    #[test]
    fn gadget_agrees_with_native_leaf_hash() {
        let config = poseidon_config::<Fr>();
        let cs = ConstraintSystem::<Fr>::new_ref();

        let n = Fr::from(17u64);
        let g = Fr::from(18u64);
        let enc = Fr::from(19u64);

        let n_var = FpVar::new_witness(cs.clone(), || Ok(n)).unwrap();
        let g_var = FpVar::new_witness(cs.clone(), || Ok(g)).unwrap();
        let enc_var = FpVar::new_witness(cs.clone(), || Ok(enc)).unwrap();

        let digest_var = hash_leaf_gadget(cs.clone(), &config, &n_var, &g_var, &enc_var).unwrap();
        let expected = native::hash_leaf(&config, n, g, enc);

        assert_eq!(digest_var.value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }
}
