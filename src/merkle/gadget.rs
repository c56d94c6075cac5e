//! In-circuit inclusion-proof verification, ported from the original
//! `VerifyProof` loop: the leaf index's bits are taken most-significant
//! first and consumed one per level, starting at the leaf and walking up to
//! the root, selecting which side of [`hash_node_gadget`] each running
//! digest occupies.

use crate::field_hash::hash_node_gadget;
use ark_crypto_primitives::sponge::{poseidon::PoseidonConfig, Absorb};
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::gr1cs::{ConstraintSystemRef, SynthesisError};

const LOG_TARGET: &str = "merkle::gadget";

/// Enforces that `path[0]` (the leaf's own digest) is included under `root`
/// at `index`, given `path[1..=depth]` as the leaf-to-root sibling chain.
///
/// `index` is decomposed into exactly `depth` bits (little-endian, per
/// [`ToBitsGadget::to_bits_le`]) and reversed, so the first bit consumed is
/// the index's most-significant one — matching the source loop's
/// `reverseSlice(ToBinary(index, depth))` exactly.
pub fn verify_proof<F: PrimeField + Absorb>(
    cs: ConstraintSystemRef<F>,
    config: &PoseidonConfig<F>,
    path: &[FpVar<F>],
    index: &FpVar<F>,
    root: &FpVar<F>,
    depth: usize,
) -> Result<(), SynthesisError> {
    assert_eq!(path.len(), depth + 1, "path must hold one leaf digest plus depth siblings");

    let mut index_bits = index.to_bits_le()?;
    index_bits.truncate(depth);
    index_bits.reverse();

    let mut sum = path[0].clone();
    for (level, bit) in index_bits.iter().enumerate() {
        let sibling = &path[level + 1];
        let left = FpVar::conditionally_select(bit, &sum, sibling)?;
        let right = FpVar::conditionally_select(bit, sibling, &sum)?;
        sum = hash_node_gadget(cs.clone(), config, &left, &right)?;
    }

    sum.enforce_equal(root)?;
    tracing::trace!(target: LOG_TARGET, depth, "merkle proof constrained");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::poseidon_config;
    use crate::merkle::native::{BalanceLeaf, Content, MerkleTree};
    use ark_bn254::Fr;
    use ark_relations::gr1cs::ConstraintSystem;

    #[test]
    fn gadget_accepts_a_genuine_inclusion_proof() {
        let config = poseidon_config::<Fr>();
        let leaves: Vec<Fr> = (0..4u64)
            .map(|i| {
                BalanceLeaf {
                    n: Fr::from(100 + i),
                    g: Fr::from(200 + i),
                    enc_balance: Fr::from(300 + i),
                }
                .digest()
            })
            .collect();
        let tree = MerkleTree::build(2, &leaves);
        let proof = tree.proof(3);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let path_vars: Vec<FpVar<Fr>> = proof
            .path
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let index_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(proof.index as u64))).unwrap();
        let root_var = FpVar::new_input(cs.clone(), || Ok(proof.root)).unwrap();

        verify_proof(cs.clone(), &config, &path_vars, &index_var, &root_var, 2).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn gadget_rejects_a_tampered_sibling() {
        let config = poseidon_config::<Fr>();
        let leaves: Vec<Fr> = (0..4u64)
            .map(|i| {
                BalanceLeaf {
                    n: Fr::from(100 + i),
                    g: Fr::from(200 + i),
                    enc_balance: Fr::from(300 + i),
                }
                .digest()
            })
            .collect();
        let tree = MerkleTree::build(2, &leaves);
        let mut proof = tree.proof(3);
        proof.path[1] += Fr::from(1u64);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let path_vars: Vec<FpVar<Fr>> = proof
            .path
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();
        let index_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(proof.index as u64))).unwrap();
        let root_var = FpVar::new_input(cs.clone(), || Ok(proof.root)).unwrap();

        verify_proof(cs.clone(), &config, &path_vars, &index_var, &root_var, 2).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
