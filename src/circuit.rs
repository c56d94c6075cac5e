//! The transfer relation: two leaves move from an old balance tree to a new
//! one, with the sender's ciphertext freshly re-encrypted and the receiver's
//! ciphertext homomorphically bumped, both under unchanged public keys.

use crate::config::{CIPHERTEXT_BITS, TREE_DEPTH};
use crate::field_hash::{hash_leaf_gadget, BN254_POSEIDON_CONFIG};
use crate::merkle::verify_proof;
use crate::paillier::gadget::{add as paillier_add, encrypt as paillier_encrypt, PublicKeyVar};
use ark_bn254::Fr;
use ark_r1cs_std::{alloc::AllocVar, fields::fp::FpVar, prelude::*};
use ark_relations::gr1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

const LOG_TARGET: &str = "transfer::circuit";

/// One of the four `(N, G, EncBalance)` triples carried as public input.
#[derive(Clone, Debug)]
pub struct LeafInput {
    pub n: Fr,
    pub g: Fr,
    pub enc_balance: Fr,
}

/// A single leaf's Merkle path: own digest (`path[0]`) plus `TREE_DEPTH`
/// sibling digests, and the packed leaf index.
#[derive(Clone, Debug)]
pub struct MerkleWitness {
    pub path: Vec<Fr>,
    pub index: usize,
}

/// Full private+public witness for one transfer. Built by
/// `crate::witness::build_transfer_witness`.
#[derive(Clone)]
pub struct TransferCircuit {
    // Public inputs, in the canonical 14-element order.
    pub old_root: Fr,
    pub new_root: Fr,
    pub old_from: LeafInput,
    pub old_to: LeafInput,
    pub new_from: LeafInput,
    pub new_to: LeafInput,

    // Private witness.
    pub old_from_balance: Fr,
    pub r_old_from: Fr,
    pub r_new_from: Fr,
    pub amount: Fr,
    pub r_amount: Fr,
    pub old_from_mp: MerkleWitness,
    pub old_to_mp: MerkleWitness,
    pub new_from_mp: MerkleWitness,
    pub new_to_mp: MerkleWitness,
}

/// The 14 public inputs in the order `generate_constraints` allocates them,
/// for callers assembling a `groth16::prove`-ready vector.
impl TransferCircuit {
    pub fn public_inputs(&self) -> [Fr; 14] {
        [
            self.old_root,
            self.new_root,
            self.old_from.n,
            self.old_from.g,
            self.old_from.enc_balance,
            self.old_to.n,
            self.old_to.g,
            self.old_to.enc_balance,
            self.new_from.n,
            self.new_from.g,
            self.new_from.enc_balance,
            self.new_to.n,
            self.new_to.g,
            self.new_to.enc_balance,
        ]
    }
}

fn alloc_leaf(
    cs: ConstraintSystemRef<Fr>,
    leaf: &LeafInput,
) -> Result<(PublicKeyVar<Fr>, FpVar<Fr>), SynthesisError> {
    let n = FpVar::new_input(cs.clone(), || Ok(leaf.n))?;
    let g = FpVar::new_input(cs.clone(), || Ok(leaf.g))?;
    let enc_balance = FpVar::new_input(cs, || Ok(leaf.enc_balance))?;
    Ok((PublicKeyVar { n, g }, enc_balance))
}

/// Asserts `a <= b` given both are `< 2^CIPHERTEXT_BITS`: `b - a` must fit in
/// `CIPHERTEXT_BITS` bits, which only holds without field wraparound when
/// `a <= b`.
fn assert_le(cs: ConstraintSystemRef<Fr>, a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let diff = b - a;
    let bits = diff.to_bits_le()?;
    for bit in &bits[CIPHERTEXT_BITS as usize..] {
        bit.enforce_equal(&Boolean::constant(false))?;
    }
    let _ = cs;
    Ok(())
}

fn verify_leaf_membership(
    cs: ConstraintSystemRef<Fr>,
    leaf_n: &FpVar<Fr>,
    leaf_g: &FpVar<Fr>,
    leaf_enc: &FpVar<Fr>,
    root: &FpVar<Fr>,
    mp: &MerkleWitness,
) -> Result<(), SynthesisError> {
    assert_eq!(mp.path.len(), TREE_DEPTH + 1);
    let config = &*BN254_POSEIDON_CONFIG;

    let leaf_digest = hash_leaf_gadget(cs.clone(), config, leaf_n, leaf_g, leaf_enc)?;
    let path_vars: Vec<FpVar<Fr>> = mp
        .path
        .iter()
        .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)))
        .collect::<Result<_, _>>()?;
    path_vars[0].enforce_equal(&leaf_digest)?;

    let index_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(mp.index as u64)))?;
    verify_proof(cs, config, &path_vars, &index_var, root, TREE_DEPTH)
}

impl ConstraintSynthesizer<Fr> for TransferCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        crate::track_constraints!(&cs, "transfer circuit", LOG_TARGET, {
            let old_root = FpVar::new_input(cs.clone(), || Ok(self.old_root))?;
            let new_root = FpVar::new_input(cs.clone(), || Ok(self.new_root))?;

            let (old_from_pk, old_from_enc) = alloc_leaf(cs.clone(), &self.old_from)?;
            let (old_to_pk, old_to_enc) = alloc_leaf(cs.clone(), &self.old_to)?;
            let (new_from_pk, new_from_enc) = alloc_leaf(cs.clone(), &self.new_from)?;
            let (new_to_pk, new_to_enc) = alloc_leaf(cs.clone(), &self.new_to)?;

            // 1. OldFrom is in OldRoot.
            verify_leaf_membership(
                cs.clone(),
                &old_from_pk.n,
                &old_from_pk.g,
                &old_from_enc,
                &old_root,
                &self.old_from_mp,
            )?;
            // 2. OldTo is in OldRoot.
            verify_leaf_membership(
                cs.clone(),
                &old_to_pk.n,
                &old_to_pk.g,
                &old_to_enc,
                &old_root,
                &self.old_to_mp,
            )?;

            let old_from_balance = FpVar::new_witness(cs.clone(), || Ok(self.old_from_balance))?;
            let r_old_from = FpVar::new_witness(cs.clone(), || Ok(self.r_old_from))?;
            let r_new_from = FpVar::new_witness(cs.clone(), || Ok(self.r_new_from))?;
            let amount = FpVar::new_witness(cs.clone(), || Ok(self.amount))?;
            let r_amount = FpVar::new_witness(cs.clone(), || Ok(self.r_amount))?;

            // 3. Claimed plaintext balance binds to OldFrom's ciphertext.
            let enc_bal = paillier_encrypt(
                cs.clone(),
                &old_from_pk,
                &old_from_balance,
                &r_old_from,
                CIPHERTEXT_BITS as usize,
            )?;
            enc_bal.enforce_equal(&old_from_enc)?;

            // 4. amount <= old balance.
            assert_le(cs.clone(), &amount, &old_from_balance)?;

            // 5. New sender ciphertext is a fresh encryption of the decrement.
            let new_from_balance = &old_from_balance - &amount;
            let enc_new_from = paillier_encrypt(
                cs.clone(),
                &old_from_pk,
                &new_from_balance,
                &r_new_from,
                CIPHERTEXT_BITS as usize,
            )?;
            enc_new_from.enforce_equal(&new_from_enc)?;

            // 6. New receiver ciphertext is the homomorphic sum.
            let enc_amount =
                paillier_encrypt(cs.clone(), &old_to_pk, &amount, &r_amount, CIPHERTEXT_BITS as usize)?;
            let enc_new_to = paillier_add(cs.clone(), &old_to_pk, &old_to_enc, &enc_amount)?;
            enc_new_to.enforce_equal(&new_to_enc)?;

            // 7. NewFrom is in NewRoot.
            verify_leaf_membership(
                cs.clone(),
                &new_from_pk.n,
                &new_from_pk.g,
                &new_from_enc,
                &new_root,
                &self.new_from_mp,
            )?;
            // 8. NewTo is in NewRoot.
            verify_leaf_membership(
                cs.clone(),
                &new_to_pk.n,
                &new_to_pk.g,
                &new_to_enc,
                &new_root,
                &self.new_to_mp,
            )?;

            // 9, 10. Public keys are unchanged across the transfer.
            old_from_pk.assert_key_equal(&new_from_pk)?;
            old_to_pk.assert_key_equal(&new_to_pk)?;

            tracing::debug!(target: LOG_TARGET, constraints = cs.num_constraints(), "transfer circuit synthesized");
            Ok(())
        })
    }
}
