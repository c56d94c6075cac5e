//! Turns a `(fromIdx, toIdx, amount)` request into a fully-populated
//! [`TransferCircuit`] plus its 14 public inputs, validating business
//! preconditions before touching any shared state.

use crate::circuit::{LeafInput, MerkleWitness, TransferCircuit};
use crate::config::{CIPHERTEXT_BITS, TREE_DEPTH};
use crate::db::AccountTable;
use crate::error::TransferError;
use crate::merkle::Content;
use crate::paillier::native;
use ark_bn254::Fr;
use num_bigint::BigUint;
use rand::RngCore;

const LOG_TARGET: &str = "witness::builder";

fn random_blinding(rng: &mut impl RngCore) -> BigUint {
    BigUint::from(rng.next_u64() | 1)
}

fn to_leaf_input(pub_key: &native::PublicKey, enc_balance: &native::Ciphertext) -> LeafInput {
    let (n, g) = pub_key.to_field::<Fr>();
    LeafInput {
        n,
        g,
        enc_balance: enc_balance.to_field::<Fr>(),
    }
}

/// Validates the transfer's business preconditions without mutating
/// anything: `fromIdx != toIdx`, both indices in range, `amount < 2^B`, and
/// `amount <= from.balance`.
fn validate_preconditions(
    accounts: &AccountTable,
    from_idx: usize,
    to_idx: usize,
    amount: &BigUint,
) -> Result<(), TransferError> {
    let max = accounts.len();
    if from_idx >= max {
        return Err(TransferError::IndexOutOfRange { index: from_idx, max });
    }
    if to_idx >= max {
        return Err(TransferError::IndexOutOfRange { index: to_idx, max });
    }
    if from_idx == to_idx {
        return Err(TransferError::SameAccount(from_idx));
    }

    let bound = BigUint::from(1u64) << CIPHERTEXT_BITS;
    if amount >= &bound {
        return Err(TransferError::AmountTooLarge {
            amount: u64::try_from(amount).unwrap_or(u64::MAX),
            bound: CIPHERTEXT_BITS,
        });
    }

    let from = accounts.user(from_idx)?;
    if &from.balance < amount {
        return Err(TransferError::InsufficientBalance {
            index: from_idx,
            available: u64::try_from(&from.balance).unwrap_or(u64::MAX),
            requested: u64::try_from(amount).unwrap_or(u64::MAX),
        });
    }

    Ok(())
}

/// Builds the witness for a transfer of `amount` from `from_idx` to
/// `to_idx`, mutating `accounts` under a single write-lock hold. Returns the
/// populated circuit and its 14 public inputs.
pub fn build_transfer_witness(
    accounts: &AccountTable,
    from_idx: usize,
    to_idx: usize,
    amount: BigUint,
    rng: &mut impl RngCore,
) -> Result<(TransferCircuit, [Fr; 14]), TransferError> {
    validate_preconditions(accounts, from_idx, to_idx, &amount)?;

    let r_new_from = random_blinding(rng);
    let r_amount = random_blinding(rng);

    let circuit = accounts.with_write_lock(|users, tree| {
        let old_root = tree.root();

        let from = users[from_idx].clone();
        let to = users[to_idx].clone();

        let old_from_proof = tree.proof(from_idx);
        let old_to_proof = tree.proof(to_idx);

        let old_from_input = to_leaf_input(&from.pub_key, &from.enc_balance);
        let old_to_input = to_leaf_input(&to.pub_key, &to.enc_balance);

        let new_from_balance = &from.balance - &amount;
        let new_from_enc = native::encrypt(&from.pub_key, &new_from_balance, &r_new_from);

        let enc_amount = native::encrypt(&to.pub_key, &amount, &r_amount);
        let new_to_enc = to.enc_balance.add(&enc_amount, &to.pub_key);

        let updated_from = crate::db::UserRecord {
            index: from_idx,
            pub_key: from.pub_key.clone(),
            secret_key: from.secret_key.clone(),
            balance: new_from_balance,
            enc_balance: new_from_enc.clone(),
            enc_r: r_new_from.clone(),
        };
        // Multiplying ciphertexts multiplies their opening randomness too:
        // Encrypt(b,r1)*Encrypt(a,r2) = Encrypt(b+a, r1*r2 mod N). The
        // homomorphic sum therefore does have a well-defined opening, needed
        // the next time this account is the *sender* in a transfer.
        let combined_r = (&to.enc_r * &r_amount) % &to.pub_key.n;
        let updated_to = crate::db::UserRecord {
            index: to_idx,
            pub_key: to.pub_key.clone(),
            secret_key: to.secret_key.clone(),
            balance: &to.balance + &amount,
            enc_balance: new_to_enc.clone(),
            enc_r: combined_r,
        };

        tree.set_leaf(from_idx, updated_from.leaf().digest());
        tree.set_leaf(to_idx, updated_to.leaf().digest());
        let new_root = tree.root();

        let new_from_proof = tree.proof(from_idx);
        let new_to_proof = tree.proof(to_idx);

        let new_from_input = to_leaf_input(&updated_from.pub_key, &updated_from.enc_balance);
        let new_to_input = to_leaf_input(&updated_to.pub_key, &updated_to.enc_balance);

        users[from_idx] = updated_from;
        users[to_idx] = updated_to;

        tracing::info!(
            target: LOG_TARGET,
            from_idx,
            to_idx,
            old_root = ?old_root,
            new_root = ?new_root,
            "transfer witness assembled"
        );

        TransferCircuit {
            old_root,
            new_root,
            old_from: old_from_input,
            old_to: old_to_input,
            new_from: new_from_input,
            new_to: new_to_input,
            old_from_balance: crate::bigint::biguint_to_field(&from.balance),
            r_old_from: crate::bigint::biguint_to_field(&from.enc_r),
            r_new_from: crate::bigint::biguint_to_field(&r_new_from),
            amount: crate::bigint::biguint_to_field(&amount),
            r_amount: crate::bigint::biguint_to_field(&r_amount),
            old_from_mp: MerkleWitness {
                path: old_from_proof.path,
                index: old_from_proof.index,
            },
            old_to_mp: MerkleWitness {
                path: old_to_proof.path,
                index: old_to_proof.index,
            },
            new_from_mp: MerkleWitness {
                path: new_from_proof.path,
                index: new_from_proof.index,
            },
            new_to_mp: MerkleWitness {
                path: new_to_proof.path,
                index: new_to_proof.index,
            },
        }
    });

    let public_inputs = circuit.public_inputs();
    Ok((circuit, public_inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::gr1cs::{ConstraintSynthesizer, ConstraintSystem};
    use ark_std::test_rng;

    #[test]
    fn s1_simple_transfer_produces_a_satisfied_witness() {
        let mut rng = test_rng();
        let accounts = AccountTable::genesis(4, &mut rng);

        let (circuit, _public_inputs) =
            build_transfer_witness(&accounts, 0, 1, BigUint::from(10u64), &mut rng).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn s6_two_sequential_transfers_both_verify() {
        let mut rng = test_rng();
        let accounts = AccountTable::genesis(4, &mut rng);

        let (circuit1, _) = build_transfer_witness(&accounts, 0, 1, BigUint::from(10u64), &mut rng).unwrap();
        let cs1 = ConstraintSystem::<Fr>::new_ref();
        circuit1.generate_constraints(cs1.clone()).unwrap();
        assert!(cs1.is_satisfied().unwrap());

        let (circuit2, _) = build_transfer_witness(&accounts, 1, 2, BigUint::from(5u64), &mut rng).unwrap();
        let cs2 = ConstraintSystem::<Fr>::new_ref();
        circuit2.generate_constraints(cs2.clone()).unwrap();
        assert!(cs2.is_satisfied().unwrap());
    }

    #[test]
    fn rejects_same_account_transfer() {
        let mut rng = test_rng();
        let accounts = AccountTable::genesis(4, &mut rng);
        let result = build_transfer_witness(&accounts, 1, 1, BigUint::from(1u64), &mut rng);
        assert!(matches!(result, Err(TransferError::SameAccount(1))));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut rng = test_rng();
        let accounts = AccountTable::genesis(4, &mut rng);
        let result = build_transfer_witness(&accounts, 0, 9, BigUint::from(1u64), &mut rng);
        assert!(matches!(result, Err(TransferError::IndexOutOfRange { index: 9, max: 4 })));
    }

    #[test]
    fn rejects_insufficient_balance() {
        let mut rng = test_rng();
        let accounts = AccountTable::genesis(4, &mut rng);
        let from = accounts.user(0).unwrap();
        let too_much = &from.balance + BigUint::from(1u64);
        let result = build_transfer_witness(&accounts, 0, 1, too_much, &mut rng);
        assert!(matches!(result, Err(TransferError::InsufficientBalance { index: 0, .. })));
    }
}
