//! The in-memory account table: a fixed-size sequence of user records
//! backing the balance tree, guarded by a single coarse read-modify-write
//! lock so a transfer's fetch-paths/mutate-leaves/recompute-root sequence
//! observes one consistent tree throughout.

use crate::config::TREE_DEPTH;
use crate::error::TransferError;
use crate::merkle::{BalanceLeaf, Content, MerkleTree};
use crate::paillier::native::{self, Ciphertext, PublicKey, SecretKey};
use ark_bn254::Fr;
use num_bigint::BigUint;
use parking_lot::RwLock;
use rand::RngCore;
use std::sync::Arc;

const LOG_TARGET: &str = "db::accounts";

/// One account's full clear-text record. The secret key and plaintext
/// balance never leave the process; only `pub_key`/`enc_balance` (and their
/// leaf digest) are exposed to the circuit.
#[derive(Clone)]
pub struct UserRecord {
    pub index: usize,
    pub pub_key: PublicKey,
    pub secret_key: SecretKey,
    pub balance: BigUint,
    pub enc_balance: Ciphertext,
    /// Randomness used to produce `enc_balance`. Carried alongside the
    /// ciphertext because a transfer witness must re-prove knowledge of the
    /// *existing* ciphertext's opening, not a freshly drawn one.
    pub enc_r: BigUint,
}

impl UserRecord {
    pub fn leaf(&self) -> BalanceLeaf {
        let (n, g) = self.pub_key.to_field::<Fr>();
        BalanceLeaf {
            n,
            g,
            enc_balance: self.enc_balance.to_field::<Fr>(),
        }
    }
}

struct Inner {
    users: Vec<UserRecord>,
    tree: MerkleTree,
}

/// Shared, lock-guarded account table. Cloning an `AccountTable` shares the
/// same underlying state (cheap `Arc` clone), matching the handle pattern
/// the HTTP façade threads through its handlers.
#[derive(Clone)]
pub struct AccountTable {
    inner: Arc<RwLock<Inner>>,
}

impl AccountTable {
    /// Generates `count` fresh accounts, each with a random balance in
    /// `[0, 2^(B-1))`, and builds their genesis tree.
    pub fn genesis(count: usize, rng: &mut impl RngCore) -> Self {
        assert!(count <= 1 << TREE_DEPTH, "more accounts than the tree depth can hold");

        let mut users = Vec::with_capacity(count);
        let mut leaves = Vec::with_capacity(count);
        for index in 0..count {
            let (pub_key, secret_key) = native::generate(rng);
            let balance = BigUint::from(rng.next_u32() % (1 << 20));
            let enc_r = BigUint::from(rng.next_u64() | 1);
            let enc_balance = native::encrypt(&pub_key, &balance, &enc_r);

            let user = UserRecord {
                index,
                pub_key,
                secret_key,
                balance,
                enc_balance,
                enc_r,
            };
            leaves.push(user.leaf().digest());
            users.push(user);
        }

        let tree = MerkleTree::build(TREE_DEPTH, &leaves);
        tracing::info!(target: LOG_TARGET, count, root = ?tree.root(), "genesis account table built");

        AccountTable {
            inner: Arc::new(RwLock::new(Inner { users, tree })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn root(&self) -> Fr {
        self.inner.read().tree.root()
    }

    pub fn user(&self, index: usize) -> Result<UserRecord, TransferError> {
        let inner = self.inner.read();
        inner
            .users
            .get(index)
            .cloned()
            .ok_or(TransferError::AccountNotFound(index))
    }

    /// Takes the write lock for the whole fetch-paths / mutate-leaves /
    /// recompute-root / fetch-new-paths sequence, handing the caller
    /// exclusive access to both the user list and the tree at once.
    pub fn with_write_lock<R>(&self, f: impl FnOnce(&mut Vec<UserRecord>, &mut MerkleTree) -> R) -> R {
        let mut inner = self.inner.write();
        let Inner { users, tree } = &mut *inner;
        f(users, tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    #[test]
    fn genesis_builds_a_consistent_tree() {
        let mut rng = test_rng();
        let table = AccountTable::genesis(4, &mut rng);
        assert_eq!(table.len(), 4);

        let user = table.user(2).unwrap();
        assert_eq!(user.index, 2);
    }

    #[test]
    fn account_not_found_past_the_genesis_count() {
        let mut rng = test_rng();
        let table = AccountTable::genesis(2, &mut rng);
        assert!(matches!(table.user(5), Err(TransferError::AccountNotFound(5))));
    }
}
