//! Fixed-depth binary balance tree over a field-hasher digest. Matches the
//! source design's proof shape exactly: a [`MerkleProof`] carries the leaf's
//! own digest as `path[0]` followed by one sibling per level, leaf-adjacent
//! first and root-adjacent last, with no accompanying left/right helper —
//! direction is recovered purely from the leaf index's bits (see
//! `crate::merkle::gadget::verify_proof`).

use crate::field_hash::{hash_leaf_fr, hash_node_fr};
use ark_bn254::Fr;

const LOG_TARGET: &str = "merkle::native";

/// Anything that can be hashed down to a single leaf digest. `BalanceLeaf` is
/// the only implementor; the trait exists so tree construction doesn't need
/// to know about Paillier keys or ciphertexts directly.
pub trait Content {
    fn digest(&self) -> Fr;

    fn matches(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.digest() == other.digest()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceLeaf {
    pub n: Fr,
    pub g: Fr,
    pub enc_balance: Fr,
}

impl Content for BalanceLeaf {
    fn digest(&self) -> Fr {
        hash_leaf_fr(self.n, self.g, self.enc_balance)
    }
}

/// A proof of inclusion for the leaf at `index`: `path[0]` is the leaf's own
/// digest, `path[1..=depth]` are its siblings ordered from the leaf's level
/// up to the root.
#[derive(Clone, Debug)]
pub struct MerkleProof {
    pub root: Fr,
    pub path: Vec<Fr>,
    pub index: usize,
}

/// A complete binary tree of fixed `depth`, holding `2^depth` leaf digests.
/// Unoccupied slots hold the digest of the zero leaf.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    depth: usize,
    /// `layers[0]` is the leaf layer (`2^depth` entries); `layers[depth]`
    /// holds the single root entry.
    layers: Vec<Vec<Fr>>,
}

impl MerkleTree {
    pub fn build(depth: usize, leaves: &[Fr]) -> Self {
        let width = 1usize << depth;
        assert!(leaves.len() <= width, "more leaves than the tree depth can hold");

        let mut leaf_layer = leaves.to_vec();
        leaf_layer.resize(width, hash_leaf_fr(Fr::from(0u64), Fr::from(0u64), Fr::from(0u64)));

        let mut layers = vec![leaf_layer];
        for level in 0..depth {
            let prev = &layers[level];
            let next: Vec<Fr> = prev
                .chunks_exact(2)
                .map(|pair| hash_node_fr(pair[0], pair[1]))
                .collect();
            layers.push(next);
        }

        tracing::debug!(target: LOG_TARGET, depth, leaves = leaves.len(), "built balance tree");
        MerkleTree { depth, layers }
    }

    pub fn root(&self) -> Fr {
        self.layers[self.depth][0]
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Overwrites the digest at `index`'s leaf and recomputes every ancestor.
    pub fn set_leaf(&mut self, index: usize, digest: Fr) {
        let width = 1usize << self.depth;
        assert!(index < width, "leaf index out of range");

        self.layers[0][index] = digest;
        let mut node_index = index;
        for level in 0..self.depth {
            let sibling_index = node_index ^ 1;
            let (left, right) = if node_index % 2 == 0 {
                (self.layers[level][node_index], self.layers[level][sibling_index])
            } else {
                (self.layers[level][sibling_index], self.layers[level][node_index])
            };
            node_index /= 2;
            self.layers[level + 1][node_index] = hash_node_fr(left, right);
        }

        tracing::trace!(target: LOG_TARGET, index, "updated leaf and recomputed ancestors");
    }

    /// Builds the inclusion proof for the leaf at `index`, in the exact
    /// `path[0] = leaf digest, path[1..] = siblings leaf-to-root` shape.
    pub fn proof(&self, index: usize) -> MerkleProof {
        let width = 1usize << self.depth;
        assert!(index < width, "leaf index out of range");

        let mut path = Vec::with_capacity(self.depth + 1);
        path.push(self.layers[0][index]);

        let mut node_index = index;
        for level in 0..self.depth {
            let sibling_index = node_index ^ 1;
            path.push(self.layers[level][sibling_index]);
            node_index /= 2;
        }

        MerkleProof {
            root: self.root(),
            path,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(i: u64) -> BalanceLeaf {
        BalanceLeaf {
            n: Fr::from(1000 + i),
            g: Fr::from(2000 + i),
            enc_balance: Fr::from(3000 + i),
        }
    }

    #[test]
    fn proof_path_matches_tree_shape() {
        let leaves: Vec<Fr> = (0..4).map(|i| leaf(i).digest()).collect();
        let tree = MerkleTree::build(2, &leaves);
        let proof = tree.proof(1);

        assert_eq!(proof.path.len(), 3);
        assert_eq!(proof.path[0], leaves[1]);
        assert_eq!(proof.root, tree.root());
    }

    #[test]
    fn set_leaf_changes_root_and_keeps_other_proofs_reconstructible() {
        let leaves: Vec<Fr> = (0..4).map(|i| leaf(i).digest()).collect();
        let mut tree = MerkleTree::build(2, &leaves);
        let root_before = tree.root();

        let replacement = leaf(9).digest();
        tree.set_leaf(2, replacement);
        assert_ne!(tree.root(), root_before);

        let proof = tree.proof(2);
        assert_eq!(proof.path[0], replacement);
    }

    #[test]
    fn unoccupied_leaves_use_the_zero_leaf_digest() {
        let tree = MerkleTree::build(2, &[leaf(0).digest()]);
        let zero_digest = hash_leaf_fr(Fr::from(0u64), Fr::from(0u64), Fr::from(0u64));
        assert_eq!(tree.proof(3).path[0], zero_digest);
    }
}
