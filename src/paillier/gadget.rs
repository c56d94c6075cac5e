//! In-circuit Paillier primitives, built entirely on the modular-arithmetic
//! gadgets in `crate::modmath`.

use crate::modmath::{mul_mod, pow_mod};
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::gr1cs::{ConstraintSystemRef, SynthesisError};

const LOG_TARGET: &str = "paillier::gadget";

/// A public key `(N, G)` as circuit variables.
#[derive(Clone)]
pub struct PublicKeyVar<F: PrimeField> {
    pub n: FpVar<F>,
    pub g: FpVar<F>,
}

impl<F: PrimeField> PublicKeyVar<F> {
    /// `N^2`, formed directly in the field. It is only ever used as a
    /// modulus argument to further mod-math calls, never reduced itself.
    pub fn n_squared(&self) -> FpVar<F> {
        &self.n * &self.n
    }

    pub fn assert_key_equal(&self, other: &PublicKeyVar<F>) -> Result<(), SynthesisError> {
        self.n.enforce_equal(&other.n)?;
        self.g.enforce_equal(&other.g)
    }
}

/// `Encrypt(m, r) = (G^m * r^N) mod N^2`, given the bit-width `B` the
/// exponents `m`, `N` are drawn from (the ciphertext-modulus bit-width).
pub fn encrypt<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    pk: &PublicKeyVar<F>,
    message: &FpVar<F>,
    randomness: &FpVar<F>,
    bit_width: usize,
) -> Result<FpVar<F>, SynthesisError> {
    let n_squared = pk.n_squared();
    let gm = pow_mod(cs.clone(), &pk.g, message, &n_squared, bit_width)?;
    let rn = pow_mod(cs.clone(), randomness, &pk.n, &n_squared, bit_width)?;
    let result = mul_mod(cs, &gm, &rn, &n_squared)?;
    tracing::trace!(target: LOG_TARGET, "encrypt constrained");
    Ok(result)
}

/// `Add(c1, c2) = (c1 * c2) mod N^2`.
pub fn add<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    pk: &PublicKeyVar<F>,
    c1: &FpVar<F>,
    c2: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let n_squared = pk.n_squared();
    mul_mod(cs, c1, c2, &n_squared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::biguint_to_field;
    use crate::paillier::native;
    use ark_bn254::Fr;
    use ark_relations::gr1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn encrypt_gadget_agrees_with_native_paillier() {
        let mut rng = test_rng();
        let (pk, _sk) = native::generate(&mut rng);
        let (n_f, g_f): (Fr, Fr) = pk.to_field();

        let message = num_bigint::BigUint::from(5u64);
        let randomness = num_bigint::BigUint::from(7u64);
        let expected = native::encrypt(&pk, &message, &randomness);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let pk_var = PublicKeyVar {
            n: FpVar::new_witness(cs.clone(), || Ok(n_f)).unwrap(),
            g: FpVar::new_witness(cs.clone(), || Ok(g_f)).unwrap(),
        };
        let m_var = FpVar::new_witness(cs.clone(), || Ok(biguint_to_field::<Fr>(&message))).unwrap();
        let r_var =
            FpVar::new_witness(cs.clone(), || Ok(biguint_to_field::<Fr>(&randomness))).unwrap();

        let enc_var = encrypt(cs.clone(), &pk_var, &m_var, &r_var, 62).unwrap();
        assert_eq!(enc_var.value().unwrap(), expected.to_field::<Fr>());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn add_gadget_matches_native_homomorphic_add() {
        let mut rng = test_rng();
        let (pk, sk) = native::generate(&mut rng);
        let (n_f, g_f): (Fr, Fr) = pk.to_field();

        let m1 = num_bigint::BigUint::from(10u64);
        let m2 = num_bigint::BigUint::from(12u64);
        let c1 = native::encrypt(&pk, &m1, &num_bigint::BigUint::from(3u64));
        let c2 = native::encrypt(&pk, &m2, &num_bigint::BigUint::from(5u64));
        let expected_sum = c1.add(&c2, &pk);
        assert_eq!(native::decrypt(&sk, &expected_sum), &m1 + &m2);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let pk_var = PublicKeyVar {
            n: FpVar::new_witness(cs.clone(), || Ok(n_f)).unwrap(),
            g: FpVar::new_witness(cs.clone(), || Ok(g_f)).unwrap(),
        };
        let c1_var = FpVar::new_witness(cs.clone(), || Ok(c1.to_field::<Fr>())).unwrap();
        let c2_var = FpVar::new_witness(cs.clone(), || Ok(c2.to_field::<Fr>())).unwrap();

        let sum_var = add(cs.clone(), &pk_var, &c1_var, &c2_var).unwrap();
        assert_eq!(sum_var.value().unwrap(), expected_sum.to_field::<Fr>());
        assert!(cs.is_satisfied().unwrap());
    }
}
