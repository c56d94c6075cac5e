//! In-circuit modular arithmetic over a witness-supplied modulus `M` of
//! bit-width at most [`crate::config::CIPHERTEXT_BITS`]. Every gadget here is
//! a building block for the Paillier gadget (`crate::paillier::gadget`): the
//! circuit never trusts a quotient/remainder pair, it only constrains one
//! supplied as a witness.

use crate::bigint::{biguint_to_field, field_to_biguint};
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::gr1cs::{ConstraintSystemRef, SynthesisError};

const LOG_TARGET: &str = "modmath::gadget";

/// `DivMod(num, modulus) -> (q, r)` such that `num = q * modulus + r`.
///
/// `q` and `r` are supplied as an untrusted hint: a plain Rust closure reads
/// the already-witnessed operands, computes the quotient/remainder with
/// arbitrary-precision arithmetic, and the two are allocated as fresh
/// witnesses. The single constraint emitted afterwards is the only thing
/// binding them to `num`/`modulus`.
///
/// TODO: this intentionally omits the `r < modulus` range check called out
/// as an open soundness gap — an adversarial hint can supply `r' >= modulus`
/// paired with a compensating `q'` as long as `num = q'*modulus + r'` still
/// holds. A production port should add a `B`-bit range assertion on `r`.
pub fn div_mod<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    num: &FpVar<F>,
    modulus: &FpVar<F>,
) -> Result<(FpVar<F>, FpVar<F>), SynthesisError> {
    let quotient = FpVar::new_witness(cs.clone(), || {
        let num_big = field_to_biguint(num.value()?);
        let mod_big = field_to_biguint(modulus.value()?);
        Ok(biguint_to_field::<F>(&(&num_big / &mod_big)))
    })?;
    let remainder = FpVar::new_witness(cs.clone(), || {
        let num_big = field_to_biguint(num.value()?);
        let mod_big = field_to_biguint(modulus.value()?);
        Ok(biguint_to_field::<F>(&(&num_big % &mod_big)))
    })?;

    (&quotient * modulus + &remainder).enforce_equal(num)?;

    tracing::trace!(target: LOG_TARGET, "div_mod constrained");
    Ok((quotient, remainder))
}

/// `MulMod(a, b, modulus) -> r = (a * b) mod modulus`. The product is formed
/// directly in the field (safe: operands are `<= 2^B`-bit and the field
/// order comfortably exceeds `2^{2B}`), then reduced via [`div_mod`].
pub fn mul_mod<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
    modulus: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let product = a * b;
    let (_, remainder) = div_mod(cs, &product, modulus)?;
    Ok(remainder)
}

/// `SquareMod(a, modulus) -> (a * a) mod modulus`.
pub fn square_mod<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    a: &FpVar<F>,
    modulus: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    mul_mod(cs, a, a, modulus)
}

/// `PowMod(base, exp, modulus) -> base^exp mod modulus`, computed by
/// square-and-multiply over exactly `bit_width` exponent bits in MSB-first
/// order, starting from an accumulator of 1.
///
/// The exponent is decomposed via [`ToBitsGadget::to_bits_le`], which is
/// itself a range-checked bit decomposition of the whole field element;
/// only the least-significant `bit_width` bits are consumed. Callers must
/// ensure `exp < 2^bit_width` — higher bits are silently dropped rather than
/// rejected (an open question carried from the source design: see the
/// doc comment on `crate::circuit::TransferCircuit`).
pub fn pow_mod<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    base: &FpVar<F>,
    exp: &FpVar<F>,
    modulus: &FpVar<F>,
    bit_width: usize,
) -> Result<FpVar<F>, SynthesisError> {
    let exp_bits = exp.to_bits_le()?;
    debug_assert!(exp_bits.len() >= bit_width);

    let mut accumulator = FpVar::constant(F::one());
    for bit in exp_bits[..bit_width].iter().rev() {
        let squared = square_mod(cs.clone(), &accumulator, modulus)?;
        let multiplied = mul_mod(cs.clone(), &squared, base, modulus)?;
        accumulator = FpVar::conditionally_select(bit, &multiplied, &squared)?;
    }

    Ok(accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::biguint_to_field;
    use ark_bn254::Fr;
    use ark_relations::gr1cs::ConstraintSystem;
    use num_bigint::BigUint;

    fn alloc(cs: ConstraintSystemRef<Fr>, value: u64) -> FpVar<Fr> {
        FpVar::new_witness(cs, || Ok(Fr::from(value))).unwrap()
    }

    #[test]
    fn div_mod_honest_hint_satisfies() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let num = alloc(cs.clone(), 97);
        let modulus = alloc(cs.clone(), 11);

        let (q, r) = div_mod(cs.clone(), &num, &modulus).unwrap();
        assert_eq!(q.value().unwrap(), Fr::from(8u64));
        assert_eq!(r.value().unwrap(), Fr::from(9u64));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn div_mod_rejects_inconsistent_quotient_remainder() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let num = alloc(cs.clone(), 97);
        let modulus = alloc(cs.clone(), 11);

        // Tamper with the witness after allocation: bind num = q*M + r with
        // a (q, r) pair that does not actually divide 97 by 11.
        let bad_q = alloc(cs.clone(), 1);
        let bad_r = alloc(cs.clone(), 1);
        (&bad_q * &modulus + &bad_r).enforce_equal(&num).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn pow_mod_agrees_with_native_exponentiation() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let base = alloc(cs.clone(), 5);
        let modulus_val = 97u64;
        let modulus = alloc(cs.clone(), modulus_val);
        let exp_val = 13u64;
        let exp = alloc(cs.clone(), exp_val);

        let result = pow_mod(cs.clone(), &base, &exp, &modulus, 62).unwrap();

        let expected = BigUint::from(5u64).modpow(&BigUint::from(exp_val), &BigUint::from(modulus_val));
        assert_eq!(result.value().unwrap(), biguint_to_field::<Fr>(&expected));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn mul_mod_matches_native_multiplication() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let a = alloc(cs.clone(), 123);
        let b = alloc(cs.clone(), 456);
        let modulus = alloc(cs.clone(), 1000);

        let r = mul_mod(cs.clone(), &a, &b, &modulus).unwrap();
        assert_eq!(r.value().unwrap(), Fr::from((123u64 * 456u64) % 1000u64));
        assert!(cs.is_satisfied().unwrap());
    }
}
