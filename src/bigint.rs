//! Bridges field elements to arbitrary-precision unsigned integers. Every
//! value that crosses this boundary is, by the data model's invariants,
//! bounded by `2^(2B)` at the widest (a product of two `B`-bit moduli), well
//! inside the round trip's lossless range for the curves this crate targets.

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

pub fn field_to_biguint<F: PrimeField>(value: F) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

pub fn biguint_to_field<F: PrimeField>(value: &BigUint) -> F {
    F::from_le_bytes_mod_order(&value.to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn round_trips_through_biguint() {
        let value = Fr::from(123456789u64);
        let as_big = field_to_biguint(value);
        assert_eq!(as_big, BigUint::from(123456789u64));
        assert_eq!(biguint_to_field::<Fr>(&as_big), value);
    }
}
