//! Clear-text Paillier key generation, encryption, decryption and the
//! homomorphic operations the witness builder and its tests rely on. The
//! circuit itself never runs this code — it only proves that the prover
//! *could have* run it (see `crate::paillier::gadget`).

use crate::bigint::{biguint_to_field, field_to_biguint};
use crate::config::CIPHERTEXT_BITS;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use rand::RngCore;

const LOG_TARGET: &str = "paillier::native";

/// `(N, G)`, with `0 < N < 2^B` and `G` conventionally `N + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub g: BigUint,
}

impl PublicKey {
    pub fn n_squared(&self) -> BigUint {
        &self.n * &self.n
    }

    pub fn to_field<F: PrimeField>(&self) -> (F, F) {
        (biguint_to_field(&self.n), biguint_to_field(&self.g))
    }
}

#[derive(Clone, Debug)]
pub struct SecretKey {
    lambda: BigUint,
    mu: BigUint,
    n: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext(pub BigUint);

impl Ciphertext {
    pub fn to_field<F: PrimeField>(&self) -> F {
        biguint_to_field(&self.0)
    }

    pub fn from_field<F: PrimeField>(value: F) -> Self {
        Ciphertext(field_to_biguint(value))
    }

    /// Homomorphic ciphertext+ciphertext addition: `c1 * c2 mod N^2`.
    pub fn add(&self, other: &Ciphertext, pk: &PublicKey) -> Ciphertext {
        Ciphertext((&self.0 * &other.0) % pk.n_squared())
    }

    /// Ciphertext plus a plaintext constant: `self * Encrypt(constant, 1) mod N^2`.
    pub fn add_plain(&self, pk: &PublicKey, constant: &BigUint) -> Ciphertext {
        let encrypted_constant = encrypt(pk, constant, &BigUint::from(1u64));
        self.add(&encrypted_constant, pk)
    }

    /// Plaintext-constant multiplication of the encrypted value: `self^constant mod N^2`.
    pub fn mul_plain(&self, pk: &PublicKey, constant: &BigUint) -> Ciphertext {
        Ciphertext(self.0.modpow(constant, &pk.n_squared()))
    }
}

/// Samples a fresh Paillier keypair whose modulus `N` fits in `CIPHERTEXT_BITS` bits.
pub fn generate(rng: &mut impl RngCore) -> (PublicKey, SecretKey) {
    let half_bits = (CIPHERTEXT_BITS / 2) as u32;
    let p = random_prime(rng, half_bits);
    let mut q = random_prime(rng, half_bits);
    while q == p {
        q = random_prime(rng, half_bits);
    }

    let n = &p * &q;
    let g = &n + BigUint::from(1u64);
    let p_minus_1 = &p - BigUint::from(1u64);
    let q_minus_1 = &q - BigUint::from(1u64);
    let lambda = lcm(&p_minus_1, &q_minus_1);

    // With G = N + 1, L(G^lambda mod N^2) = lambda mod N, so mu is its
    // inverse mod N directly (the standard simplification for this choice
    // of generator).
    let mu = mod_inverse(&(&lambda % &n), &n).expect("lambda invertible mod N for safe primes");

    tracing::debug!(target: LOG_TARGET, bits = CIPHERTEXT_BITS, "generated Paillier keypair");

    (
        PublicKey { n: n.clone(), g },
        SecretKey { lambda, mu, n },
    )
}

pub fn encrypt(pk: &PublicKey, message: &BigUint, randomness: &BigUint) -> Ciphertext {
    let n_squared = pk.n_squared();
    let gm = pk.g.modpow(message, &n_squared);
    let rn = randomness.modpow(&pk.n, &n_squared);
    Ciphertext((&gm * &rn) % &n_squared)
}

pub fn decrypt(sk: &SecretKey, ciphertext: &Ciphertext) -> BigUint {
    let n_squared = &sk.n * &sk.n;
    let u = ciphertext.0.modpow(&sk.lambda, &n_squared);
    let l = (&u - BigUint::from(1u64)) / &sk.n;
    (&l * &sk.mu) % &sk.n
}

fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) / gcd(a, b)
}

fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero_check() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

trait IsZero {
    fn is_zero_check(&self) -> bool;
}
impl IsZero for BigUint {
    fn is_zero_check(&self) -> bool {
        *self == BigUint::from(0u64)
    }
}

/// Extended-Euclid modular inverse; `None` if `a` and `modulus` are not coprime.
fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let (mut old_r, mut r): (num_bigint::BigInt, num_bigint::BigInt) =
        (a.clone().into(), modulus.clone().into());
    let (mut old_s, mut s): (num_bigint::BigInt, num_bigint::BigInt) =
        (num_bigint::BigInt::from(1), num_bigint::BigInt::from(0));

    while r != num_bigint::BigInt::from(0) {
        let quotient = &old_r / &r;
        let new_r = &old_r - &quotient * &r;
        old_r = r;
        r = new_r;
        let new_s = &old_s - &quotient * &s;
        old_s = s;
        s = new_s;
    }

    if old_r != num_bigint::BigInt::from(1) {
        return None;
    }

    let modulus_signed: num_bigint::BigInt = modulus.clone().into();
    let result = ((old_s % &modulus_signed) + &modulus_signed) % &modulus_signed;
    result.to_biguint()
}

/// Samples a random `bits`-bit prime via rejection sampling: draw an odd
/// candidate of the requested width, sieve small factors, then run
/// Miller-Rabin. `bits` is small (≤ 31 for the reference `B = 62`
/// configuration) so this converges in a handful of tries.
fn random_prime(rng: &mut impl RngCore, bits: u32) -> BigUint {
    loop {
        let candidate = random_odd_of_bit_length(rng, bits);
        if is_probably_prime(&candidate) {
            return candidate;
        }
    }
}

fn random_odd_of_bit_length(rng: &mut impl RngCore, bits: u32) -> BigUint {
    assert!(bits >= 2 && bits <= 63);
    let top_bit = 1u64 << (bits - 1);
    let mask = (top_bit << 1) - 1;
    let value = (rng.next_u64() & mask) | top_bit | 1;
    BigUint::from(value)
}

const SMALL_PRIMES: &[u64] = &[3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

fn is_probably_prime(candidate: &BigUint) -> bool {
    for &p in SMALL_PRIMES {
        let p_big = BigUint::from(p);
        if *candidate == p_big {
            return true;
        }
        if candidate % &p_big == BigUint::from(0u64) {
            return false;
        }
    }
    miller_rabin(candidate, &[2u64, 3, 5, 7, 11, 13, 17])
}

fn miller_rabin(n: &BigUint, bases: &[u64]) -> bool {
    let one = BigUint::from(1u64);
    let two = BigUint::from(2u64);
    if *n < two {
        return false;
    }
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while &d % &two == BigUint::from(0u64) {
        d /= &two;
        r += 1;
    }

    'witness: for &a in bases {
        let a = BigUint::from(a) % n;
        if a == BigUint::from(0u64) {
            continue;
        }
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue;
        }
        for _ in 0..r.saturating_sub(1) {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    #[test]
    fn encrypt_decrypt_round_trips() {
        let mut rng = test_rng();
        let (pk, sk) = generate(&mut rng);

        let message = BigUint::from(42u64);
        let r = BigUint::from(7u64);
        let ciphertext = encrypt(&pk, &message, &r);
        assert_eq!(decrypt(&sk, &ciphertext), message);
    }

    #[test]
    fn homomorphic_add_sums_plaintexts() {
        let mut rng = test_rng();
        let (pk, sk) = generate(&mut rng);

        let m1 = BigUint::from(10u64);
        let m2 = BigUint::from(15u64);
        let c1 = encrypt(&pk, &m1, &BigUint::from(3u64));
        let c2 = encrypt(&pk, &m2, &BigUint::from(5u64));

        let sum = c1.add(&c2, &pk);
        assert_eq!(decrypt(&sk, &sum), &m1 + &m2);
    }

    #[test]
    fn add_plain_matches_ciphertext_addition() {
        let mut rng = test_rng();
        let (pk, sk) = generate(&mut rng);

        let m = BigUint::from(4u64);
        let c = encrypt(&pk, &m, &BigUint::from(9u64));
        let bumped = c.add_plain(&pk, &BigUint::from(6u64));
        assert_eq!(decrypt(&sk, &bumped), BigUint::from(10u64));
    }

    #[test]
    fn mul_plain_scales_plaintext() {
        let mut rng = test_rng();
        let (pk, sk) = generate(&mut rng);

        let m = BigUint::from(4u64);
        let c = encrypt(&pk, &m, &BigUint::from(9u64));
        let scaled = c.mul_plain(&pk, &BigUint::from(3u64));
        assert_eq!(decrypt(&sk, &scaled), BigUint::from(12u64));
    }
}
