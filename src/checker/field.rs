//! Prime field arithmetic over a modulus read from the circuit artifacts.
//!
//! Circuit primes are ~254-bit, so elements are backed by [`BigUint`] rather
//! than fixed-width integers. Every [`FieldElement`] handed out by a
//! [`PrimeField`] is already reduced into `[0, p)`.

use std::fmt;

use ark_ff::PrimeField as ArkPrimeField;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// A reduced element of some [`PrimeField`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The field `Z/pZ` for an odd prime `p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimeField {
    modulus: BigUint,
}

impl PrimeField {
    /// Returns `None` unless `modulus` is odd and greater than 2.
    /// Primality itself is not tested; the artifacts are trusted for that.
    pub fn new(modulus: BigUint) -> Option<Self> {
        if modulus <= BigUint::from(2u8) || !modulus.bit(0) {
            return None;
        }
        Some(Self { modulus })
    }

    /// Scalar field of BN254, the default circom curve.
    pub fn bn254() -> Self {
        let modulus: BigUint = ark_bn254::Fr::MODULUS.into();
        Self { modulus }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Byte width circom uses for this prime: whole 64-bit limbs.
    pub fn n8(&self) -> usize {
        let bits = self.modulus.bits() as usize;
        ((bits - 1) / 64 + 1) * 8
    }

    pub fn is_bn254(&self) -> bool {
        *self == Self::bn254()
    }

    pub fn zero(&self) -> FieldElement {
        FieldElement(BigUint::zero())
    }

    pub fn one(&self) -> FieldElement {
        FieldElement(BigUint::one())
    }

    pub fn from_u64(&self, value: u64) -> FieldElement {
        self.reduce(BigUint::from(value))
    }

    pub fn reduce(&self, value: BigUint) -> FieldElement {
        if value < self.modulus {
            FieldElement(value)
        } else {
            FieldElement(value % &self.modulus)
        }
    }

    pub fn add(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        let sum = &a.0 + &b.0;
        if sum >= self.modulus {
            FieldElement(sum - &self.modulus)
        } else {
            FieldElement(sum)
        }
    }

    /// `a - b`, lifted by `p` first so the intermediate never goes negative.
    pub fn sub(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        self.reduce(&a.0 + &self.modulus - &b.0)
    }

    pub fn mul(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        self.reduce(&a.0 * &b.0)
    }

    pub fn neg(&self, a: &FieldElement) -> FieldElement {
        if a.is_zero() {
            a.clone()
        } else {
            FieldElement(&self.modulus - &a.0)
        }
    }

    pub fn is_zero(&self, a: &FieldElement) -> bool {
        a.is_zero()
    }

    pub fn from_bytes(&self, bytes: &[u8], little_endian: bool) -> FieldElement {
        let value = if little_endian {
            BigUint::from_bytes_le(bytes)
        } else {
            BigUint::from_bytes_be(bytes)
        };
        self.reduce(value)
    }

    /// Little-endian encoding zero-padded to `n8` bytes.
    ///
    /// Returns `None` if the element does not fit in `n8` bytes.
    pub fn to_bytes_le(&self, a: &FieldElement, n8: usize) -> Option<Vec<u8>> {
        let mut bytes = a.0.to_bytes_le();
        if a.is_zero() {
            bytes.clear();
        }
        if bytes.len() > n8 {
            return None;
        }
        bytes.resize(n8, 0);
        Some(bytes)
    }

    /// Parses a (possibly signed) decimal integer and reduces it mod `p`.
    pub fn from_decimal(&self, text: &str) -> Option<FieldElement> {
        let text = text.trim();
        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let magnitude = self.reduce(BigUint::parse_bytes(digits.as_bytes(), 10)?);
        if text.starts_with('-') {
            Some(self.neg(&magnitude))
        } else {
            Some(magnitude)
        }
    }

    /// Decimal rendering that shows elements just below `p` as small
    /// negatives, e.g. `p - 1` as `(-1)`.
    ///
    /// An element is shown negated when `p - a <= threshold` and the negated
    /// form is the smaller magnitude.
    pub fn display_signed(&self, a: &FieldElement, threshold: u64) -> String {
        if !a.is_zero() {
            let negated = &self.modulus - &a.0;
            if negated <= BigUint::from(threshold) && negated < a.0 {
                return format!("(-{negated})");
            }
        }
        a.to_string()
    }
}
