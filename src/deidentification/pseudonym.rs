//! Deterministic pseudonymous identifiers
//!
//! A pseudonym is derived from the SHA-512 digest of the original value. The first
//! 128 bits are stamped with the UUID version 4 and RFC 4122 variant bits and rendered
//! as a UID under the `2.25` root (ISO/IEC 9834-8), so the same input always yields
//! the same syntactically valid UID.

use sha2::{Digest, Sha512};
use uuid::{Builder, Uuid, Variant};

/// UID root for UUID-derived identifiers
pub const UID_ROOT: &str = "2.25.";

/// Longest pseudonym: the root followed by the 39 digits of `u128::MAX`
pub const MAX_PSEUDONYM_LEN: usize = UID_ROOT.len() + 39;

/// Pseudonym generator
#[derive(Debug, Clone, Copy, Default)]
pub struct Pseudonymizer;

impl Pseudonymizer {
    /// Pseudonym of `value`
    ///
    /// ```
    /// use dicom_deid::deidentification::Pseudonymizer;
    ///
    /// let first = Pseudonymizer::pseudonym("1.2.840.113619.2.55.3");
    /// assert_eq!(first, Pseudonymizer::pseudonym("1.2.840.113619.2.55.3"));
    /// assert!(first.starts_with("2.25."));
    /// ```
    pub fn pseudonym(value: &str) -> String {
        let digest = Sha512::digest(value.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        let uuid = Builder::from_random_bytes(bytes).into_uuid();
        format!("{UID_ROOT}{}", uuid.as_u128())
    }

    /// Whether `value` has the shape of a pseudonym produced by [`Self::pseudonym`]
    pub fn is_pseudonym(value: &str) -> bool {
        let Some(digits) = value.trim_end_matches('\0').trim().strip_prefix(UID_ROOT) else {
            return false;
        };
        if digits.is_empty()
            || !digits.chars().all(|c| c.is_ascii_digit())
            || (digits.len() > 1 && digits.starts_with('0'))
        {
            return false;
        }
        let Ok(number) = digits.parse::<u128>() else {
            return false;
        };
        let uuid = Uuid::from_u128(number);
        uuid.get_version_num() == 4 && uuid.get_variant() == Variant::RFC4122
    }
}
