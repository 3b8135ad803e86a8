//! Content identifiers for freshly inserted inline images.
//!
//! An identifier is `<hash>@<domain>`: a 32-bit unsigned hash of
//! caller-chosen input (image bytes, or a timestamp + filename composite)
//! rendered in a power-of-two radix, followed by the sender's domain. Equal
//! inputs give equal identifiers; distinct inputs collide only when the
//! hash does.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Hash producing the numeric part of a content identifier.
pub trait CidHasher {
    fn hash(&self, input: &[u8]) -> u32;
}

/// `h = h * 31 + unit` with 32-bit wrap-around.
///
/// For ASCII text this equals the classic string hash used by web mail
/// clients, so identifiers minted for the same text agree with them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHasher;

impl CidHasher for RollingHasher {
    fn hash(&self, input: &[u8]) -> u32 {
        input
            .iter()
            .fold(0u32, |h, &b| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(u32::from(b)))
    }
}

/// First four bytes of SHA-256, big-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl CidHasher for Sha256Hasher {
    fn hash(&self, input: &[u8]) -> u32 {
        let digest = Sha256::digest(input);
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

/// Hasher selection as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    #[default]
    Rolling,
    Sha256,
}

impl CidHasher for HasherKind {
    fn hash(&self, input: &[u8]) -> u32 {
        match self {
            HasherKind::Rolling => RollingHasher.hash(input),
            HasherKind::Sha256 => Sha256Hasher.hash(input),
        }
    }
}

/// Render `value` in base `2^shift`, most significant digit first.
///
/// `shift` is clamped to `1..=5` (binary up to base 32).
pub fn to_unsigned_string(value: u32, shift: u32) -> String {
    let shift = shift.clamp(1, 5);
    let mask = (1u32 << shift) - 1;
    let mut digits = Vec::new();
    let mut rest = value;
    loop {
        digits.push(DIGITS[(rest & mask) as usize]);
        rest >>= shift;
        if rest == 0 {
            break;
        }
    }
    digits.reverse();
    // Only ASCII digits were pushed.
    String::from_utf8_lossy(&digits).into_owned()
}

/// Domain part of an address: everything after the first `@`, or `""`.
fn domain_of(email: &str) -> &str {
    email.split_once('@').map(|(_, domain)| domain).unwrap_or("")
}

/// Mints identifiers with a chosen hasher and radix.
#[derive(Debug, Clone, Copy)]
pub struct CidGenerator<H = HasherKind> {
    hasher: H,
    radix_shift: u32,
}

impl Default for CidGenerator {
    fn default() -> Self {
        Self::new(HasherKind::Rolling, 4)
    }
}

impl CidGenerator {
    pub fn from_config(config: &crate::config::CidConfig) -> Self {
        Self::new(config.hasher, config.radix_shift)
    }
}

impl<H: CidHasher> CidGenerator<H> {
    pub fn new(hasher: H, radix_shift: u32) -> Self {
        Self {
            hasher,
            radix_shift,
        }
    }

    /// `<hash(input)>@<domain of email>`.
    pub fn generate(&self, input: impl AsRef<[u8]>, email: &str) -> String {
        let hash = to_unsigned_string(self.hasher.hash(input.as_ref()), self.radix_shift);
        format!("{hash}@{}", domain_of(email))
    }
}

/// Identifier with the rolling hash in hexadecimal.
pub fn generate_cid(input: impl AsRef<[u8]>, email: &str) -> String {
    CidGenerator::default().generate(input, email)
}
