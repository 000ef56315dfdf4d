//! Numeric document ids and the 12-byte storage identity derived from them.
//!
//! Generation logic works with small integers ([`IdLong`]); storage and
//! cross-references work with [`ObjectId`]. The mapping between the two is a
//! pure function, so an integer always resolves to the same stored identity.

use serde::{Serialize, Serializer};
use std::fmt;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Numeric id assigned by generation logic before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdLong(i64);

impl IdLong {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Hash this id into its storage identity.
    ///
    /// 64-bit FNV-1a over the eight low-to-high octets of the value, made
    /// non-negative, then written big-endian into the first eight bytes.
    /// The remaining four bytes are zero.
    pub fn object_id(self) -> ObjectId {
        let mut val = self.0;
        let mut hash = FNV_OFFSET_BASIS;
        for _ in 0..8 {
            let octet = (val & 0xff) as u64;
            val >>= 8;
            hash ^= octet;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        let hash = (hash as i64).wrapping_abs();

        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&hash.to_be_bytes());
        ObjectId(bytes)
    }
}

impl From<i64> for IdLong {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for IdLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 12-byte document identity used by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl From<IdLong> for ObjectId {
    fn from(id: IdLong) -> Self {
        id.object_id()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
