//! Typed identifiers and address wrappers.
//!
//! Every ID and address in the data model is a distinct zero-cost newtype
//! rather than a bare `u64`/`[u8; N]`, so a `PoolAddress` can never be passed
//! where a `TokenAddress` is expected even though both are twenty raw bytes.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generates a zero-cost byte-array wrapper with hex `Display`/`FromStr`,
/// serde support, and the usual `From`/`AsRef` conversions.
macro_rules! define_hex_address {
    (
        $(#[$meta:meta])*
        $name:ident, $len:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            #[inline(always)]
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s).map_err(|e| ValidationError::InvalidHex(e.to_string()))?;
                if bytes.len() != $len {
                    return Err(ValidationError::InvalidHex(format!(
                        "expected {} bytes, got {}",
                        $len,
                        bytes.len()
                    )));
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(&bytes);
                Ok(Self(out))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_hex_address!(
    /// EVM address (20 bytes): Ethereum and BSC accounts, pools, and tokens.
    EvmAddress, 20
);

define_hex_address!(
    /// EVM transaction hash (32 bytes).
    TxHash, 32
);

define_hex_address!(
    /// EVM block hash (32 bytes).
    BlockHash, 32
);

/// A 32-byte Solana pubkey, rendered as base58 rather than hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolanaAddress(pub [u8; 32]);

impl SolanaAddress {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_base58(s: &str) -> Result<Self, ValidationError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ValidationError::InvalidBase58(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(ValidationError::InvalidBase58(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl Serialize for SolanaAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SolanaAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte Solana transaction signature, rendered as base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolanaSignature(pub [u8; 64]);

impl SolanaSignature {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn from_base58(s: &str) -> Result<Self, ValidationError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ValidationError::InvalidBase58(e.to_string()))?;
        if bytes.len() != 64 {
            return Err(ValidationError::InvalidBase58(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 64];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for SolanaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl Serialize for SolanaSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SolanaSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// A transaction identifier: a 32-byte hash on the EVM chains, a 64-byte
/// signature on Solana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxId {
    Evm(TxHash),
    Solana(SolanaSignature),
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxId::Evm(h) => h.fmt(f),
            TxId::Solana(s) => s.fmt(f),
        }
    }
}

/// Chain-agnostic account/contract address: the EVM chains use 20-byte
/// addresses, Solana uses 32-byte base58 pubkeys. Kept as an enum rather
/// than a fixed-width array so downstream code matches on chain kind
/// instead of relying on zero-padding conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Evm(EvmAddress),
    Solana(SolanaAddress),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Evm(a) => a.fmt(f),
            Address::Solana(a) => a.fmt(f),
        }
    }
}

/// Generates a `Uuid`-backed identifier, used for entities created inside
/// the process (opportunities, bundles, submissions) rather than identifiers
/// that originate on-chain.
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_uuid_id!(
    /// Identifies a detected [`crate::Opportunity`].
    OpportunityId
);

define_uuid_id!(
    /// Identifies a constructed [`crate::Bundle`].
    BundleId
);

define_uuid_id!(
    /// Identifies one relay submission attempt for a bundle.
    SubmissionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_address_hex_roundtrip() {
        let addr = EvmAddress::from_hex("0xA0b86a33E6441C4F32B87D3c49de33AD3E2F1EFe").unwrap();
        assert_eq!(addr.to_string().to_lowercase(), "0xa0b86a33e6441c4f32b87d3c49de33ad3e2f1efe");
    }

    #[test]
    fn evm_address_rejects_wrong_length() {
        assert!(EvmAddress::from_hex("0xabcd").is_err());
    }

    #[test]
    fn solana_address_base58_roundtrip() {
        let addr = SolanaAddress::new([7u8; 32]);
        let encoded = addr.to_string();
        let decoded = SolanaAddress::from_base58(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn opportunity_id_is_unique() {
        assert_ne!(OpportunityId::new(), OpportunityId::new());
    }
}
