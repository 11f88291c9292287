use std::fmt;

use alloy::primitives::{address, Address};

use crate::decoder::DecodedCall;
use crate::tx_service::CreationRecord;

/// Canonical v1.3.0 proxy factory, deployed at the same address on every
/// supported chain.
pub const CURRENT_FACTORY: Address = address!("a6B71E26C5e0845f74c812102Ca7114b6a896AB2");
/// Canonical v1.1.1 proxy factory.
pub const LEGACY_FACTORY: Address = address!("76E2cFc1F5Fa8F6a5b3fC4c8F4788F0116861F9B");
/// The v1.1.1 factory on Gnosis Chain lives at its own address, so Safes it
/// created cannot be address-matched on any other chain (and vice versa).
const LEGACY_XDAI_FACTORY: Address = address!("12302fE9c02ff50939BaAaaf415fc226C078613C");

/// (version, chain id) pairs for which replay is blocked even though the
/// factory address matches.
const INCOMPATIBLE: &[(FactoryVersion, u64)] = &[(FactoryVersion::Legacy, 100)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryVersion {
    Current,
    Legacy,
    Unsupported,
}

impl fmt::Display for FactoryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryVersion::Current => write!(f, "v1.3.0"),
            FactoryVersion::Legacy => write!(f, "v1.1.1"),
            FactoryVersion::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryClassification {
    pub version: FactoryVersion,
    /// True only when the factory is recognized and the creation method is
    /// CREATE2-based. Plain createProxy addresses depend on the factory
    /// nonce and cannot be reproduced from another chain.
    pub reproducible: bool,
}

fn current_factory(_chain_id: u64) -> Address {
    CURRENT_FACTORY
}

fn legacy_factory(chain_id: u64) -> Address {
    if chain_id == 100 {
        LEGACY_XDAI_FACTORY
    } else {
        LEGACY_FACTORY
    }
}

fn is_incompatible(version: FactoryVersion, chain_id: u64) -> bool {
    INCOMPATIBLE.contains(&(version, chain_id))
}

/// Determine which factory version created the Safe and whether replaying
/// the creation call on another chain can reproduce its address.
pub fn classify(
    record: &CreationRecord,
    call: &DecodedCall,
    chain_id: u64,
) -> FactoryClassification {
    let mut version = if record.factory_address == current_factory(chain_id) {
        FactoryVersion::Current
    } else if record.factory_address == legacy_factory(chain_id) {
        FactoryVersion::Legacy
    } else {
        FactoryVersion::Unsupported
    };

    if is_incompatible(version, chain_id) {
        version = FactoryVersion::Unsupported;
    }

    let reproducible = version != FactoryVersion::Unsupported
        && !matches!(call, DecodedCall::CreateProxy { .. });

    FactoryClassification {
        version,
        reproducible,
    }
}

/// The factory address to replay against on the target chain, or None when
/// that (version, chain) pair cannot host an address-identical copy.
pub fn factory_for_target(version: FactoryVersion, target_chain_id: u64) -> Option<Address> {
    if is_incompatible(version, target_chain_id) {
        return None;
    }
    match version {
        FactoryVersion::Current => Some(current_factory(target_chain_id)),
        FactoryVersion::Legacy => Some(legacy_factory(target_chain_id)),
        FactoryVersion::Unsupported => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};
    use std::str::FromStr;

    fn record(factory: Address) -> CreationRecord {
        CreationRecord {
            created: "2022-06-13T13:57:33Z".to_string(),
            creator: Address::ZERO,
            factory_address: factory,
            master_copy: None,
            setup_data: None,
            transaction_hash: Default::default(),
        }
    }

    fn nonce_call() -> DecodedCall {
        DecodedCall::CreateProxyWithNonce {
            singleton: Address::ZERO,
            initializer: Bytes::new(),
            salt_nonce: U256::ZERO,
        }
    }

    #[test]
    fn current_factory_is_reproducible() {
        let c = classify(&record(CURRENT_FACTORY), &nonce_call(), 1);
        assert_eq!(c.version, FactoryVersion::Current);
        assert!(c.reproducible);
    }

    #[test]
    fn create_proxy_is_never_reproducible() {
        let call = DecodedCall::CreateProxy {
            singleton: Address::ZERO,
            initializer: Bytes::new(),
        };
        let c = classify(&record(CURRENT_FACTORY), &call, 1);
        assert_eq!(c.version, FactoryVersion::Current);
        assert!(!c.reproducible);
    }

    #[test]
    fn unknown_factory_is_unsupported() {
        let other = Address::from_str("0x4242424242424242424242424242424242424242").unwrap();
        let c = classify(&record(other), &nonce_call(), 1);
        assert_eq!(c.version, FactoryVersion::Unsupported);
        assert!(!c.reproducible);
    }

    #[test]
    fn legacy_factory_classifies() {
        let c = classify(&record(LEGACY_FACTORY), &nonce_call(), 1);
        assert_eq!(c.version, FactoryVersion::Legacy);
        assert!(c.reproducible);
    }

    #[test]
    fn legacy_factory_on_gnosis_chain_is_blocked() {
        // matches the chain-local legacy factory address, but the override
        // still rules it out
        let c = classify(&record(legacy_factory(100)), &nonce_call(), 100);
        assert_eq!(c.version, FactoryVersion::Unsupported);
        assert!(!c.reproducible);
        assert!(factory_for_target(FactoryVersion::Legacy, 100).is_none());
    }

    #[test]
    fn target_factory_lookup() {
        assert_eq!(
            factory_for_target(FactoryVersion::Current, 137),
            Some(CURRENT_FACTORY)
        );
        assert_eq!(
            factory_for_target(FactoryVersion::Legacy, 1),
            Some(LEGACY_FACTORY)
        );
        assert!(factory_for_target(FactoryVersion::Unsupported, 1).is_none());
    }
}
