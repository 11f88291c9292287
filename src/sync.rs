use std::collections::HashSet;
use std::error::Error;

use alloy::primitives::{address, Address, Bytes, U256};
use alloy::providers::Provider;
use alloy_sol_types::SolCall;

use crate::contracts::GnosisSafe;
use crate::error::DecodeError;

/// The contract stores owners as a singly linked list headed by this
/// sentinel; removals need the predecessor of the removed owner.
pub const SENTINEL_OWNER: Address = address!("0000000000000000000000000000000000000001");

/// Owner set and threshold of a Safe. Order is irrelevant for comparison but
/// carries the linked-list structure needed to encode removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeConfig {
    pub owners: Vec<Address>,
    pub threshold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiff {
    pub added: Vec<Address>,
    pub removed: Vec<Address>,
    pub threshold_change: Option<(u64, u64)>,
}

impl ConfigDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.threshold_change.is_none()
    }
}

/// One corrective contract call for the new Safe.
#[derive(Debug, Clone)]
pub struct SyncCall {
    pub to: Address,
    pub data: Bytes,
    pub description: String,
}

/// Decode the owners and threshold the Safe was set up with from the
/// original initializer payload (a full `setup(...)` calldata).
pub fn decode_initial_setup(initializer: &[u8]) -> Result<SafeConfig, DecodeError> {
    let call = GnosisSafe::setupCall::abi_decode(initializer, true)
        .map_err(|e| DecodeError::MalformedInput(e.to_string()))?;
    Ok(SafeConfig {
        owners: call.owners,
        threshold: u64::try_from(call.threshold).unwrap_or(u64::MAX),
    })
}

/// Read the live owners and threshold from a deployed Safe.
pub async fn live_config<P: Provider>(
    provider: &P,
    safe: Address,
) -> Result<SafeConfig, Box<dyn Error>> {
    let contract = GnosisSafe::new(safe, provider);
    let (owners, threshold) = tokio::try_join!(
        async { contract.getOwners().call().await },
        async { contract.getThreshold().call().await },
    )?;
    Ok(SafeConfig {
        owners: owners._0,
        threshold: u64::try_from(threshold._0).unwrap_or(u64::MAX),
    })
}

/// Compare two configurations. Owners are compared as sets; order
/// differences alone are not drift.
pub fn diff(initial: &SafeConfig, current: &SafeConfig) -> ConfigDiff {
    let initial_set: HashSet<Address> = initial.owners.iter().copied().collect();
    let current_set: HashSet<Address> = current.owners.iter().copied().collect();

    let added = current
        .owners
        .iter()
        .filter(|o| !initial_set.contains(*o))
        .copied()
        .collect();
    let removed = initial
        .owners
        .iter()
        .filter(|o| !current_set.contains(*o))
        .copied()
        .collect();
    let threshold_change = (initial.threshold != current.threshold)
        .then_some((initial.threshold, current.threshold));

    ConfigDiff {
        added,
        removed,
        threshold_change,
    }
}

/// Build the complete ordered sequence of calls that brings a Safe deployed
/// with `initial` to the `target` configuration.
///
/// Additions come first so a removal can never drive the owner count below
/// the threshold; the threshold change comes last to avoid transient invalid
/// states. Removal calls carry the predecessor from the original linked-list
/// ordering.
pub fn build_sync_calls(safe: Address, initial: &SafeConfig, target: &SafeConfig) -> Vec<SyncCall> {
    let changes = diff(initial, target);
    let mut calls = Vec::new();

    for owner in &changes.added {
        let data = GnosisSafe::addOwnerWithThresholdCall {
            owner: *owner,
            threshold: U256::from(initial.threshold),
        }
        .abi_encode();
        calls.push(SyncCall {
            to: safe,
            data: data.into(),
            description: format!("addOwnerWithThreshold({owner}, {})", initial.threshold),
        });
    }

    for (i, owner) in changes.removed.iter().enumerate() {
        let Some(index) = initial.owners.iter().position(|o| o == owner) else {
            continue;
        };
        let prev = if index == 0 {
            SENTINEL_OWNER
        } else {
            initial.owners[index - 1]
        };
        let remaining = initial.owners.len() + changes.added.len() - (i + 1);
        let new_threshold = initial.threshold.min(remaining as u64).max(1);
        let data = GnosisSafe::removeOwnerCall {
            prevOwner: prev,
            owner: *owner,
            threshold: U256::from(new_threshold),
        }
        .abi_encode();
        calls.push(SyncCall {
            to: safe,
            data: data.into(),
            description: format!("removeOwner({prev}, {owner}, {new_threshold})"),
        });
    }

    if let Some((_, new_threshold)) = changes.threshold_change {
        let data = GnosisSafe::changeThresholdCall {
            threshold: U256::from(new_threshold),
        }
        .abi_encode();
        calls.push(SyncCall {
            to: safe,
            data: data.into(),
            description: format!("changeThreshold({new_threshold})"),
        });
    }

    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from(bytes)
    }

    fn config(owners: &[Address], threshold: u64) -> SafeConfig {
        SafeConfig {
            owners: owners.to_vec(),
            threshold,
        }
    }

    fn selector(call: &SyncCall) -> [u8; 4] {
        let mut s = [0u8; 4];
        s.copy_from_slice(&call.data[..4]);
        s
    }

    #[test]
    fn diff_of_equal_configs_is_empty() {
        let c = config(&[addr(1), addr(2)], 2);
        assert!(diff(&c, &c).is_empty());
    }

    #[test]
    fn owner_order_is_not_drift() {
        let a = config(&[addr(1), addr(2)], 1);
        let b = config(&[addr(2), addr(1)], 1);
        assert!(diff(&a, &b).is_empty());
    }

    // Scenario: [A,B] threshold 1 → [A,B,D] threshold 2
    #[test]
    fn addition_and_threshold_change() {
        let initial = config(&[addr(0xa), addr(0xb)], 1);
        let current = config(&[addr(0xa), addr(0xb), addr(0xd)], 2);

        let d = diff(&initial, &current);
        assert_eq!(d.added, vec![addr(0xd)]);
        assert!(d.removed.is_empty());
        assert_eq!(d.threshold_change, Some((1, 2)));

        let calls = build_sync_calls(addr(0x5a), &initial, &current);
        assert_eq!(calls.len(), 2);
        assert_eq!(
            selector(&calls[0]),
            GnosisSafe::addOwnerWithThresholdCall::SELECTOR
        );
        assert_eq!(selector(&calls[1]), GnosisSafe::changeThresholdCall::SELECTOR);

        // the add keeps the initial threshold; the change comes last
        let add = GnosisSafe::addOwnerWithThresholdCall::abi_decode(&calls[0].data, true).unwrap();
        assert_eq!(add.owner, addr(0xd));
        assert_eq!(add.threshold, U256::from(1u64));
        let change = GnosisSafe::changeThresholdCall::abi_decode(&calls[1].data, true).unwrap();
        assert_eq!(change.threshold, U256::from(2u64));
    }

    #[test]
    fn removal_uses_linked_list_predecessor() {
        let initial = config(&[addr(1), addr(2), addr(3)], 1);
        let without_middle = config(&[addr(1), addr(3)], 1);
        let calls = build_sync_calls(addr(0x5a), &initial, &without_middle);
        assert_eq!(calls.len(), 1);
        let remove = GnosisSafe::removeOwnerCall::abi_decode(&calls[0].data, true).unwrap();
        assert_eq!(remove.prevOwner, addr(1));
        assert_eq!(remove.owner, addr(2));

        let without_first = config(&[addr(2), addr(3)], 1);
        let calls = build_sync_calls(addr(0x5a), &initial, &without_first);
        let remove = GnosisSafe::removeOwnerCall::abi_decode(&calls[0].data, true).unwrap();
        assert_eq!(remove.prevOwner, SENTINEL_OWNER);
        assert_eq!(remove.owner, addr(1));
    }

    #[test]
    fn removal_clamps_threshold() {
        let initial = config(&[addr(1), addr(2)], 2);
        let target = config(&[addr(1)], 1);
        let calls = build_sync_calls(addr(0x5a), &initial, &target);
        // removeOwner drops the threshold with it, then changeThreshold settles it
        let remove = GnosisSafe::removeOwnerCall::abi_decode(&calls[0].data, true).unwrap();
        assert_eq!(remove.threshold, U256::from(1u64));
        assert_eq!(
            selector(calls.last().unwrap()),
            GnosisSafe::changeThresholdCall::SELECTOR
        );
    }

    #[test]
    fn full_sequence_orders_adds_before_removes() {
        let initial = config(&[addr(1), addr(2)], 2);
        let target = config(&[addr(2), addr(3)], 2);
        let calls = build_sync_calls(addr(0x5a), &initial, &target);
        assert_eq!(calls.len(), 2);
        assert_eq!(
            selector(&calls[0]),
            GnosisSafe::addOwnerWithThresholdCall::SELECTOR
        );
        assert_eq!(selector(&calls[1]), GnosisSafe::removeOwnerCall::SELECTOR);
    }

    #[test]
    fn decode_initial_setup_round_trip() {
        let owners = vec![addr(1), addr(2)];
        let initializer = GnosisSafe::setupCall {
            owners: owners.clone(),
            threshold: U256::from(2u64),
            to: Address::ZERO,
            data: Bytes::new(),
            fallbackHandler: Address::ZERO,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        }
        .abi_encode();

        let cfg = decode_initial_setup(&initializer).unwrap();
        assert_eq!(cfg.owners, owners);
        assert_eq!(cfg.threshold, 2);
    }

    #[test]
    fn decode_initial_setup_rejects_garbage() {
        assert!(decode_initial_setup(&[0x01, 0x02, 0x03]).is_err());
        assert!(decode_initial_setup(&[0xde, 0xad, 0xbe, 0xef, 0x00]).is_err());
    }
}
