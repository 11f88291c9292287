use alloy::primitives::{keccak256, Address, U256};
use alloy::providers::Provider;

use crate::decoder::DecodedCall;
use crate::error::VerifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// All preconditions hold, replay can proceed.
    Ready,
    /// Code already exists at the predicted address. The desired end state
    /// already holds, so this is success-equivalent.
    AlreadyDeployed,
}

/// Check the target-chain preconditions for replaying the creation call.
/// The three code reads are independent and issued concurrently; the verdict
/// is gated on all of them.
pub async fn verify<P: Provider>(
    provider: &P,
    predicted: Address,
    call: &DecodedCall,
) -> Result<Verdict, VerifyError> {
    let callback = call.callback().filter(|c| !c.is_zero());

    let (target_occupied, singleton_present, callback_present) = tokio::try_join!(
        has_code(provider, predicted),
        has_code(provider, call.singleton()),
        async {
            match callback {
                Some(c) => has_code(provider, c).await.map(Some),
                None => Ok(None),
            }
        },
    )?;

    gate(
        target_occupied,
        (call.singleton(), singleton_present),
        callback.zip(callback_present),
    )
}

/// The pure gating decision over the three code reads. An occupied target
/// address short-circuits everything else.
pub fn gate(
    target_occupied: bool,
    singleton: (Address, bool),
    callback: Option<(Address, bool)>,
) -> Result<Verdict, VerifyError> {
    if target_occupied {
        return Ok(Verdict::AlreadyDeployed);
    }
    if !singleton.1 {
        return Err(VerifyError::SingletonMissing(singleton.0));
    }
    if let Some((address, present)) = callback {
        // the callback address is part of the CREATE2 salt; substituting
        // anything else would change the resulting address
        if !present {
            return Err(VerifyError::CallbackMissing(address));
        }
    }
    Ok(Verdict::Ready)
}

async fn has_code<P: Provider>(provider: &P, address: Address) -> Result<bool, VerifyError> {
    let code = provider
        .get_code_at(address)
        .await
        .map_err(|e| VerifyError::Rpc(e.to_string()))?;
    Ok(!code.is_empty())
}

/// Compute the CREATE2 address the factory would deploy to, from the proxy
/// creation code served by `proxyCreationCode()` on the target factory.
///
/// Salt derivation mirrors the factory:
/// `keccak256(keccak256(initializer) ‖ uint256(saltNonce))`, where the
/// callback method first folds the callback address into the nonce as
/// `uint256(keccak256(saltNonce ‖ callback))`. Plain createProxy is
/// nonce-dependent CREATE and has no predictable address.
pub fn predict_address(
    factory: Address,
    proxy_creation_code: &[u8],
    call: &DecodedCall,
) -> Option<Address> {
    let salt_nonce = call.salt_nonce()?;

    let effective_nonce = match call.callback() {
        Some(callback) => {
            let mut packed = Vec::with_capacity(52);
            packed.extend_from_slice(&salt_nonce.to_be_bytes::<32>());
            packed.extend_from_slice(callback.as_slice());
            U256::from_be_bytes(keccak256(&packed).0)
        }
        None => salt_nonce,
    };

    let mut salt_input = [0u8; 64];
    salt_input[..32].copy_from_slice(keccak256(call.initializer()).as_slice());
    salt_input[32..].copy_from_slice(&effective_nonce.to_be_bytes::<32>());
    let salt = keccak256(salt_input);

    // init code = creation code ++ abi.encode(singleton)
    let mut init_code = proxy_creation_code.to_vec();
    init_code.extend_from_slice(&[0u8; 12]);
    init_code.extend_from_slice(call.singleton().as_slice());

    Some(factory.create2(salt, keccak256(&init_code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use std::str::FromStr;

    fn singleton() -> Address {
        Address::from_str("0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552").unwrap()
    }

    fn callback() -> Address {
        Address::from_str("0x3333333333333333333333333333333333333333").unwrap()
    }

    // Scenario: singleton present, nothing at the target address
    #[test]
    fn gate_ready_when_preconditions_hold() {
        assert_eq!(
            gate(false, (singleton(), true), None).unwrap(),
            Verdict::Ready
        );
        assert_eq!(
            gate(false, (singleton(), true), Some((callback(), true))).unwrap(),
            Verdict::Ready
        );
    }

    // Scenario: code at the predicted address short-circuits, even when the
    // other checks would fail
    #[test]
    fn gate_occupied_address_short_circuits() {
        assert_eq!(
            gate(true, (singleton(), false), Some((callback(), false))).unwrap(),
            Verdict::AlreadyDeployed
        );
    }

    #[test]
    fn gate_missing_singleton_blocks() {
        match gate(false, (singleton(), false), None) {
            Err(VerifyError::SingletonMissing(a)) => assert_eq!(a, singleton()),
            other => panic!("expected SingletonMissing, got {other:?}"),
        }
    }

    // Scenario: callback absent on the target chain
    #[test]
    fn gate_missing_callback_blocks() {
        match gate(false, (singleton(), true), Some((callback(), false))) {
            Err(VerifyError::CallbackMissing(a)) => assert_eq!(a, callback()),
            other => panic!("expected CallbackMissing, got {other:?}"),
        }
    }

    #[test]
    fn predict_is_deterministic_and_salt_sensitive() {
        let factory = Address::from_str("0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2").unwrap();
        let creation_code = [0x60, 0x80, 0x60, 0x40, 0x52];
        let call = DecodedCall::CreateProxyWithNonce {
            singleton: singleton(),
            initializer: Bytes::from(vec![0xab; 68]),
            salt_nonce: U256::from(1u64),
        };

        let a = predict_address(factory, &creation_code, &call).unwrap();
        let b = predict_address(factory, &creation_code, &call).unwrap();
        assert_eq!(a, b);

        let other_nonce = DecodedCall::CreateProxyWithNonce {
            singleton: singleton(),
            initializer: Bytes::from(vec![0xab; 68]),
            salt_nonce: U256::from(2u64),
        };
        assert_ne!(a, predict_address(factory, &creation_code, &other_nonce).unwrap());
    }

    #[test]
    fn predict_folds_callback_into_salt() {
        let factory = Address::from_str("0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2").unwrap();
        let creation_code = [0x60, 0x80];
        let with_nonce = DecodedCall::CreateProxyWithNonce {
            singleton: singleton(),
            initializer: Bytes::new(),
            salt_nonce: U256::from(5u64),
        };
        let with_callback = DecodedCall::CreateProxyWithCallback {
            singleton: singleton(),
            initializer: Bytes::new(),
            salt_nonce: U256::from(5u64),
            callback: callback(),
        };
        assert_ne!(
            predict_address(factory, &creation_code, &with_nonce).unwrap(),
            predict_address(factory, &creation_code, &with_callback).unwrap()
        );
    }

    #[test]
    fn predict_refuses_plain_create() {
        let call = DecodedCall::CreateProxy {
            singleton: singleton(),
            initializer: Bytes::new(),
        };
        assert!(predict_address(Address::ZERO, &[], &call).is_none());
    }
}
