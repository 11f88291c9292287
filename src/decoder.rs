use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::contracts::ProxyFactory;
use crate::error::DecodeError;

/// A creation call decoded from the raw input of the Safe's deployment
/// transaction. One variant per known proxy-factory method, each with the
/// exact typed field set the ABI prescribes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedCall {
    /// Plain CREATE deployment. The resulting address depends on the factory
    /// account nonce and cannot be reproduced on another chain.
    CreateProxy {
        singleton: Address,
        initializer: Bytes,
    },
    CreateProxyWithNonce {
        singleton: Address,
        initializer: Bytes,
        salt_nonce: U256,
    },
    CreateProxyWithCallback {
        singleton: Address,
        initializer: Bytes,
        salt_nonce: U256,
        callback: Address,
    },
}

impl DecodedCall {
    pub fn method_name(&self) -> &'static str {
        match self {
            DecodedCall::CreateProxy { .. } => "createProxy",
            DecodedCall::CreateProxyWithNonce { .. } => "createProxyWithNonce",
            DecodedCall::CreateProxyWithCallback { .. } => "createProxyWithCallback",
        }
    }

    pub fn singleton(&self) -> Address {
        match self {
            DecodedCall::CreateProxy { singleton, .. }
            | DecodedCall::CreateProxyWithNonce { singleton, .. }
            | DecodedCall::CreateProxyWithCallback { singleton, .. } => *singleton,
        }
    }

    pub fn initializer(&self) -> &Bytes {
        match self {
            DecodedCall::CreateProxy { initializer, .. }
            | DecodedCall::CreateProxyWithNonce { initializer, .. }
            | DecodedCall::CreateProxyWithCallback { initializer, .. } => initializer,
        }
    }

    pub fn salt_nonce(&self) -> Option<U256> {
        match self {
            DecodedCall::CreateProxy { .. } => None,
            DecodedCall::CreateProxyWithNonce { salt_nonce, .. }
            | DecodedCall::CreateProxyWithCallback { salt_nonce, .. } => Some(*salt_nonce),
        }
    }

    pub fn callback(&self) -> Option<Address> {
        match self {
            DecodedCall::CreateProxyWithCallback { callback, .. } => Some(*callback),
            _ => None,
        }
    }

    /// Re-encode the call, selector included. Byte-identical to the original
    /// transaction input this was decoded from.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            DecodedCall::CreateProxy {
                singleton,
                initializer,
            } => ProxyFactory::createProxyCall {
                singleton: *singleton,
                data: initializer.clone(),
            }
            .abi_encode(),
            DecodedCall::CreateProxyWithNonce {
                singleton,
                initializer,
                salt_nonce,
            } => ProxyFactory::createProxyWithNonceCall {
                singleton: *singleton,
                initializer: initializer.clone(),
                saltNonce: *salt_nonce,
            }
            .abi_encode(),
            DecodedCall::CreateProxyWithCallback {
                singleton,
                initializer,
                salt_nonce,
                callback,
            } => ProxyFactory::createProxyWithCallbackCall {
                singleton: *singleton,
                initializer: initializer.clone(),
                saltNonce: *salt_nonce,
                callback: *callback,
            }
            .abi_encode(),
        }
    }
}

/// Decode a proxy-factory creation call from raw transaction input.
///
/// Pure and deterministic: matches the 4-byte selector against the fixed
/// table of known factory methods, then decodes the arguments per that
/// method's ABI. Anything else is `UnknownMethod` and the Safe must be
/// treated as non-replayable.
pub fn decode(input: &[u8]) -> Result<DecodedCall, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::MalformedInput(format!(
            "calldata too short: {} bytes",
            input.len()
        )));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    let params = &input[4..];

    match selector {
        s if s == ProxyFactory::createProxyCall::SELECTOR => {
            let call =
                ProxyFactory::createProxyCall::abi_decode_raw(params, true).map_err(malformed)?;
            Ok(DecodedCall::CreateProxy {
                singleton: call.singleton,
                initializer: call.data,
            })
        }
        s if s == ProxyFactory::createProxyWithNonceCall::SELECTOR => {
            let call = ProxyFactory::createProxyWithNonceCall::abi_decode_raw(params, true)
                .map_err(malformed)?;
            Ok(DecodedCall::CreateProxyWithNonce {
                singleton: call.singleton,
                initializer: call.initializer,
                salt_nonce: call.saltNonce,
            })
        }
        s if s == ProxyFactory::createProxyWithCallbackCall::SELECTOR => {
            let call = ProxyFactory::createProxyWithCallbackCall::abi_decode_raw(params, true)
                .map_err(malformed)?;
            Ok(DecodedCall::CreateProxyWithCallback {
                singleton: call.singleton,
                initializer: call.initializer,
                salt_nonce: call.saltNonce,
                callback: call.callback,
            })
        }
        _ => Err(DecodeError::UnknownMethod { selector }),
    }
}

fn malformed(e: alloy_sol_types::Error) -> DecodeError {
    DecodeError::MalformedInput(e.to_string())
}
