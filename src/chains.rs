use alloy::primitives::Address;

/// Static network metadata, loaded once at process start. The short name is
/// the EIP-3770 prefix used by the Safe web app.
#[derive(Debug, Clone, Copy)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub display_name: &'static str,
    pub short_name: &'static str,
    /// Public RPC endpoint for read-only access. Not every chain has one.
    pub rpc_url: Option<&'static str>,
}

pub static CHAINS: &[ChainDescriptor] = &[
    chain(1, "Ethereum", "eth", Some("https://eth.llamarpc.com")),
    chain(10, "Optimism", "oeth", Some("https://mainnet.optimism.io")),
    chain(50, "XDC Network", "xdc", Some("https://rpc.xdcrpc.com")),
    chain(56, "BNB Chain", "bnb", Some("https://bsc-dataseed.binance.org")),
    chain(100, "Gnosis Chain", "gno", Some("https://rpc.gnosischain.com")),
    chain(137, "Polygon", "matic", Some("https://polygon-rpc.com")),
    chain(324, "zkSync Era", "zksync", Some("https://mainnet.era.zksync.io")),
    chain(1101, "Polygon zkEVM", "zkevm", Some("https://zkevm-rpc.com")),
    chain(5000, "Mantle", "mnt", Some("https://rpc.mantle.xyz")),
    chain(8453, "Base", "base", Some("https://mainnet.base.org")),
    chain(42161, "Arbitrum", "arb1", Some("https://arb1.arbitrum.io/rpc")),
    chain(42220, "Celo", "celo", Some("https://forno.celo.org")),
    chain(43114, "Avalanche", "avax", Some("https://api.avax.network/ext/bc/C/rpc")),
    chain(59144, "Linea", "linea", Some("https://rpc.linea.build")),
    chain(84532, "Base Sepolia", "basesep", Some("https://sepolia.base.org")),
    chain(534352, "Scroll", "scr", Some("https://rpc.scroll.io")),
    chain(11155111, "Sepolia", "sep", Some("https://sepolia.drpc.org")),
    chain(1313161554, "Aurora", "aurora", Some("https://mainnet.aurora.dev")),
];

const fn chain(
    chain_id: u64,
    display_name: &'static str,
    short_name: &'static str,
    rpc_url: Option<&'static str>,
) -> ChainDescriptor {
    ChainDescriptor {
        chain_id,
        display_name,
        short_name,
        rpc_url,
    }
}

pub fn by_id(chain_id: u64) -> Option<&'static ChainDescriptor> {
    CHAINS.iter().find(|c| c.chain_id == chain_id)
}

pub fn display_name(chain_id: u64) -> String {
    match by_id(chain_id) {
        Some(c) => c.display_name.to_string(),
        None => format!("chain {chain_id}"),
    }
}

pub fn rpc_url(chain_id: u64) -> Result<&'static str, String> {
    by_id(chain_id)
        .and_then(|c| c.rpc_url)
        .ok_or_else(|| format!("No public RPC available for chain {chain_id}"))
}

/// Link to the Safe in the official web app, e.g.
/// `https://app.safe.global/home?safe=matic:0x...`
pub fn safe_app_url(chain_id: u64, safe: Address) -> Option<String> {
    let descriptor = by_id(chain_id)?;
    Some(format!(
        "https://app.safe.global/home?safe={}:{}",
        descriptor.short_name,
        safe.to_checksum(None)
    ))
}
