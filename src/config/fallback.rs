//! Built-in chain set used when no chain source is available.

use crate::chain::{Chain, EndpointConfig};
use crate::config::schema::ChainConfig;

struct ChainSeed {
    chain_id: u64,
    name: &'static str,
    display_name: &'static str,
    is_testnet: bool,
    explorer: &'static str,
    endpoints: &'static [(u64, &'static str, &'static str, u32)],
}

const SEEDS: &[ChainSeed] = &[
    ChainSeed {
        chain_id: 1,
        name: "ethereum",
        display_name: "Ethereum Mainnet",
        is_testnet: false,
        explorer: "https://etherscan.io",
        endpoints: &[
            (1, "Ethereum-LlamaRPC", "https://eth.llamarpc.com", 3),
            (2, "Ethereum-PublicNode", "https://ethereum.publicnode.com", 2),
            (3, "Ethereum-Cloudflare", "https://cloudflare-eth.com", 2),
        ],
    },
    ChainSeed {
        chain_id: 11155111,
        name: "sepolia",
        display_name: "Sepolia Testnet",
        is_testnet: true,
        explorer: "https://sepolia.etherscan.io",
        endpoints: &[
            (4, "Sepolia-1RPC", "https://1rpc.io/sepolia", 3),
            (5, "Sepolia-PublicNode", "https://ethereum-sepolia-rpc.publicnode.com", 2),
            (6, "Sepolia-DRPC", "https://sepolia.drpc.org", 2),
        ],
    },
    ChainSeed {
        chain_id: 1868,
        name: "soneium",
        display_name: "Soneium Mainnet",
        is_testnet: false,
        explorer: "https://explorer.soneium.org",
        endpoints: &[
            (7, "Soneium-DRPC", "https://soneium.drpc.org", 3),
            (8, "Soneium-Official", "https://rpc.soneium.org", 2),
        ],
    },
    ChainSeed {
        chain_id: 1946,
        name: "soneium-testnet",
        display_name: "Soneium Testnet",
        is_testnet: true,
        explorer: "https://explorer-testnet.soneium.org",
        endpoints: &[
            (9, "Soneium-Testnet-Official", "https://rpc.minato.soneium.org", 3),
            (10, "Soneium-Testnet-DRPC", "https://soneium-minato.drpc.org", 2),
        ],
    },
];

/// Static fallback chains with public endpoints.
pub fn fallback_chains() -> Vec<ChainConfig> {
    SEEDS
        .iter()
        .map(|seed| {
            let mut chain = Chain::new(seed.chain_id, seed.name);
            chain.display_name = seed.display_name.to_string();
            chain.is_testnet = seed.is_testnet;
            chain.block_explorer_url = Some(seed.explorer.to_string());

            let endpoints = seed
                .endpoints
                .iter()
                .map(|&(id, name, url, weight)| {
                    EndpointConfig::new(name, url).with_id(id).with_weight(weight)
                })
                .collect();

            ChainConfig::new(chain, endpoints)
        })
        .collect()
}
