//! Per-network chain parameters.
//!
//! Static facts about every supported Findora network: chain id, fork
//! activation heights, genesis hash, native currency and the operation and
//! call-method vocabularies. Resolved once when the configuration is built.

use alloy::primitives::{b256, B256};
use std::fmt;
use std::str::FromStr;

use crate::rosetta::types::{Currency, NetworkIdentifier, OperationStatus};

/// Version of the Findora node this middleware targets.
pub const NODE_VERSION: &str = "1.9.24";

/// Rosetta API version implemented.
pub const ROSETTA_VERSION: &str = "1.4.10";

/// Blockchain name used in every network identifier.
pub const BLOCKCHAIN: &str = "Findora";

/// Native asset symbol.
pub const SYMBOL: &str = "FRA";

/// Native asset decimals.
pub const DECIMALS: u32 = 18;

/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

pub const HISTORICAL_BALANCE_SUPPORTED: bool = true;

/// Findora is account based, so there are never mempool coins.
pub const INCLUDE_MEMPOOL_COINS: bool = false;

pub const SUCCESS_STATUS: &str = "SUCCESS";
pub const FAILURE_STATUS: &str = "FAILURE";

/// JSON-RPC methods reachable through `/call`.
pub const CALL_METHODS: &[&str] = &[
    "eth_getBlockByNumber",
    "eth_getTransactionReceipt",
    "eth_call",
    "eth_estimateGas",
];

/// Operation vocabulary.
///
/// Only [`OperationType::Call`] describes a transfer that Construction can
/// build; the remaining kinds are produced by the read side (rewards, fees
/// and trace-derived operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    MinerReward,
    UncleReward,
    Fee,
    Call,
    Create,
    Create2,
    SelfDestruct,
    CallCode,
    DelegateCall,
    StaticCall,
    /// Synthetic: deletion of a self-destructed account that still holds funds.
    Destruct,
}

impl OperationType {
    pub const ALL: [OperationType; 11] = [
        OperationType::MinerReward,
        OperationType::UncleReward,
        OperationType::Fee,
        OperationType::Call,
        OperationType::Create,
        OperationType::Create2,
        OperationType::SelfDestruct,
        OperationType::CallCode,
        OperationType::DelegateCall,
        OperationType::StaticCall,
        OperationType::Destruct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::MinerReward => "MINER_REWARD",
            OperationType::UncleReward => "UNCLE_REWARD",
            OperationType::Fee => "FEE",
            OperationType::Call => "CALL",
            OperationType::Create => "CREATE",
            OperationType::Create2 => "CREATE2",
            OperationType::SelfDestruct => "SELFDESTRUCT",
            OperationType::CallCode => "CALLCODE",
            OperationType::DelegateCall => "DELEGATECALL",
            OperationType::StaticCall => "STATICCALL",
            OperationType::Destruct => "DESTRUCT",
        }
    }

    /// Whether Construction accepts this type for a native transfer.
    pub fn is_transfer(&self) -> bool {
        matches!(self, OperationType::Call)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Fork activation heights. `None` means never activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkSchedule {
    pub homestead: Option<u64>,
    pub dao_fork: Option<u64>,
    pub dao_fork_support: bool,
    pub eip150: Option<u64>,
    pub eip150_hash: B256,
    pub eip155: Option<u64>,
    pub eip158: Option<u64>,
    pub byzantium: Option<u64>,
    pub constantinople: Option<u64>,
    pub petersburg: Option<u64>,
    pub istanbul: Option<u64>,
    pub muir_glacier: Option<u64>,
    pub berlin: Option<u64>,
    pub london: Option<u64>,
    pub terminal_total_difficulty: u128,
}

const EIP150_HASH: B256 =
    b256!("41941023680923e0fe4d74a34bdac8141f2540e3ae90623718e47d66d1ca4a2d");

const TERMINAL_TOTAL_DIFFICULTY: u128 = 50_000_000_000_000_000;

/// Static parameters of one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Network name as it appears in the Rosetta network identifier.
    pub network_name: &'static str,
    pub chain_id: u64,
    pub genesis_hash: B256,
    pub forks: ForkSchedule,
    /// Arguments passed to the node binary when it is supervised locally.
    pub node_arguments: &'static str,
}

impl ChainParams {
    pub fn network_identifier(&self) -> NetworkIdentifier {
        NetworkIdentifier::new(BLOCKCHAIN, self.network_name)
    }

    /// The native currency, identical on every Findora network.
    pub fn currency(&self) -> Currency {
        native_currency()
    }

    pub fn transfer_gas_limit(&self) -> u64 {
        TRANSFER_GAS_LIMIT
    }
}

pub fn native_currency() -> Currency {
    Currency {
        symbol: SYMBOL.to_string(),
        decimals: DECIMALS,
        metadata: None,
    }
}

pub fn operation_statuses() -> Vec<OperationStatus> {
    vec![
        OperationStatus {
            status: SUCCESS_STATUS.to_string(),
            successful: true,
        },
        OperationStatus {
            status: FAILURE_STATUS.to_string(),
            successful: false,
        },
    ]
}

static MAINNET: ChainParams = ChainParams {
    network_name: "Mainnet",
    chain_id: 2152,
    genesis_hash: b256!("d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"),
    forks: ForkSchedule {
        homestead: Some(0),
        dao_fork: None,
        dao_fork_support: true,
        eip150: Some(0),
        eip150_hash: EIP150_HASH,
        eip155: Some(10),
        eip158: Some(10),
        byzantium: Some(0),
        constantinople: Some(4_230_000),
        petersburg: Some(4_939_394),
        istanbul: Some(6_485_846),
        muir_glacier: Some(7_117_117),
        berlin: Some(9_812_189),
        london: Some(10_499_401),
        terminal_total_difficulty: TERMINAL_TOTAL_DIFFICULTY,
    },
    node_arguments: "",
};

static ANVIL: ChainParams = ChainParams {
    network_name: "Anvil",
    chain_id: 2153,
    genesis_hash: b256!("41941023680923e0fe4d74a34bdac8141f2540e3ae90623718e47d66d1ca4a2d"),
    forks: ForkSchedule {
        homestead: Some(0),
        dao_fork: None,
        dao_fork_support: true,
        eip150: Some(0),
        eip150_hash: EIP150_HASH,
        eip155: Some(10),
        eip158: Some(10),
        byzantium: Some(1_700_000),
        constantinople: Some(4_230_000),
        petersburg: Some(4_939_394),
        istanbul: Some(6_485_846),
        muir_glacier: Some(7_117_117),
        berlin: Some(9_812_189),
        london: Some(10_499_401),
        terminal_total_difficulty: TERMINAL_TOTAL_DIFFICULTY,
    },
    node_arguments: "",
};

static QA02: ChainParams = ChainParams {
    network_name: "Qa02",
    chain_id: 1111,
    genesis_hash: b256!("bf7e331f7f7c1dd2e05159666b3bf8bc7a8a3a9eb1d518969eab529dd9b88c1a"),
    forks: ForkSchedule {
        homestead: Some(0),
        dao_fork: None,
        dao_fork_support: true,
        eip150: Some(0),
        eip150_hash: EIP150_HASH,
        eip155: Some(10),
        eip158: Some(10),
        byzantium: Some(1_700_000),
        constantinople: Some(4_230_000),
        petersburg: Some(4_939_394),
        istanbul: Some(6_485_846),
        muir_glacier: Some(7_117_117),
        berlin: Some(9_812_189),
        london: Some(10_499_401),
        terminal_total_difficulty: TERMINAL_TOTAL_DIFFICULTY,
    },
    node_arguments: "",
};

static PRINET: ChainParams = ChainParams {
    network_name: "Prinet",
    chain_id: 2152,
    genesis_hash: b256!("bf7e331f7f7c1dd2e05159666b3bf8bc7a8a3a9eb1d518969eab529dd9b88c1a"),
    forks: ForkSchedule {
        homestead: Some(0),
        dao_fork: None,
        dao_fork_support: true,
        eip150: Some(0),
        eip150_hash: EIP150_HASH,
        eip155: Some(10),
        eip158: Some(10),
        byzantium: Some(0),
        constantinople: Some(0),
        petersburg: Some(0),
        istanbul: Some(0),
        muir_glacier: Some(0),
        berlin: Some(0),
        london: Some(0),
        terminal_total_difficulty: TERMINAL_TOTAL_DIFFICULTY,
    },
    node_arguments: "",
};

/// Supported Findora networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Anvil,
    Qa02,
    Prinet,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Mainnet, Network::Anvil, Network::Qa02, Network::Prinet];

    /// Parse the `NETWORK` setting. `TESTNET` is kept as an alias of Anvil.
    pub fn from_setting(value: &str) -> Option<Network> {
        match value {
            "MAINNET" => Some(Network::Mainnet),
            "TESTNET" | "ANVIL" => Some(Network::Anvil),
            "QA02" => Some(Network::Qa02),
            "PRINET" => Some(Network::Prinet),
            _ => None,
        }
    }

    /// Look a network up by its Rosetta identifier.
    pub fn from_identifier(identifier: &NetworkIdentifier) -> Option<Network> {
        if identifier.blockchain != BLOCKCHAIN {
            return None;
        }
        Network::ALL
            .into_iter()
            .find(|n| n.params().network_name == identifier.network)
    }

    pub fn params(&self) -> &'static ChainParams {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Anvil => &ANVIL,
            Network::Qa02 => &QA02,
            Network::Prinet => &PRINET,
        }
    }
}
