use std::{path::PathBuf, time::Duration};

use alloy_primitives::{uint, U256};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Gas ceiling attached to ad-hoc contract creation transactions.
pub const DEFAULT_GAS_LIMIT: u64 = 6_000_000;

/// Confirmations awaited for every state mutating transaction.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Administrator stake locked in the entry point (2 ETH).
pub const DEFAULT_STAKE: U256 = uint!(2_000_000_000_000_000_000_U256);

/// Unlock delay of the administrator stake, in seconds.
pub const DEFAULT_UNSTAKE_DELAY_SECS: u32 = 10;

/// Deposit credited to the verifying signer on the paymaster (1 ETH).
pub const DEFAULT_SIGNER_DEPOSIT: U256 = uint!(1_000_000_000_000_000_000_U256);

/// Paymaster balance held by the entry point (10 ETH).
pub const DEFAULT_ENTRY_POINT_DEPOSIT: U256 = uint!(10_000_000_000_000_000_000_U256);

/// Settings shared by every fixture operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct FixtureConfig {
    #[builder(default)]
    pub deploy: DeployConfig,
    #[builder(default)]
    pub bootstrap: BootstrapConfig,
    #[builder(default)]
    pub solc: SolcConfig,
}

/// Transaction submission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DeployConfig {
    /// Gas limit of contract creation transactions.
    #[builder(default = DEFAULT_GAS_LIMIT)]
    pub gas_limit: u64,
    /// Number of confirmations to wait for before a receipt is accepted.
    #[builder(default = DEFAULT_CONFIRMATIONS)]
    pub confirmations: u64,
    /// Upper bound on a single receipt wait. `None` waits indefinitely.
    pub receipt_timeout: Option<Duration>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Amounts moved by the paymaster bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Value sent with `addStake` by the administrator.
    #[builder(default = DEFAULT_STAKE)]
    pub stake: U256,
    /// Unlock delay passed to `addStake`.
    #[builder(default = DEFAULT_UNSTAKE_DELAY_SECS)]
    pub unstake_delay_secs: u32,
    /// Value sent with `depositFor(verifyingSigner)`.
    #[builder(default = DEFAULT_SIGNER_DEPOSIT)]
    pub signer_deposit: U256,
    /// Value sent with `EntryPoint.depositTo(paymaster)`.
    #[builder(default = DEFAULT_ENTRY_POINT_DEPOSIT)]
    pub entry_point_deposit: U256,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BootstrapConfig {
    /// Total value the bootstrap moves out of its funding accounts.
    pub fn total_funding(&self) -> U256 {
        self.stake + self.signer_deposit + self.entry_point_deposit
    }
}

/// Location of the `solc` binary driven through its standard JSON interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct SolcConfig {
    #[builder(default = PathBuf::from("solc"), into)]
    pub path: PathBuf,
}

impl Default for SolcConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
