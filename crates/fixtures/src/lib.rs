//! Fixtures for account-abstraction test scenarios.
//!
//! Resolves deployed singletons from a deployment directory, deploys counterfactual smart
//! accounts through their factory, bootstraps a verifying paymaster with the stake and deposits
//! it needs, and compiles and deploys ad-hoc Solidity at test time.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use alloy_signer_local::{coins_bip39::English, LocalSignerError, MnemonicBuilder, PrivateKeySigner};

pub mod account;
pub mod bindings;
pub mod compiler;
pub mod config;
pub mod context;
pub mod deployer;
pub mod error;
pub mod paymaster;
pub mod registry;

pub use account::{CounterfactualAccounts, ModuleSetup};
pub use compiler::{CompiledArtifact, SolcCompiler};
pub use config::{BootstrapConfig, DeployConfig, FixtureConfig, SolcConfig};
pub use context::FixtureContext;
pub use deployer::ContractHandle;
pub use error::{FixtureError, FixtureResult};
pub use paymaster::{
    BootstrapStep, PaymasterBalances, PaymasterState, SponsoredPaymaster, SponsorshipBootstrap,
};
pub use registry::{ContractName, Deployment, DeploymentRegistry, DeploymentsDir, InMemoryRegistry};

/// Mnemonic of the funded development accounts on a local node.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// Derives the development signer at `index` from [`DEV_MNEMONIC`].
pub fn dev_signer(index: u32) -> Result<PrivateKeySigner, LocalSignerError> {
    MnemonicBuilder::<English>::default()
        .phrase(DEV_MNEMONIC)
        .index(index)?
        .build()
}
