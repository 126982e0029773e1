use std::path::PathBuf;

use alloy_primitives::{Address, TxHash};
use alloy_provider::PendingTransactionError;
use alloy_transport::TransportError;

use crate::{
    paymaster::{BootstrapStep, PaymasterState},
    registry::ContractName,
};

pub type FixtureResult<T> = Result<T, FixtureError>;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    /// The factory instantiated the account somewhere other than the address it predicted.
    #[error("counterfactual address mismatch: predicted {predicted}, instantiated {actual}")]
    AddressMismatch { predicted: Address, actual: Address },
    #[error("no code at counterfactual account {address} after instantiation")]
    AccountNotDeployed { address: Address },
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Deployment happens once, through [`SponsorshipBootstrap::deploy`](crate::SponsorshipBootstrap::deploy).
    #[error("{0} is not a funding step")]
    NotAFundingStep(BootstrapStep),
    /// Every bootstrap deploys, so it cannot stop short of [`PaymasterState::Deployed`].
    #[error("bootstrap cannot stop at {0}")]
    UnreachableTarget(PaymasterState),
    #[error(transparent)]
    Contract(#[from] alloy_contract::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no deployment named {0}")]
    NotFound(ContractName),
    #[error("deployment {0} carries no creation bytecode")]
    MissingBytecode(ContractName),
    #[error("failed to read deployment {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed deployment {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    /// The compiler produced no `contracts` map, usually a syntax or type error.
    #[error("could not compile contract:\n{diagnostics}")]
    Failed { diagnostics: String },
    #[error("source defines no deployable contract")]
    NoDeployableContract,
    #[error("source defines several deployable contracts, name one of {candidates:?}")]
    AmbiguousContract { candidates: Vec<String> },
    #[error("no contract named {name} in compiler output, found {available:?}")]
    UnknownContract {
        name: String,
        available: Vec<String>,
    },
    #[error("failed to run solc at {path}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed compiler output")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("invalid bytecode for {name}")]
    InvalidBytecode {
        name: String,
        #[source]
        source: alloy_primitives::hex::FromHexError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Pending(#[from] PendingTransactionError),
    #[error(transparent)]
    Contract(#[from] alloy_contract::Error),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("creation transaction {tx_hash} produced no contract address")]
    MissingContractAddress { tx_hash: TxHash },
}

/// A paymaster bootstrap transition failed. Earlier transitions stay applied on-chain.
#[derive(Debug, thiserror::Error)]
#[error("paymaster bootstrap failed at {step}")]
pub struct BootstrapError {
    pub step: BootstrapStep,
    #[source]
    pub source: Box<FixtureError>,
}

impl BootstrapError {
    pub fn new(step: BootstrapStep, source: impl Into<FixtureError>) -> Self {
        Self {
            step,
            source: Box::new(source.into()),
        }
    }
}
