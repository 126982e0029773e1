use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider};
use alloy_sol_types::SolCall;
use tracing::info;

use crate::{
    bindings::{
        IEOAOwnershipRegistryModule::initForSmartAccountCall,
        ISmartAccount::{self, ISmartAccountInstance},
        ISmartAccountFactory::{AccountCreation, ISmartAccountFactoryInstance},
    },
    config::DeployConfig,
    deployer::confirm,
    error::{DeploymentError, FixtureError, FixtureResult},
};

/// Inputs that fully determine a counterfactual account address: the module setup contract, the
/// calldata it is initialised with, and a salt index spanning the factory's full `uint256` range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleSetup {
    pub setup_contract: Address,
    pub setup_data: Bytes,
    pub index: U256,
}

impl ModuleSetup {
    pub fn new(setup_contract: Address, setup_data: impl Into<Bytes>, index: U256) -> Self {
        Self {
            setup_contract,
            setup_data: setup_data.into(),
            index,
        }
    }

    /// An account owned by `owner` through the EOA ownership registry module.
    pub fn eoa_ownership(module: Address, owner: Address, index: U256) -> Self {
        let data = initForSmartAccountCall { eoaOwner: owner }.abi_encode();
        Self::new(module, data, index)
    }

    /// The same setup under another salt index.
    pub fn with_index(&self, index: U256) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

/// Predicts and instantiates smart accounts through the account factory.
#[derive(Clone)]
pub struct CounterfactualAccounts {
    factory: ISmartAccountFactoryInstance<DynProvider>,
    config: DeployConfig,
}

impl CounterfactualAccounts {
    pub fn new(factory: ISmartAccountFactoryInstance<DynProvider>, config: DeployConfig) -> Self {
        Self { factory, config }
    }

    pub fn factory(&self) -> Address {
        *self.factory.address()
    }

    /// Address the account for `setup` has, or will have once instantiated. Read only.
    pub async fn predict(&self, setup: &ModuleSetup) -> FixtureResult<Address> {
        let predicted = self
            .factory
            .getAddressForCounterFactualAccount(
                setup.setup_contract,
                setup.setup_data.clone(),
                setup.index,
            )
            .call()
            .await?;
        Ok(predicted)
    }

    /// Instantiates the account for `setup` and returns the address the factory reports.
    ///
    /// Fails when the account already exists, since the factory creation reverts.
    pub async fn instantiate(&self, setup: &ModuleSetup) -> FixtureResult<Address> {
        let call = self.factory.deployCounterFactualAccount(
            setup.setup_contract,
            setup.setup_data.clone(),
            setup.index,
        );

        let simulated = call.call().await?;
        let pending = call.send().await.map_err(DeploymentError::from)?;
        let receipt = confirm(pending, &self.config).await?;

        let factory = self.factory();
        let created = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == factory)
            .find_map(|log| log.log_decode::<AccountCreation>().ok())
            .map(|log| log.inner.data.account)
            .unwrap_or(simulated);

        info!(
            target: "fixtures::account",
            account = %created,
            %factory,
            index = %setup.index,
            tx_hash = %receipt.transaction_hash,
            "instantiated counterfactual account"
        );

        Ok(created)
    }

    /// Predicts, instantiates and checks that the account landed at the predicted address.
    pub async fn deploy(
        &self,
        setup: &ModuleSetup,
    ) -> FixtureResult<ISmartAccountInstance<DynProvider>> {
        let predicted = self.predict(setup).await?;
        let actual = self.instantiate(setup).await?;
        if actual != predicted {
            return Err(FixtureError::AddressMismatch { predicted, actual });
        }

        let provider = self.factory.provider();
        if provider.get_code_at(predicted).await?.is_empty() {
            return Err(FixtureError::AccountNotDeployed { address: predicted });
        }

        Ok(ISmartAccount::new(predicted, provider.clone()))
    }
}
