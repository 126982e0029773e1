use std::{fmt, sync::Arc};

use alloy_contract::{ContractInstance, Interface};
use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use tracing::info;
use url::Url;

use crate::{
    account::CounterfactualAccounts,
    bindings::{
        IEOAOwnershipRegistryModule::{self, IEOAOwnershipRegistryModuleInstance},
        IEntryPoint::{self, IEntryPointInstance},
        IMockToken::{self, IMockTokenInstance},
        ISmartAccount::{self, ISmartAccountInstance},
        ISmartAccountFactory::{self, ISmartAccountFactoryInstance},
    },
    compiler::SolcCompiler,
    config::FixtureConfig,
    deployer::ContractHandle,
    error::{FixtureResult, RegistryError},
    paymaster::SponsorshipBootstrap,
    registry::{ContractName, Deployment, DeploymentRegistry},
};

/// Shared handles every fixture operation runs against: the node, the deployment registry, the
/// default funding key and the fixture configuration.
///
/// Built once with [`FixtureContext::connect`] before any scenario runs and passed explicitly to
/// every component. Cloning is cheap.
#[derive(Clone)]
pub struct FixtureContext {
    provider: DynProvider,
    rpc_url: Url,
    default_signer: PrivateKeySigner,
    registry: Arc<dyn DeploymentRegistry>,
    config: FixtureConfig,
}

impl fmt::Debug for FixtureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureContext")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("default_signer", &self.default_signer.address())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

impl FixtureContext {
    /// Connects to the node at `rpc_url` and checks that it answers.
    pub async fn connect(
        rpc_url: Url,
        default_signer: PrivateKeySigner,
        registry: Arc<dyn DeploymentRegistry>,
        config: FixtureConfig,
    ) -> FixtureResult<Self> {
        let provider = signer_provider(&rpc_url, &default_signer);
        let chain_id = provider.get_chain_id().await?;

        info!(
            target: "fixtures::context",
            rpc_url = %rpc_url,
            chain_id,
            default_signer = %default_signer.address(),
            "fixture context connected"
        );

        Ok(Self {
            provider,
            rpc_url,
            default_signer,
            registry,
            config,
        })
    }

    /// Provider signing with the default funding key.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Provider signing with a caller supplied key.
    ///
    /// The default key always maps to [`Self::provider`] so its nonces are tracked in one place.
    pub fn provider_for(&self, signer: &PrivateKeySigner) -> DynProvider {
        if signer.address() == self.default_signer.address() {
            return self.provider.clone();
        }
        signer_provider(&self.rpc_url, signer)
    }

    pub fn default_signer(&self) -> &PrivateKeySigner {
        &self.default_signer
    }

    pub fn default_address(&self) -> Address {
        self.default_signer.address()
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// The same node, registry and funding key under other settings.
    pub fn with_config(&self, config: FixtureConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub fn registry(&self) -> &Arc<dyn DeploymentRegistry> {
        &self.registry
    }

    pub fn compiler(&self) -> SolcCompiler {
        SolcCompiler::new(&self.config.solc)
    }

    pub fn resolve(&self, name: ContractName) -> Result<Deployment, RegistryError> {
        self.registry.resolve(name)
    }

    /// Dynamic handle to a registered contract, driven through its JSON ABI.
    pub fn handle(&self, name: ContractName) -> Result<ContractHandle, RegistryError> {
        let deployment = self.resolve(name)?;
        Ok(ContractInstance::new(
            deployment.address,
            self.provider.clone(),
            Interface::new(deployment.abi),
        ))
    }

    pub fn entry_point(&self) -> Result<IEntryPointInstance<DynProvider>, RegistryError> {
        let address = self.resolve(ContractName::EntryPoint)?.address;
        Ok(IEntryPoint::new(address, self.provider.clone()))
    }

    pub fn smart_account_factory(
        &self,
    ) -> Result<ISmartAccountFactoryInstance<DynProvider>, RegistryError> {
        let address = self.resolve(ContractName::SmartAccountFactory)?.address;
        Ok(ISmartAccountFactory::new(address, self.provider.clone()))
    }

    /// The registered account implementation.
    pub fn smart_account_implementation(
        &self,
    ) -> Result<ISmartAccountInstance<DynProvider>, RegistryError> {
        let address = self.resolve(ContractName::SmartAccount)?.address;
        Ok(self.smart_account(address))
    }

    /// An account at `address`, typically one deployed through the factory.
    pub fn smart_account(&self, address: Address) -> ISmartAccountInstance<DynProvider> {
        ISmartAccount::new(address, self.provider.clone())
    }

    pub fn mock_token(&self) -> Result<IMockTokenInstance<DynProvider>, RegistryError> {
        let address = self.resolve(ContractName::MockToken)?.address;
        Ok(IMockToken::new(address, self.provider.clone()))
    }

    pub fn ownership_module(
        &self,
    ) -> Result<IEOAOwnershipRegistryModuleInstance<DynProvider>, RegistryError> {
        let address = self.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
        Ok(IEOAOwnershipRegistryModule::new(
            address,
            self.provider.clone(),
        ))
    }

    pub fn counterfactual_accounts(&self) -> Result<CounterfactualAccounts, RegistryError> {
        Ok(CounterfactualAccounts::new(
            self.smart_account_factory()?,
            self.config.deploy.clone(),
        ))
    }

    pub fn sponsorship_bootstrap(&self) -> SponsorshipBootstrap<'_> {
        SponsorshipBootstrap::new(self)
    }
}

fn signer_provider(rpc_url: &Url, signer: &PrivateKeySigner) -> DynProvider {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer.clone()))
        .connect_http(rpc_url.clone())
        .erased()
}
