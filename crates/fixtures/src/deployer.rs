//! Deploys freshly compiled or prebuilt contracts and waits for them to land.
use alloy_contract::{ContractInstance, Interface};
use alloy_network::{Ethereum, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider};
use alloy_rpc_types_eth::{TransactionReceipt, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use tracing::{debug, info};

use crate::{
    compiler::CompiledArtifact,
    config::DeployConfig,
    context::FixtureContext,
    error::{DeploymentError, FixtureResult},
};

/// ABI driven handle to a deployed contract.
pub type ContractHandle = ContractInstance<DynProvider>;

/// Waits for `pending` to be mined with the configured confirmations. A reverted transaction is
/// an error.
pub async fn confirm(
    pending: PendingTransactionBuilder<Ethereum>,
    config: &DeployConfig,
) -> Result<TransactionReceipt, DeploymentError> {
    let tx_hash = *pending.tx_hash();
    debug!(target: "fixtures::deployer", %tx_hash, "waiting for receipt");

    let receipt = pending
        .with_required_confirmations(config.confirmations)
        .with_timeout(config.receipt_timeout)
        .get_receipt()
        .await?;

    if !receipt.status() {
        return Err(DeploymentError::Reverted { tx_hash });
    }

    Ok(receipt)
}

/// Sends a creation transaction for `bytecode` followed by the ABI encoded `constructor_args`
/// and returns the address of the new contract.
pub async fn deploy_bytecode(
    provider: &DynProvider,
    bytecode: &Bytes,
    constructor_args: &[u8],
    config: &DeployConfig,
) -> Result<Address, DeploymentError> {
    let mut code = bytecode.to_vec();
    code.extend_from_slice(constructor_args);

    let tx = TransactionRequest::default()
        .with_deploy_code(code)
        .with_gas_limit(config.gas_limit);

    let pending = provider.send_transaction(tx).await?;
    let receipt = confirm(pending, config).await?;

    receipt
        .contract_address
        .ok_or(DeploymentError::MissingContractAddress {
            tx_hash: receipt.transaction_hash,
        })
}

/// Deploys an already compiled contract from `deployer`.
pub async fn deploy_artifact(
    ctx: &FixtureContext,
    deployer: &PrivateKeySigner,
    artifact: CompiledArtifact,
) -> FixtureResult<ContractHandle> {
    let provider = ctx.provider_for(deployer);
    let address = deploy_bytecode(&provider, &artifact.bytecode, &[], &ctx.config().deploy).await?;

    info!(
        target: "fixtures::deployer",
        contract = %artifact.name,
        %address,
        deployer = %deployer.address(),
        "deployed contract"
    );

    Ok(ContractInstance::new(
        address,
        provider,
        Interface::new(artifact.abi),
    ))
}

/// Compiles `source`, which must define exactly one deployable contract, and deploys it.
///
/// The returned handle is bound to `deployer` and exposes the freshly compiled ABI.
pub async fn deploy_source(
    ctx: &FixtureContext,
    deployer: &PrivateKeySigner,
    source: &str,
) -> FixtureResult<ContractHandle> {
    let artifact = ctx.compiler().compile(source).await?;
    deploy_artifact(ctx, deployer, artifact).await
}

/// Like [`deploy_source`], for sources defining several contracts.
pub async fn deploy_contract(
    ctx: &FixtureContext,
    deployer: &PrivateKeySigner,
    source: &str,
    name: &str,
) -> FixtureResult<ContractHandle> {
    let artifact = ctx.compiler().compile_contract(source, name).await?;
    deploy_artifact(ctx, deployer, artifact).await
}
