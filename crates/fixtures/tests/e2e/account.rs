use alloy_primitives::U256;
use alloy_provider::Provider;
use smart_account_fixtures::{
    bindings::ISmartAccountFactory, deployer::deploy_contract, ContractName,
    CounterfactualAccounts, FixtureError, ModuleSetup,
};

use crate::setup::{devnet, Devnet, ACCOUNT_OWNER};

/// Factories whose instantiation disagrees with their own prediction.
const MISBEHAVING_FACTORIES: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity >=0.8.0;

contract Placeholder {}

abstract contract PredictingFactory {
    event AccountCreation(address indexed account, address indexed initialAuthModule, uint256 indexed index);

    function getAddressForCounterFactualAccount(
        address moduleSetupContract,
        bytes calldata moduleSetupData,
        uint256 index
    ) public pure returns (address) {
        return address(uint160(uint256(keccak256(abi.encode(moduleSetupContract, moduleSetupData, index)))));
    }
}

/// Creates the account at a plain CREATE address.
contract MisplacingFactory is PredictingFactory {
    function deployCounterFactualAccount(
        address moduleSetupContract,
        bytes calldata moduleSetupData,
        uint256 index
    ) external returns (address proxy) {
        proxy = address(new Placeholder());
        emit AccountCreation(proxy, moduleSetupContract, index);
    }
}

/// Reports the predicted address without creating anything there.
contract HollowFactory is PredictingFactory {
    function deployCounterFactualAccount(
        address moduleSetupContract,
        bytes calldata moduleSetupData,
        uint256 index
    ) external returns (address proxy) {
        proxy = getAddressForCounterFactualAccount(moduleSetupContract, moduleSetupData, index);
        emit AccountCreation(proxy, moduleSetupContract, index);
    }
}
"#;

async fn misbehaving_accounts(
    devnet: &Devnet,
    factory: &str,
) -> eyre::Result<CounterfactualAccounts> {
    let ctx = &devnet.ctx;
    let handle = deploy_contract(ctx, devnet.signer(0), MISBEHAVING_FACTORIES, factory).await?;
    Ok(CounterfactualAccounts::new(
        ISmartAccountFactory::new(*handle.address(), ctx.provider().clone()),
        ctx.config().deploy.clone(),
    ))
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn prediction_is_deterministic_and_read_only() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = ctx.counterfactual_accounts()?;
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let setup = ModuleSetup::eoa_ownership(module, ACCOUNT_OWNER, U256::ZERO);

    let first = accounts.predict(&setup).await?;
    let second = accounts.predict(&setup).await?;
    assert_eq!(first, second);
    assert!(ctx.provider().get_code_at(first).await?.is_empty());

    let other_index = accounts.predict(&setup.with_index(U256::from(1))).await?;
    assert_ne!(first, other_index);

    let other_owner =
        ModuleSetup::eoa_ownership(module, devnet.signer(3).address(), setup.index);
    assert_ne!(first, accounts.predict(&other_owner).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn account_lands_at_predicted_address() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = ctx.counterfactual_accounts()?;
    let module = ctx.ownership_module()?;
    let setup = ModuleSetup::eoa_ownership(*module.address(), ACCOUNT_OWNER, U256::ZERO);

    let predicted = accounts.predict(&setup).await?;
    let account = accounts.deploy(&setup).await?;

    assert_eq!(*account.address(), predicted);
    assert!(!ctx.provider().get_code_at(predicted).await?.is_empty());
    assert!(account.isModuleEnabled(*module.address()).call().await?);
    assert_eq!(module.getOwner(predicted).call().await?, ACCOUNT_OWNER);
    assert_eq!(
        account.entryPoint().call().await?,
        *ctx.entry_point()?.address()
    );
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn indices_yield_independent_accounts() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = ctx.counterfactual_accounts()?;
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let setup = ModuleSetup::eoa_ownership(module, ACCOUNT_OWNER, U256::ZERO);

    let first = accounts.instantiate(&setup).await?;
    let second_setup = setup.with_index(U256::from(1));
    let predicted_second = accounts.predict(&second_setup).await?;
    let second = accounts.instantiate(&second_setup).await?;

    assert_ne!(first, second);
    assert_eq!(second, predicted_second);
    assert_eq!(accounts.predict(&setup).await?, first);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn instantiating_twice_fails() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = ctx.counterfactual_accounts()?;
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let setup = ModuleSetup::eoa_ownership(module, ACCOUNT_OWNER, U256::from(7));

    accounts.deploy(&setup).await?;
    let err = accounts.instantiate(&setup).await.unwrap_err();
    assert!(matches!(err, FixtureError::Contract(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn registered_token_is_usable() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let token = ctx.mock_token()?;
    let amount = U256::from(1_000);

    let pending = token.mint(ctx.default_address(), amount).send().await?;
    pending.get_receipt().await?;
    assert_eq!(token.balanceOf(ctx.default_address()).call().await?, amount);

    let handle = ctx.handle(ContractName::MockToken)?;
    assert_eq!(handle.address(), token.address());
    assert!(handle.abi().function("transfer").is_some());
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn misplaced_account_is_an_address_mismatch() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = misbehaving_accounts(&devnet, "MisplacingFactory").await?;
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let setup = ModuleSetup::eoa_ownership(module, ACCOUNT_OWNER, U256::ZERO);
    let expected = accounts.predict(&setup).await?;

    let Err(err) = accounts.deploy(&setup).await else {
        panic!("accepted an account away from its predicted address");
    };
    let FixtureError::AddressMismatch { predicted, actual } = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(predicted, expected);
    assert_ne!(predicted, actual);
    assert!(!ctx.provider().get_code_at(actual).await?.is_empty());
    assert!(ctx.provider().get_code_at(predicted).await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn codeless_account_is_not_deployed() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let accounts = misbehaving_accounts(&devnet, "HollowFactory").await?;
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let setup = ModuleSetup::eoa_ownership(module, ACCOUNT_OWNER, U256::MAX);
    let predicted = accounts.predict(&setup).await?;

    let Err(err) = accounts.deploy(&setup).await else {
        panic!("accepted an account without code");
    };
    assert!(
        matches!(err, FixtureError::AccountNotDeployed { address } if address == predicted),
        "{err:?}"
    );
    Ok(())
}
