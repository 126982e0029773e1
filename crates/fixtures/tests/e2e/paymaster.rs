use alloy_primitives::{uint, Address, U256};
use alloy_provider::{DynProvider, Provider};
use alloy_sol_types::sol;
use smart_account_fixtures::{
    config::{
        DEFAULT_ENTRY_POINT_DEPOSIT, DEFAULT_SIGNER_DEPOSIT, DEFAULT_STAKE,
        DEFAULT_UNSTAKE_DELAY_SECS,
    },
    BootstrapStep, FixtureContext, FixtureError, PaymasterBalances, PaymasterState,
};

use crate::setup::devnet;

sol! {
    #[sol(rpc)]
    interface IPrepaymentSimulator {
        function simulatePaymasterPrepayment(address paymaster, uint256 requiredPrefund) external view;
    }
}

const REQUIRED_PREFUND: U256 = uint!(1_000_000_000_000_000_000_U256);

const READY_BALANCES: PaymasterBalances = PaymasterBalances {
    staked: true,
    stake: DEFAULT_STAKE,
    unstake_delay_secs: DEFAULT_UNSTAKE_DELAY_SECS,
    entry_point_deposit: DEFAULT_ENTRY_POINT_DEPOSIT,
    signer_balance: DEFAULT_SIGNER_DEPOSIT,
};

fn simulator(
    ctx: &FixtureContext,
) -> eyre::Result<IPrepaymentSimulator::IPrepaymentSimulatorInstance<DynProvider>> {
    let entry_point = *ctx.entry_point()?.address();
    Ok(IPrepaymentSimulator::new(
        entry_point,
        ctx.provider().clone(),
    ))
}

async fn can_sponsor(ctx: &FixtureContext, paymaster: Address) -> eyre::Result<bool> {
    Ok(simulator(ctx)?
        .simulatePaymasterPrepayment(paymaster, REQUIRED_PREFUND)
        .call()
        .await
        .is_ok())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn bootstrap_reaches_ready() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let admin = devnet.signer(1);
    let verifying_signer = devnet.signer(2).address();
    let bootstrap = ctx.sponsorship_bootstrap();

    let paymaster = bootstrap.run(admin, verifying_signer).await?;

    assert!(paymaster.is_ready());
    assert_eq!(paymaster.paymaster().owner().call().await?, admin.address());
    assert_eq!(
        paymaster.paymaster().verifyingSigner().call().await?,
        verifying_signer
    );
    assert_eq!(bootstrap.balances(&paymaster).await?, READY_BALANCES);
    assert!(can_sponsor(ctx, paymaster.address()).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn funding_steps_may_run_in_any_order() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let admin = devnet.signer(1);
    let bootstrap = ctx.sponsorship_bootstrap();

    let mut paymaster = bootstrap.deploy(admin, admin.address()).await?;
    assert_eq!(paymaster.state(), PaymasterState::Deployed);

    bootstrap
        .execute(&mut paymaster, BootstrapStep::FundEntryPoint)
        .await?;
    bootstrap
        .execute(&mut paymaster, BootstrapStep::DepositForSigner)
        .await?;
    assert_eq!(paymaster.state(), PaymasterState::Deployed);

    bootstrap
        .execute(&mut paymaster, BootstrapStep::AddStake)
        .await?;

    assert!(paymaster.is_ready());
    assert_eq!(bootstrap.balances(&paymaster).await?, READY_BALANCES);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn unfunded_entry_point_deposit_cannot_sponsor() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let admin = devnet.signer(1);
    let bootstrap = ctx.sponsorship_bootstrap();

    let mut paymaster = bootstrap
        .run_until(admin, admin.address(), PaymasterState::SignerFunded)
        .await?;
    assert_eq!(paymaster.state(), PaymasterState::SignerFunded);

    let balances = bootstrap.balances(&paymaster).await?;
    assert!(balances.staked);
    assert_eq!(balances.signer_balance, DEFAULT_SIGNER_DEPOSIT);
    assert_eq!(balances.entry_point_deposit, U256::ZERO);
    assert!(!can_sponsor(ctx, paymaster.address()).await?);

    assert_eq!(
        bootstrap.advance(&mut paymaster).await?,
        PaymasterState::Ready
    );
    assert!(can_sponsor(ctx, paymaster.address()).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn only_the_owner_can_stake() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let owner = devnet.signer(1);
    let bootstrap = ctx.sponsorship_bootstrap();

    let deployed = bootstrap.deploy(owner, owner.address()).await?;
    let mut impostor =
        bootstrap.attach(deployed.address(), devnet.signer(2).clone(), owner.address());

    let err = bootstrap
        .execute(&mut impostor, BootstrapStep::AddStake)
        .await
        .unwrap_err();
    assert_eq!(err.step, BootstrapStep::AddStake);
    assert_eq!(impostor.state(), PaymasterState::Deployed);
    assert!(!bootstrap.balances(&impostor).await?.staked);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn deployment_is_not_an_executable_step() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let admin = devnet.signer(1);
    let bootstrap = ctx.sponsorship_bootstrap();

    let mut paymaster = bootstrap.deploy(admin, admin.address()).await?;

    let Err(err) = bootstrap
        .execute(&mut paymaster, BootstrapStep::Deploy)
        .await
    else {
        panic!("executed deployment as a funding step");
    };
    assert_eq!(err.step, BootstrapStep::Deploy);
    assert!(matches!(
        *err.source,
        FixtureError::NotAFundingStep(BootstrapStep::Deploy)
    ));
    assert_eq!(paymaster.state(), PaymasterState::Deployed);
    Ok(())
}

#[tokio::test]
#[ignore = "requires anvil and solc"]
async fn unfunded_target_is_rejected_before_deploying() -> eyre::Result<()> {
    let devnet = devnet().await?;
    let ctx = &devnet.ctx;
    let admin = devnet.signer(1);
    let nonce = ctx.provider().get_transaction_count(ctx.default_address()).await?;

    let Err(err) = ctx
        .sponsorship_bootstrap()
        .run_until(admin, admin.address(), PaymasterState::Unfunded)
        .await
    else {
        panic!("bootstrapped towards an unfunded paymaster");
    };
    assert!(matches!(
        *err.source,
        FixtureError::UnreachableTarget(PaymasterState::Unfunded)
    ));
    assert_eq!(
        ctx.provider().get_transaction_count(ctx.default_address()).await?,
        nonce
    );
    Ok(())
}
