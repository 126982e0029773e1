//! Bootstrapping of the verifying singleton paymaster.
//!
//! A sponsoring paymaster is only usable once it is deployed, staked with the entry point, has a
//! balance credited to its verifying signer and holds an entry point deposit. Each of those is a
//! [`BootstrapStep`]; the funding steps may run in any order, while [`PaymasterState`] tracks the
//! furthest state for which every earlier step has completed.
use std::collections::BTreeSet;

use alloy_primitives::{Address, U256};
use alloy_provider::DynProvider;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolConstructor;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::info;

use crate::{
    bindings::VerifyingSingletonPaymaster::{self, VerifyingSingletonPaymasterInstance},
    context::FixtureContext,
    deployer::{confirm, deploy_bytecode},
    error::{BootstrapError, DeploymentError, FixtureError, FixtureResult},
    registry::ContractName,
};

#[derive(Display, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum PaymasterState {
    Unfunded,
    Deployed,
    Staked,
    SignerFunded,
    Ready,
}

impl PaymasterState {
    /// The furthest state reached by an unbroken prefix of [`BootstrapStep`]s in `completed`.
    pub fn from_completed(completed: &BTreeSet<BootstrapStep>) -> Self {
        BootstrapStep::iter()
            .take_while(|step| completed.contains(step))
            .last()
            .map_or(Self::Unfunded, BootstrapStep::target)
    }
}

#[derive(Display, EnumIter, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[strum(serialize_all = "kebab-case")]
pub enum BootstrapStep {
    /// Deploys the paymaster with its owner, the entry point and the verifying signer.
    Deploy,
    /// The owner stakes the paymaster with the entry point.
    AddStake,
    /// Credits the verifying signer with a balance inside the paymaster.
    DepositForSigner,
    /// Deposits funds for the paymaster at the entry point, used to pay for sponsored operations.
    FundEntryPoint,
}

impl BootstrapStep {
    /// State reached once this step and all steps before it completed.
    pub fn target(self) -> PaymasterState {
        match self {
            Self::Deploy => PaymasterState::Deployed,
            Self::AddStake => PaymasterState::Staked,
            Self::DepositForSigner => PaymasterState::SignerFunded,
            Self::FundEntryPoint => PaymasterState::Ready,
        }
    }

    /// Step leading out of `state`, if any.
    pub fn next(state: PaymasterState) -> Option<Self> {
        match state {
            PaymasterState::Unfunded => Some(Self::Deploy),
            PaymasterState::Deployed => Some(Self::AddStake),
            PaymasterState::Staked => Some(Self::DepositForSigner),
            PaymasterState::SignerFunded => Some(Self::FundEntryPoint),
            PaymasterState::Ready => None,
        }
    }
}

fn check_target(target: PaymasterState) -> Result<(), BootstrapError> {
    if target < PaymasterState::Deployed {
        return Err(BootstrapError::new(
            BootstrapStep::Deploy,
            FixtureError::UnreachableTarget(target),
        ));
    }
    Ok(())
}

fn check_funding_step(step: BootstrapStep) -> Result<(), BootstrapError> {
    if step == BootstrapStep::Deploy {
        return Err(BootstrapError::new(step, FixtureError::NotAFundingStep(step)));
    }
    Ok(())
}

/// A deployed paymaster together with the bootstrap steps applied to it.
#[derive(Debug, Clone)]
pub struct SponsoredPaymaster {
    paymaster: VerifyingSingletonPaymasterInstance<DynProvider>,
    admin: PrivateKeySigner,
    verifying_signer: Address,
    completed: BTreeSet<BootstrapStep>,
}

impl SponsoredPaymaster {
    pub fn address(&self) -> Address {
        *self.paymaster.address()
    }

    /// Handle bound to the default funding key.
    pub fn paymaster(&self) -> &VerifyingSingletonPaymasterInstance<DynProvider> {
        &self.paymaster
    }

    pub fn admin(&self) -> &PrivateKeySigner {
        &self.admin
    }

    pub fn verifying_signer(&self) -> Address {
        self.verifying_signer
    }

    pub fn completed(&self) -> &BTreeSet<BootstrapStep> {
        &self.completed
    }

    pub fn state(&self) -> PaymasterState {
        PaymasterState::from_completed(&self.completed)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == PaymasterState::Ready
    }
}

/// On-chain balances backing a sponsoring paymaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymasterBalances {
    pub staked: bool,
    pub stake: U256,
    pub unstake_delay_secs: u32,
    /// Paymaster deposit held by the entry point.
    pub entry_point_deposit: U256,
    /// Balance credited to the verifying signer inside the paymaster.
    pub signer_balance: U256,
}

/// Drives a [`SponsoredPaymaster`] through its bootstrap steps.
///
/// Deployment and the two deposits are paid by the default funding key, staking by the admin.
/// Amounts come from the context's bootstrap configuration.
#[derive(Debug, Clone, Copy)]
pub struct SponsorshipBootstrap<'a> {
    ctx: &'a FixtureContext,
}

impl<'a> SponsorshipBootstrap<'a> {
    pub fn new(ctx: &'a FixtureContext) -> Self {
        Self { ctx }
    }

    /// Deploys a paymaster owned by `admin` and runs every step until it is ready to sponsor.
    pub async fn run(
        &self,
        admin: &PrivateKeySigner,
        verifying_signer: Address,
    ) -> Result<SponsoredPaymaster, BootstrapError> {
        self.run_until(admin, verifying_signer, PaymasterState::Ready)
            .await
    }

    /// Deploys a paymaster and runs the steps in order until `target` is reached. Useful to set
    /// up a partially funded paymaster.
    ///
    /// `target` must be [`PaymasterState::Deployed`] or later.
    pub async fn run_until(
        &self,
        admin: &PrivateKeySigner,
        verifying_signer: Address,
        target: PaymasterState,
    ) -> Result<SponsoredPaymaster, BootstrapError> {
        check_target(target)?;
        let mut paymaster = self.deploy(admin, verifying_signer).await?;
        while paymaster.state() < target {
            self.advance(&mut paymaster).await?;
        }
        Ok(paymaster)
    }

    /// Deploys the paymaster from the registered creation code.
    pub async fn deploy(
        &self,
        admin: &PrivateKeySigner,
        verifying_signer: Address,
    ) -> Result<SponsoredPaymaster, BootstrapError> {
        let address = self
            .deploy_paymaster(admin.address(), verifying_signer)
            .await
            .map_err(|err| BootstrapError::new(BootstrapStep::Deploy, err))?;

        info!(
            target: "fixtures::paymaster",
            paymaster = %address,
            admin = %admin.address(),
            %verifying_signer,
            "deployed paymaster"
        );

        Ok(self.attach(address, admin.clone(), verifying_signer))
    }

    /// Wraps a paymaster that is already deployed. No funding step is assumed.
    pub fn attach(
        &self,
        address: Address,
        admin: PrivateKeySigner,
        verifying_signer: Address,
    ) -> SponsoredPaymaster {
        SponsoredPaymaster {
            paymaster: VerifyingSingletonPaymaster::new(address, self.ctx.provider().clone()),
            admin,
            verifying_signer,
            completed: BTreeSet::from([BootstrapStep::Deploy]),
        }
    }

    /// Runs the next step in order and returns the new state.
    pub async fn advance(
        &self,
        paymaster: &mut SponsoredPaymaster,
    ) -> Result<PaymasterState, BootstrapError> {
        if let Some(step) = BootstrapStep::next(paymaster.state()) {
            self.execute(paymaster, step).await?;
        }
        Ok(paymaster.state())
    }

    /// Runs a single funding step, regardless of which steps came before it.
    pub async fn execute(
        &self,
        paymaster: &mut SponsoredPaymaster,
        step: BootstrapStep,
    ) -> Result<(), BootstrapError> {
        check_funding_step(step)?;
        self.submit(paymaster, step)
            .await
            .map_err(|err| BootstrapError::new(step, err))?;
        paymaster.completed.insert(step);

        info!(
            target: "fixtures::paymaster",
            paymaster = %paymaster.address(),
            %step,
            state = %paymaster.state(),
            "bootstrap step completed"
        );
        Ok(())
    }

    /// Reads back the stake, deposits and signer balance of `paymaster`.
    pub async fn balances(&self, paymaster: &SponsoredPaymaster) -> FixtureResult<PaymasterBalances> {
        let info = self
            .ctx
            .entry_point()?
            .getDepositInfo(paymaster.address())
            .call()
            .await?;
        let signer_balance = paymaster
            .paymaster
            .getBalance(paymaster.verifying_signer)
            .call()
            .await?;

        Ok(PaymasterBalances {
            staked: info.staked,
            stake: U256::from(info.stake),
            unstake_delay_secs: info.unstakeDelaySec,
            entry_point_deposit: U256::from(info.deposit),
            signer_balance,
        })
    }

    async fn deploy_paymaster(
        &self,
        owner: Address,
        verifying_signer: Address,
    ) -> FixtureResult<Address> {
        let deployment = self.ctx.resolve(ContractName::VerifyingSingletonPaymaster)?;
        let entry_point = self.ctx.resolve(ContractName::EntryPoint)?.address;

        let args = VerifyingSingletonPaymaster::constructorCall {
            _owner: owner,
            _entryPoint: entry_point,
            _verifyingSigner: verifying_signer,
        }
        .abi_encode();

        let address = deploy_bytecode(
            self.ctx.provider(),
            deployment.creation_code()?,
            &args,
            &self.ctx.config().deploy,
        )
        .await?;
        Ok(address)
    }

    async fn submit(&self, paymaster: &SponsoredPaymaster, step: BootstrapStep) -> FixtureResult<()> {
        let funding = &self.ctx.config().bootstrap;
        let pending = match step {
            BootstrapStep::Deploy => return Err(FixtureError::NotAFundingStep(step)),
            BootstrapStep::AddStake => {
                VerifyingSingletonPaymaster::new(
                    paymaster.address(),
                    self.ctx.provider_for(&paymaster.admin),
                )
                .addStake(funding.unstake_delay_secs)
                .value(funding.stake)
                .send()
                .await
            }
            BootstrapStep::DepositForSigner => {
                paymaster
                    .paymaster
                    .depositFor(paymaster.verifying_signer)
                    .value(funding.signer_deposit)
                    .send()
                    .await
            }
            BootstrapStep::FundEntryPoint => {
                self.ctx
                    .entry_point()?
                    .depositTo(paymaster.address())
                    .value(funding.entry_point_deposit)
                    .send()
                    .await
            }
        }
        .map_err(DeploymentError::from)?;

        confirm(pending, &self.ctx.config().deploy).await?;
        Ok(())
    }
}
