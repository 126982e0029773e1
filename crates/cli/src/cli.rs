use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy_primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use clap::{Args, Parser, Subcommand};
use eyre::eyre::WrapErr;
use serde_json::json;
use smart_account_fixtures::{
    deployer::{deploy_contract, deploy_source},
    dev_signer, ContractName, DeploymentsDir, FixtureConfig, FixtureContext, ModuleSetup,
    PaymasterState, SolcCompiler,
};
use tracing::info;
use url::Url;

/// Operator tooling for account-abstraction fixtures on a development node.
///
/// Commands:
///  - `compile`: Compile a Solidity file and print its ABI and creation code.
///  - `deploy`: Compile a Solidity file and deploy it.
///  - `account`: Predict, and optionally instantiate, a counterfactual smart account.
///  - `paymaster`: Deploy and fund a verifying paymaster.
#[derive(Debug, Clone, Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub node: NodeArgs,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Compile a Solidity file and print its ABI and creation code.
    Compile(CompileArgs),
    /// Compile a Solidity file and deploy it from the funding key.
    Deploy(CompileArgs),
    /// Predict, and optionally instantiate, a counterfactual smart account.
    Account(AccountArgs),
    /// Deploy a verifying paymaster and run its bootstrap steps.
    Paymaster(PaymasterArgs),
}

#[derive(Debug, Clone, Args)]
pub struct NodeArgs {
    /// The RPC URL of the development node.
    #[clap(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545", global = true)]
    pub rpc_url: Url,
    /// Root of the deployment artifacts directory.
    #[clap(long, env = "DEPLOYMENTS_DIR", default_value = "deployments", global = true)]
    pub deployments: PathBuf,
    /// Network subdirectory of the deployment artifacts.
    #[clap(long, env = "NETWORK", default_value = "localhost", global = true)]
    pub network: String,
    /// JSON file with fixture settings. Flags below override it.
    #[clap(long, env = "FIXTURE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
    /// The solc binary.
    #[clap(long, env = "SOLC_PATH", global = true)]
    pub solc: Option<PathBuf>,
    /// Gas limit of contract creation transactions.
    #[clap(long, env = "GAS_LIMIT", global = true)]
    pub gas_limit: Option<u64>,
    /// The funding key. Defaults to the first development account.
    #[clap(long, env = "PRIVATE_KEY", global = true)]
    pub private_key: Option<PrivateKeySigner>,
}

#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// The Solidity source file.
    pub source: PathBuf,
    /// The contract to select when the file defines several.
    #[clap(long)]
    pub contract: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    /// Owner registered with the EOA ownership module. Defaults to the funding key.
    #[clap(long)]
    pub owner: Option<Address>,
    /// The salt index of the account.
    #[clap(long, default_value = "0")]
    pub index: U256,
    /// Only print the predicted address.
    #[clap(long)]
    pub predict_only: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PaymasterArgs {
    /// The paymaster owner, which stakes it. Defaults to the funding key.
    #[clap(long, env = "PAYMASTER_ADMIN_KEY")]
    pub admin_key: Option<PrivateKeySigner>,
    /// Signer whose signatures the paymaster accepts. Defaults to the owner.
    #[clap(long)]
    pub verifying_signer: Option<Address>,
    /// Stop once the paymaster reaches this state.
    #[clap(long, default_value = "ready")]
    pub until: PaymasterState,
}

impl Cli {
    pub async fn run(self) -> eyre::Result<()> {
        let config = self.node.fixture_config()?;
        match self.command {
            Commands::Compile(args) => compile(&config, args).await,
            Commands::Deploy(args) => deploy(&self.node.connect(config).await?, args).await,
            Commands::Account(args) => account(&self.node.connect(config).await?, args).await,
            Commands::Paymaster(args) => paymaster(&self.node.connect(config).await?, args).await,
        }
    }
}

impl NodeArgs {
    fn fixture_config(&self) -> eyre::Result<FixtureConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .wrap_err_with(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&contents)
                    .wrap_err_with(|| format!("malformed fixture config {}", path.display()))?
            }
            None => FixtureConfig::default(),
        };

        if let Some(solc) = &self.solc {
            config.solc.path = solc.clone();
        }
        if let Some(gas_limit) = self.gas_limit {
            config.deploy.gas_limit = gas_limit;
        }
        Ok(config)
    }

    async fn connect(&self, config: FixtureConfig) -> eyre::Result<FixtureContext> {
        let signer = match &self.private_key {
            Some(signer) => signer.clone(),
            None => dev_signer(0)?,
        };
        let registry = Arc::new(DeploymentsDir::new(&self.deployments, &self.network));

        FixtureContext::connect(self.rpc_url.clone(), signer, registry, config)
            .await
            .wrap_err_with(|| format!("failed to connect to {}", self.rpc_url))
    }
}

fn read_source(path: &Path) -> eyre::Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

async fn compile(config: &FixtureConfig, args: CompileArgs) -> eyre::Result<()> {
    let source = read_source(&args.source)?;
    let compiler = SolcCompiler::new(&config.solc);
    let artifact = match &args.contract {
        Some(name) => compiler.compile_contract(&source, name).await?,
        None => compiler.compile(&source).await?,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "contractName": artifact.name,
            "abi": artifact.abi,
            "bytecode": artifact.bytecode,
        }))?
    );
    Ok(())
}

async fn deploy(ctx: &FixtureContext, args: CompileArgs) -> eyre::Result<()> {
    let source = read_source(&args.source)?;
    let deployer = ctx.default_signer();
    let contract = match &args.contract {
        Some(name) => deploy_contract(ctx, deployer, &source, name).await?,
        None => deploy_source(ctx, deployer, &source).await?,
    };

    println!("{}", contract.address());
    Ok(())
}

async fn account(ctx: &FixtureContext, args: AccountArgs) -> eyre::Result<()> {
    let module = ctx.resolve(ContractName::EoaOwnershipRegistryModule)?.address;
    let owner = args.owner.unwrap_or_else(|| ctx.default_address());
    let setup = ModuleSetup::eoa_ownership(module, owner, args.index);
    let accounts = ctx.counterfactual_accounts()?;

    let predicted = accounts.predict(&setup).await?;
    info!(target: "sa-fixtures::account", %predicted, %owner, index = %args.index, "predicted account");

    if !args.predict_only {
        let account = accounts.deploy(&setup).await?;
        let entry_point = account.entryPoint().call().await?;
        info!(target: "sa-fixtures::account", %entry_point, "account deployed");
    }

    println!("{predicted}");
    Ok(())
}

async fn paymaster(ctx: &FixtureContext, args: PaymasterArgs) -> eyre::Result<()> {
    let admin = args
        .admin_key
        .unwrap_or_else(|| ctx.default_signer().clone());
    let verifying_signer = args.verifying_signer.unwrap_or_else(|| admin.address());

    let bootstrap = ctx.sponsorship_bootstrap();
    let paymaster = bootstrap
        .run_until(&admin, verifying_signer, args.until)
        .await?;
    let balances = bootstrap.balances(&paymaster).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "paymaster": paymaster.address(),
            "owner": admin.address(),
            "verifyingSigner": verifying_signer,
            "state": paymaster.state().to_string(),
            "staked": balances.staked,
            "stake": balances.stake,
            "unstakeDelaySec": balances.unstake_delay_secs,
            "entryPointDeposit": balances.entry_point_deposit,
            "signerBalance": balances.signer_balance,
        }))?
    );
    Ok(())
}
