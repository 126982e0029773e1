use std::{
    collections::HashMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use serde::Deserialize;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::{compiler::CompiledArtifact, error::RegistryError};

/// Logical names of the contracts a fixture may look up.
#[derive(Display, EnumString, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractName {
    EntryPoint,
    SmartAccount,
    SmartAccountFactory,
    MockToken,
    #[strum(serialize = "EOAOwnershipRegistryModule")]
    EoaOwnershipRegistryModule,
    VerifyingSingletonPaymaster,
}

/// A deployed (or deployable) contract: its address, interface and, when known, the creation
/// code it was deployed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub name: ContractName,
    pub address: Address,
    pub abi: JsonAbi,
    pub bytecode: Option<Bytes>,
}

impl Deployment {
    pub fn new(name: ContractName, address: Address, abi: JsonAbi) -> Self {
        Self {
            name,
            address,
            abi,
            bytecode: None,
        }
    }

    pub fn with_bytecode(mut self, bytecode: Bytes) -> Self {
        self.bytecode = (!bytecode.is_empty()).then_some(bytecode);
        self
    }

    /// Registers a freshly compiled artifact under `name`.
    pub fn from_compiled(name: ContractName, address: Address, artifact: CompiledArtifact) -> Self {
        Self::new(name, address, artifact.abi).with_bytecode(artifact.bytecode)
    }

    /// Creation code to deploy a new instance of this contract.
    pub fn creation_code(&self) -> Result<&Bytes, RegistryError> {
        self.bytecode
            .as_ref()
            .ok_or(RegistryError::MissingBytecode(self.name))
    }
}

/// Directory service mapping a logical contract name to its deployment.
pub trait DeploymentRegistry: fmt::Debug + Send + Sync {
    fn resolve(&self, name: ContractName) -> Result<Deployment, RegistryError>;
}

/// On-disk deployment artifact, one JSON file per contract.
#[derive(Debug, Deserialize)]
struct DeploymentArtifact {
    address: Address,
    #[serde(default)]
    abi: JsonAbi,
    #[serde(default)]
    bytecode: Option<Bytes>,
}

/// Reads `<root>/<network>/<ContractName>.json` artifacts as written by `hardhat-deploy`.
#[derive(Debug, Clone)]
pub struct DeploymentsDir {
    dir: PathBuf,
}

impl DeploymentsDir {
    pub fn new(root: impl AsRef<Path>, network: &str) -> Self {
        Self {
            dir: root.as_ref().join(network),
        }
    }

    pub fn path(&self, name: ContractName) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl DeploymentRegistry for DeploymentsDir {
    fn resolve(&self, name: ContractName) -> Result<Deployment, RegistryError> {
        let path = self.path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RegistryError::NotFound(name))
            }
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        let artifact: DeploymentArtifact = serde_json::from_str(&contents)
            .map_err(|source| RegistryError::Json { path, source })?;

        debug!(target: "fixtures::registry", %name, address = %artifact.address, "resolved deployment");

        let deployment = Deployment::new(name, artifact.address, artifact.abi);
        Ok(match artifact.bytecode {
            Some(bytecode) => deployment.with_bytecode(bytecode),
            None => deployment,
        })
    }
}

/// Registry of deployments made during the current run.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    deployments: HashMap<ContractName, Deployment>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the deployment registered under its name.
    pub fn insert(&mut self, deployment: Deployment) -> Option<Deployment> {
        self.deployments.insert(deployment.name, deployment)
    }

    pub fn with(mut self, deployment: Deployment) -> Self {
        self.insert(deployment);
        self
    }
}

impl DeploymentRegistry for InMemoryRegistry {
    fn resolve(&self, name: ContractName) -> Result<Deployment, RegistryError> {
        self.deployments
            .get(&name)
            .cloned()
            .ok_or(RegistryError::NotFound(name))
    }
}
