//! Test-time Solidity compilation through `solc --standard-json`.
use std::{collections::BTreeMap, path::PathBuf, process::Stdio};

use alloy_json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

use crate::{config::SolcConfig, error::CompilationError};

/// Name under which the compiled source unit is submitted.
pub const SOURCE_NAME: &str = "tmp.sol";

/// Bytecode and interface of a single compiled contract. Produced fresh for every compile call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    pub name: String,
    pub bytecode: Bytes,
    pub abi: JsonAbi,
}

/// Drives a local `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    path: PathBuf,
}

impl SolcCompiler {
    pub fn new(config: &SolcConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    /// Compiles `source`, which must define exactly one deployable contract.
    pub async fn compile(&self, source: &str) -> Result<CompiledArtifact, CompilationError> {
        self.run(source).await?.into_artifact(None)
    }

    /// Compiles `source` and selects the contract called `name`.
    pub async fn compile_contract(
        &self,
        source: &str,
        name: &str,
    ) -> Result<CompiledArtifact, CompilationError> {
        self.run(source).await?.into_artifact(Some(name))
    }

    async fn run(&self, source: &str) -> Result<CompilerOutput, CompilationError> {
        let input = serde_json::to_vec(&StandardJsonInput::new(source))?;

        let unavailable = |source| CompilationError::Unavailable {
            path: self.path.clone(),
            source,
        };

        let mut child = Command::new(&self.path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).await.map_err(unavailable)?;
        }

        let output = child.wait_with_output().await.map_err(unavailable)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        debug!(
            target: "fixtures::compiler",
            solc = %self.path.display(),
            status = %output.status,
            "solc finished"
        );

        match CompilerOutput::parse(&stdout) {
            Err(_) if !output.status.success() => Err(CompilationError::Failed {
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            parsed => parsed,
        }
    }
}

#[derive(Debug, Serialize)]
struct StandardJsonInput<'a> {
    language: &'static str,
    settings: Settings,
    sources: BTreeMap<&'static str, SourceUnit<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Settings {
    output_selection: BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>>,
}

#[derive(Debug, Serialize)]
struct SourceUnit<'a> {
    content: &'a str,
}

impl<'a> StandardJsonInput<'a> {
    fn new(content: &'a str) -> Self {
        let selection = BTreeMap::from([("*", vec!["abi", "evm.bytecode"])]);
        Self {
            language: "Solidity",
            settings: Settings {
                output_selection: BTreeMap::from([("*", selection)]),
            },
            sources: BTreeMap::from([(SOURCE_NAME, SourceUnit { content })]),
        }
    }
}

/// The subset of the standard JSON output the fixtures consume.
#[derive(Debug, Default, Deserialize)]
pub struct CompilerOutput {
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    /// Source file name, then contract name. Absent when compilation failed.
    #[serde(default)]
    pub contracts: Option<BTreeMap<String, BTreeMap<String, ContractOutput>>>,
    #[serde(skip)]
    raw: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContractOutput {
    #[serde(default)]
    pub abi: JsonAbi,
    pub evm: EvmOutput,
}

#[derive(Debug, Deserialize)]
pub struct EvmOutput {
    pub bytecode: BytecodeOutput,
}

#[derive(Debug, Deserialize)]
pub struct BytecodeOutput {
    /// Hex encoded creation code, without the `0x` prefix.
    pub object: String,
}

impl ContractOutput {
    fn is_deployable(&self) -> bool {
        !self.evm.bytecode.object.is_empty()
    }
}

impl CompilerOutput {
    /// Parses the raw JSON printed by `solc --standard-json`.
    pub fn parse(raw: &str) -> Result<Self, CompilationError> {
        let mut output: Self = serde_json::from_str(raw)?;
        output.raw = raw.to_string();
        Ok(output)
    }

    /// Compiler diagnostics, one per line, or the raw output when the compiler gave none.
    pub fn diagnostics(&self) -> String {
        if self.errors.is_empty() {
            return self.raw.clone();
        }
        self.errors
            .iter()
            .map(|d| {
                d.formatted_message
                    .clone()
                    .unwrap_or_else(|| format!("{}: {}", d.severity, d.message))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Selects one contract of the compiled unit.
    ///
    /// With `target`, the contract of that name is returned. Without it the unit must define
    /// exactly one contract with creation code; interfaces and abstract contracts are skipped.
    pub fn into_artifact(self, target: Option<&str>) -> Result<CompiledArtifact, CompilationError> {
        let diagnostics = self.diagnostics();
        let Some(mut files) = self.contracts else {
            return Err(CompilationError::Failed { diagnostics });
        };
        let Some(contracts) = files.remove(SOURCE_NAME) else {
            return Err(CompilationError::Failed { diagnostics });
        };

        for warning in self.errors.iter().filter(|d| d.severity == "warning") {
            warn!(target: "fixtures::compiler", message = %warning.message, "solc warning");
        }

        let (name, contract) = match target {
            Some(name) => {
                let available = contracts.keys().cloned().collect::<Vec<_>>();
                let Some((name, contract)) = contracts.into_iter().find(|(n, _)| n == name) else {
                    return Err(CompilationError::UnknownContract {
                        name: name.to_string(),
                        available,
                    });
                };
                if !contract.is_deployable() {
                    return Err(CompilationError::NoDeployableContract);
                }
                (name, contract)
            }
            None => {
                let mut deployable = contracts
                    .into_iter()
                    .filter(|(_, c)| c.is_deployable())
                    .collect::<Vec<_>>();
                match deployable.len() {
                    0 => return Err(CompilationError::NoDeployableContract),
                    1 => deployable.remove(0),
                    _ => {
                        return Err(CompilationError::AmbiguousContract {
                            candidates: deployable.into_iter().map(|(n, _)| n).collect(),
                        })
                    }
                }
            }
        };

        let bytecode = hex::decode(&contract.evm.bytecode.object)
            .map_err(|source| CompilationError::InvalidBytecode {
                name: name.clone(),
                source,
            })?
            .into();

        Ok(CompiledArtifact {
            name,
            bytecode,
            abi: contract.abi,
        })
    }
}
