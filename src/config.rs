use super::ledger::ContractBinding;
use anyhow::Context;
use ethers::abi::{parse_abi, Abi};
use ethers::types::Address;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Startup configuration. All of it describes external collaborators; the
/// client itself keeps no durable state.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the signing provider.
    pub rpc_url: String,
    /// Address of the deployed post ledger contract.
    pub contract_address: Address,
    /// Compiled-contract artifact whose `abi` field is the method
    /// interface. Falls back to the built-in interface when absent.
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Builds the immutable contract binding shared by the read and write
    /// paths for the process lifetime.
    pub fn binding(&self) -> anyhow::Result<ContractBinding> {
        let interface = match &self.artifact_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading artifact {}", path.display()))?;
                parse_artifact(&raw)
                    .with_context(|| format!("parsing artifact {}", path.display()))?
            }
            None => default_interface()?,
        };
        Ok(ContractBinding::new(self.contract_address, interface))
    }
}

#[derive(Deserialize)]
struct Artifact {
    abi: Abi,
}

fn parse_artifact(raw: &str) -> anyhow::Result<Abi> {
    let artifact: Artifact = serde_json::from_str(raw)?;
    Ok(artifact.abi)
}

/// The ledger's method interface: post count, indexed getter, submission.
pub fn default_interface() -> anyhow::Result<Abi> {
    parse_abi(&[
        "function postCount() view returns (uint256)",
        "function posts(uint256) view returns (address, string, uint256)",
        "function createPost(string)",
    ])
    .map_err(|e| anyhow::anyhow!("built-in interface failed to parse: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_with_and_without_artifact() {
        let config: Config = serde_json::from_str(
            r#"{
                "rpc_url": "http://localhost:8545",
                "contract_address": "0x5fbdb2315678afecb367f032d93f642f64180aa3"
            }"#,
        )
        .unwrap();
        assert!(config.artifact_path.is_none());
        assert!(config.binding().is_ok());
    }

    #[test]
    fn built_in_interface_has_all_three_methods() {
        let abi = default_interface().unwrap();
        assert!(abi.function("postCount").is_ok());
        assert!(abi.function("posts").is_ok());
        assert!(abi.function("createPost").is_ok());
    }

    #[test]
    fn artifact_abi_field_is_extracted() {
        let abi = parse_artifact(
            r#"{
                "contractName": "SocialNetwork",
                "abi": [
                    {
                        "type": "function",
                        "name": "postCount",
                        "inputs": [],
                        "outputs": [{ "name": "", "type": "uint256" }],
                        "stateMutability": "view"
                    }
                ]
            }"#,
        )
        .unwrap();
        assert!(abi.function("postCount").is_ok());
    }
}
