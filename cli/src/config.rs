//! `tbs.toml` handling
//!
//! Every key is optional. Command-line flags win over the file.
//!
//! ```toml
//! input = "schema/commands.tsp"
//! output = "generated"
//! languages = ["rust", "typescript"]
//! protocol_version = "1.0.0"
//!
//! [rust]
//! runtime_crate = "tbs_wire"
//!
//! [cpp]
//! namespace = "device_protocol"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tbs_compiler::generators::{CppConfig, RustConfig};
use tbs_compiler::{GeneratorConfig, Language};

pub const CONFIG_FILE: &str = "tbs.toml";

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TbsConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub rust: RustSection,
    #[serde(default)]
    pub cpp: CppSection,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RustSection {
    pub runtime_crate: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CppSection {
    pub namespace: Option<String>,
}

impl TbsConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// An explicit path must exist. Without one, `./tbs.toml` is used when
    /// present.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn languages(&self) -> Result<Vec<Language>> {
        self.languages
            .iter()
            .map(|name| name.parse::<Language>().map_err(anyhow::Error::msg))
            .collect()
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        let mut rust = RustConfig::default();
        if let Some(runtime_crate) = &self.rust.runtime_crate {
            rust.runtime_crate = runtime_crate.clone();
        }
        GeneratorConfig {
            protocol_version: self.protocol_version.clone(),
            rust,
            cpp: CppConfig {
                namespace: self.cpp.namespace.clone(),
            },
        }
    }
}
