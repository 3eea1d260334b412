//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use concord_assembler::BudgetConfig;
use concord_enricher::EnricherConfig;
use concord_llm::OracleConfig;
use concord_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a `concord` run is configured with.
///
/// Every section is optional in the file; credentials only ever come from
/// the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    /// Folder of `*.hbs` templates overriding the built-in instructions
    pub templates_dir: Option<PathBuf>,

    /// Oracle provider settings
    pub oracle: OracleConfig,

    /// Token limits
    pub budget: BudgetConfig,

    /// Link enrichment settings
    pub enricher: EnricherConfig,

    /// Run settings and file locations
    pub resolver: ResolverConfig,
}

impl ConcordConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load the file at `path`, or the defaults when no path is given.
    ///
    /// Credentials are read from the environment afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    CliError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };
        Ok(config.with_env_credentials())
    }

    /// Read API keys and tokens from the environment.
    pub fn with_env_credentials(mut self) -> Self {
        self.oracle = self.oracle.with_env_credentials();
        self.enricher = self.enricher.with_env_credentials();
        self
    }

    /// Use `model` for every oracle call.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.oracle.model = model.clone();
        self.resolver.model = model;
        self
    }

    /// Model used for oracle calls; the resolver section wins over the oracle section.
    pub fn model(&self) -> &str {
        if self.resolver.model.trim().is_empty() {
            &self.oracle.model
        } else {
            &self.resolver.model
        }
    }

    /// Resolver settings with the effective model filled in.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            model: self.model().to_string(),
            ..self.resolver.clone()
        }
    }

    /// Validate the sections every command uses.
    ///
    /// The model is checked by the commands that query the oracle.
    pub fn validate(&self) -> Result<()> {
        self.budget.validate().map_err(CliError::Config)?;
        self.enricher.validate().map_err(CliError::Config)?;
        Ok(())
    }
}
