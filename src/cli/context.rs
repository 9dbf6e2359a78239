//! Invocation context shared by commands.

use std::path::PathBuf;

use tracing::debug;

use crate::core::config::Settings;
use crate::core::project::ProjectId;
use crate::core::vault::Vault;
use crate::error::{ConfigError, Result};

/// Global flags, resolved into a [`Vault`] on demand.
#[derive(Debug, Clone, Default)]
pub struct Context {
    database: Option<PathBuf>,
    project: Option<String>,
}

impl Context {
    pub fn new(database: Option<PathBuf>, project: Option<String>) -> Self {
        Self { database, project }
    }

    /// Settings with command-line overrides applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load()?;
        if let Some(database) = &self.database {
            settings.database = database.clone();
        }
        Ok(settings)
    }

    /// The explicit project id, or the one detected from the working
    /// directory.
    pub fn project(&self) -> Result<ProjectId> {
        match &self.project {
            Some(id) => ProjectId::new(id.as_str()),
            None => {
                let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
                let project = ProjectId::detect(&cwd)?;
                debug!(root = %project.root.display(), "using detected project");
                Ok(project.id)
            }
        }
    }

    /// Open the vault for this invocation.
    pub fn open_vault(&self) -> Result<Vault> {
        let settings = self.settings()?;
        Vault::open(&settings, self.project()?)
    }

    /// Open the vault for a report that must not fail on key problems.
    pub fn inspect_vault(&self) -> Result<Vault> {
        let settings = self.settings()?;
        Vault::inspect(&settings, self.project()?)
    }
}
