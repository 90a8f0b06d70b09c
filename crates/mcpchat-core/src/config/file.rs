//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/mcpchat/config.yaml) and workspace-level (.config/mcpchat/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::mcp::McpTransport;

use super::error::{ConfigError, ConfigResult};
use super::settings::ConfigFile;

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/mcpchat/config.yaml)
    User,
    /// Workspace-level config (.config/mcpchat/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based configuration provider
///
/// Reads and writes one YAML [`ConfigFile`]. A missing file reads as the
/// default configuration.
///
/// # Example
///
/// ```no_run
/// use mcpchat_core::config::FileConfigProvider;
///
/// let user = FileConfigProvider::user();
/// let workspace = FileConfigProvider::workspace(".");
/// let config = FileConfigProvider::load_merged(&user, &workspace)?;
/// # Ok::<(), mcpchat_core::config::ConfigError>(())
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level provider (~/.config/mcpchat/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("mcpchat").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level provider (.config/mcpchat/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("mcpchat").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Load both levels; workspace values override user values
    pub fn load_merged(user: &FileConfigProvider, workspace: &FileConfigProvider) -> ConfigResult<ConfigFile> {
        Ok(user.get_config()?.merge(workspace.get_config()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Write `config` to disk, creating parent directories
    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_yaml::to_string(config)?)?;
        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Cached config, loading it on first use
    pub fn get_config(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Add an MCP server entry
    pub fn add_mcp_server(&self, name: &str, transport: McpTransport) -> ConfigResult<()> {
        let mut config = self.get_config()?;
        if config.mcp_servers.contains_key(name) {
            return Err(ConfigError::ServerExists(name.to_string()));
        }
        config.mcp_servers.insert(name.to_string(), transport);
        self.save(&config)
    }

    /// Remove an MCP server entry
    pub fn remove_mcp_server(&self, name: &str) -> ConfigResult<()> {
        let mut config = self.get_config()?;
        if config.mcp_servers.remove(name).is_none() {
            return Err(ConfigError::ServerNotFound(name.to_string()));
        }
        self.save(&config)
    }

    /// Copy the current file next to itself with a `.backup` suffix
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }

        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);
        assert!(!provider.exists());
        assert_eq!(provider.get_config().unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_mcp_server_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        let transport = McpTransport::stdio("python", vec!["-m".into(), "mcp_modules.openmetadata.src".into()]);
        provider.add_mcp_server("openmetadata", transport.clone()).unwrap();
        assert!(provider.exists());
        assert!(matches!(
            provider.add_mcp_server("openmetadata", transport.clone()),
            Err(ConfigError::ServerExists(_))
        ));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("openmetadata"));
        assert!(content.contains("transport: stdio"));

        let reloaded = provider.reload().unwrap();
        assert_eq!(reloaded.mcp_servers.get("openmetadata"), Some(&transport));

        provider.remove_mcp_server("openmetadata").unwrap();
        assert!(matches!(
            provider.remove_mcp_server("openmetadata"),
            Err(ConfigError::ServerNotFound(_))
        ));
    }

    #[test]
    fn test_workspace_overrides_user() {
        let dir = tempdir().unwrap();
        let user = FileConfigProvider::new(dir.path().join("user.yaml"), ConfigLevel::User);
        fs::write(user.path(), "llm:\n  deployment: gpt-4o\n  max_tokens: 512\n").unwrap();

        let workspace = FileConfigProvider::workspace(dir.path());
        assert!(workspace.path().ends_with(".config/mcpchat/config.yaml"));
        fs::create_dir_all(workspace.path().parent().unwrap()).unwrap();
        fs::write(workspace.path(), "llm:\n  deployment: gpt-4o-mini\n").unwrap();

        let merged = FileConfigProvider::load_merged(&user, &workspace).unwrap();
        assert_eq!(merged.llm.deployment.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(merged.llm.max_tokens, Some(512));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::Workspace);
        fs::write(provider.path(), "llm: [unclosed").unwrap();
        assert!(matches!(provider.get_config(), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_backup() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);
        assert!(provider.backup().unwrap().is_none());

        fs::write(provider.path(), "mcp_servers: {}").unwrap();
        let backup = provider.backup().unwrap().unwrap();
        assert!(backup.exists());
        assert_eq!(provider.level().as_str(), "user");
    }
}
