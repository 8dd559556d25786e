//! Credential stores for the completion endpoint.

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AiError;

/// Source of the bearer credential.
pub trait CredentialStore: Send + Sync {
    /// Fetch the credential, or [`AiError::NoCredential`] when none is
    /// configured or it cannot be read.
    fn get_credential(&self) -> Result<String, AiError>;

    fn has_credential(&self) -> bool {
        self.get_credential().is_ok()
    }
}

fn non_empty(value: &str) -> Result<String, AiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AiError::NoCredential)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Reads the credential from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialStore for EnvCredentials {
    fn get_credential(&self) -> Result<String, AiError> {
        let value = std::env::var(&self.var).map_err(|_| AiError::NoCredential)?;
        non_empty(&value)
    }
}

/// Reads the credential from a file, by default `api_key` in the user's
/// codereview config directory.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: Option<PathBuf>,
}

impl FileCredentials {
    pub fn new() -> Self {
        Self {
            path: ProjectDirs::from("", "", "codereview")
                .map(|dirs| dirs.config_dir().join("api_key")),
        }
    }

    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Default for FileCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for FileCredentials {
    fn get_credential(&self) -> Result<String, AiError> {
        let path = self.path.as_ref().ok_or(AiError::NoCredential)?;
        let content = fs::read_to_string(path).map_err(|_| AiError::NoCredential)?;
        non_empty(&content)
    }
}

/// An in-memory credential.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<String>);

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialStore for StaticCredentials {
    fn get_credential(&self) -> Result<String, AiError> {
        match &self.0 {
            Some(key) => non_empty(key),
            None => Err(AiError::NoCredential),
        }
    }
}

/// Asks each store in turn; the first one with a credential wins.
#[derive(Default)]
pub struct ChainedCredentials {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl ChainedCredentials {
    pub fn new(stores: Vec<Box<dyn CredentialStore>>) -> Self {
        Self { stores }
    }

    pub fn with(mut self, store: impl CredentialStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }
}

impl CredentialStore for ChainedCredentials {
    fn get_credential(&self) -> Result<String, AiError> {
        self.stores
            .iter()
            .find_map(|store| store.get_credential().ok())
            .ok_or(AiError::NoCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_static_credentials() {
        assert_eq!(StaticCredentials::new("sk-1").get_credential().unwrap(), "sk-1");
        assert!(!StaticCredentials::none().has_credential());
        assert!(!StaticCredentials::new("   ").has_credential());
    }

    #[test]
    fn test_env_credentials_missing_var() {
        let store = EnvCredentials::new("CODEREVIEW_TEST_SURELY_UNSET_KEY");
        assert!(matches!(store.get_credential(), Err(AiError::NoCredential)));
    }

    #[test]
    fn test_file_credentials_trims() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("api_key");
        std::fs::write(&path, "sk-from-file\n").unwrap();
        assert_eq!(FileCredentials::at(&path).get_credential().unwrap(), "sk-from-file");
    }

    #[test]
    fn test_file_credentials_missing_file() {
        let temp = TempDir::new().unwrap();
        let store = FileCredentials::at(temp.path().join("nope"));
        assert!(!store.has_credential());
    }

    #[test]
    fn test_chain_first_hit_wins() {
        let chain = ChainedCredentials::default()
            .with(StaticCredentials::none())
            .with(StaticCredentials::new("second"))
            .with(StaticCredentials::new("third"));
        assert_eq!(chain.get_credential().unwrap(), "second");

        assert!(!ChainedCredentials::default().has_credential());
    }
}
