use deploy_protocol::AssetIdentity;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    /// No asset in a cycle may be deferred; the import cannot proceed
    #[error(
        "Dependency cycle cannot be broken between {}: no member is of a kind allowed to be deferred. \
         Remove one of these assets from the bundle or drop a reference between them",
        join(.assets)
    )]
    DependencyCycle { assets: Vec<AssetIdentity> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bundle manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ImportError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }
}

fn join(assets: &[AssetIdentity]) -> String {
    let names: Vec<String> = assets.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(", "))
}
