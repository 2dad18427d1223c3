use crate::client::DeployStatus;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("deploy API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no service matches '{0}'")]
    NoService(String),
    #[error("deploy ended in {0:?}")]
    DeployFailed(DeployStatus),
    #[error("deploy still not terminal after {0} polls")]
    Timeout(u32),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
