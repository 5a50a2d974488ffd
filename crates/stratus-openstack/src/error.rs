//! OpenStack client error types

use stratus_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("No endpoint configured for the {0} service")]
    MissingEndpoint(String),

    #[error("Invalid endpoint for the {service} service: {url}")]
    InvalidEndpoint { service: String, url: String },

    #[error("Auth token is empty")]
    MissingToken,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<OpenStackError> for CloudError {
    fn from(err: OpenStackError) -> Self {
        match err {
            OpenStackError::Client(err) => CloudError::Transport(err.to_string()),
            other => CloudError::InvalidConfig(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenStackError>;
