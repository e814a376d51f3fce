//! Cloud environment selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sovereign cloud environments with distinct management endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudEnvironment {
    /// Global public cloud.
    #[default]
    Public,
    /// US Government cloud.
    UsGov,
    /// China cloud (operated by 21Vianet).
    China,
}

impl CloudEnvironment {
    /// Management endpoint base URL for this environment.
    #[must_use]
    pub const fn management_endpoint(&self) -> &'static str {
        match self {
            Self::Public => "https://management.azure.com",
            Self::UsGov => "https://management.usgovcloudapi.net",
            Self::China => "https://management.chinacloudapi.cn",
        }
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::UsGov => write!(f, "usgov"),
            Self::China => write!(f, "china"),
        }
    }
}

impl std::str::FromStr for CloudEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "usgov" => Ok(Self::UsGov),
            "china" => Ok(Self::China),
            other => Err(format!(
                "unknown cloud environment '{other}' (expected public, usgov, or china)"
            )),
        }
    }
}
