use serde::{Deserialize, Serialize};

/// One user record returned by the identity toolkit `accounts:lookup` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "localId")]
    pub local_id: String,
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "emailVerified")]
    pub email_verified: Option<bool>,
}

/// Response envelope for `accounts:lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub users: Option<Vec<AccountInfo>>,
}
