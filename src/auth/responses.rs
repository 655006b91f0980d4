use serde::Deserialize;

/// Response from the OAuth2 token endpoint or the token server's `/accessToken`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Best available description of why no token was issued.
    pub fn failure_reason(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "response carried no access_token".to_string())
    }
}

/// Response from the token server's `/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "appID", default)]
    pub app_id: Option<String>,
}
