use serde::{Deserialize, Serialize};

/// Arguments of `initialize`.
///
/// # Example
///
/// ```rust
/// use hostshim_bridge::InitConfig;
///
/// let config: InitConfig = serde_json::from_value(serde_json::json!({
///     "spaceDID": "did:key:z6Mk-space",
/// }))
/// .unwrap();
///
/// assert_eq!(config, InitConfig::default().with_space("did:key:z6Mk-space"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitConfig {
    /// Passed to the client factory as-is.
    #[serde(default, alias = "store", skip_serializing_if = "Option::is_none")]
    pub store_config: Option<serde_json::Value>,

    /// Space to select once the client is installed.
    #[serde(
        default,
        alias = "spaceDID",
        alias = "spaceDid",
        skip_serializing_if = "Option::is_none"
    )]
    pub space_id: Option<String>,
}

impl InitConfig {
    pub fn with_space(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = Some(space_id.into());
        self
    }

    pub fn with_store_config(mut self, store_config: serde_json::Value) -> Self {
        self.store_config = Some(store_config);
        self
    }
}
