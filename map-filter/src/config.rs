use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_ID: &str = "fsk-realmapp-slofx";
pub const DEFAULT_FUNCTION: &str = "getAllMapData";

/// Where the map collection comes from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Data service application id used for the handshake
    pub app_id: String,
    /// Remote function returning every map document
    pub function_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            function_name: DEFAULT_FUNCTION.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse a JSON config; missing fields take their defaults and an empty
    /// string yields the default config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn empty_json_is_default() -> TestResult {
        assert_eq!(ServiceConfig::from_json("  ")?, ServiceConfig::default());
        Ok(())
    }

    #[test]
    fn partial_json_fills_defaults() -> TestResult {
        let config = ServiceConfig::from_json(r#"{"appId": "staging-app"}"#)?;

        assert_eq!(config.app_id, "staging-app");
        assert_eq!(config.function_name, DEFAULT_FUNCTION);
        Ok(())
    }
}
