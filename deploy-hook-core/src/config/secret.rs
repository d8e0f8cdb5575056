use serde::Deserialize;

/// Where the shared secret comes from.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Deserialize)]
#[serde(untagged)]
pub enum Secret {
    Literal(String),
    FromEnvVar {
        #[serde(rename = "env-var", alias = "env_var")]
        env_var: String,
    },
    FromToml {
        toml: String,
        key: String,
    },
}

impl Secret {
    pub fn label(&self) -> &str {
        match self {
            Secret::Literal(_) => "literal value",
            Secret::FromEnvVar { .. } => "environment variable",
            Secret::FromToml { .. } => "TOML value",
        }
    }
}
