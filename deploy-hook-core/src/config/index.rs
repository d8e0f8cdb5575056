use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct IndexConfig {
    /// directory to scan, relative to the repository
    pub documents: PathBuf,
    /// generated page, relative to the repository
    pub output: PathBuf,
    pub layout: String,
    pub title: String,
    #[serde(alias = "link_prefix")]
    pub link_prefix: String,
    pub labels: Labels,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            documents: PathBuf::from("documents"),
            output: PathBuf::from("documents.md"),
            layout: "page".to_owned(),
            title: "Documents".to_owned(),
            link_prefix: String::new(),
            labels: Default::default(),
        }
    }
}

/// Column headings of the generated table, in column order.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub date: String,
    pub title: String,
    pub format: String,
    pub link: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            date: "Day".to_owned(),
            title: "What".to_owned(),
            format: "Format".to_owned(),
            link: "Link".to_owned(),
        }
    }
}
