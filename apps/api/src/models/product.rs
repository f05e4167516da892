use serde::{Deserialize, Serialize};

/// Structured user input describing the product or service being announced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub product_service_name: String,
    pub description: String,
    pub industry: String,
    pub features: Vec<String>,
    pub target_audience: String,
    pub company_name: String,
}

impl ProductInput {
    /// Display name used by templates; never empty.
    pub fn display_name(&self) -> &str {
        let name = self.product_service_name.trim();
        if name.is_empty() {
            "新サービス"
        } else {
            name
        }
    }

    pub fn has_industry(&self) -> bool {
        !self.industry.trim().is_empty()
    }
}
