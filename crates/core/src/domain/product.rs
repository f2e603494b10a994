use serde::{Deserialize, Serialize};

/// The single product every artifact is generated for.
///
/// Both list fields must be present in serialized input even when empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub concentration: String,
    pub skin_type: String,
    pub key_ingredients: Vec<String>,
    pub benefits: Vec<String>,
    pub how_to_use: String,
    pub side_effects: String,
    pub price: String,
}

impl ProductRecord {
    pub fn glowboost_sample() -> Self {
        Self {
            name: "GlowBoost Vitamin C Serum".to_string(),
            concentration: "10% Vitamin C".to_string(),
            skin_type: "Oily, Combination".to_string(),
            key_ingredients: vec!["Vitamin C".to_string(), "Hyaluronic Acid".to_string()],
            benefits: vec!["Brightening".to_string(), "Fades dark spots".to_string()],
            how_to_use: "Apply 2–3 drops in the morning before sunscreen".to_string(),
            side_effects: "Mild tingling for sensitive skin".to_string(),
            price: "₹699".to_string(),
        }
    }

    /// Compact JSON embedded into prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"name\":{:?}}}", self.name))
    }
}
