#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pagegen_agent::{
    CallLimits, CompletionService, LlmClient, PageSteps, PromptLibrary, RetryPolicy, ServiceError,
};
use pagegen_core::ProductRecord;

pub const PRODUCT_PAGE_JSON: &str = r#"{
  "title": "Test Serum",
  "headline": "Hydration you can feel",
  "features_section": ["Hydration", "Water-based"],
  "usage_guide": "Apply daily",
  "safety_warning": "None known",
  "seo_tags": ["serum", "hydration"]
}"#;

pub const COMPARISON_PAGE_JSON: &str = r#"{
  "title": "Test Serum vs AquaPlus",
  "competitor_name": "AquaPlus",
  "comparison_table": [
    {"feature": "Price", "our_product": "100", "competitor_product": "150"},
    {"feature": "Ingredients", "our_product": "Water", "competitor_product": "Water, Glycerin"}
  ],
  "verdict": "Test Serum is the better value"
}"#;

pub const COMPETITOR_TEXT: &str = "Name: AquaPlus\nPrice: 150\nIngredients: Water, Glycerin";

pub fn test_product() -> ProductRecord {
    ProductRecord {
        name: "Test Serum".to_string(),
        concentration: "5%".to_string(),
        skin_type: "All".to_string(),
        key_ingredients: vec!["Water".to_string()],
        benefits: vec!["Hydration".to_string()],
        how_to_use: "Apply daily".to_string(),
        side_effects: "None".to_string(),
        price: "100".to_string(),
    }
}

/// Routes each prompt by the template it was rendered from.
pub struct ScriptedLlm {
    pub questions_reply: String,
    pub answers: HashMap<String, String>,
    pub answer_delays_ms: HashMap<String, u64>,
    pub failing_questions: Vec<String>,
    pub product_page_reply: String,
    pub competitor_reply: String,
    pub comparison_reply: String,
    pub prompts_seen: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self {
            questions_reply: r#"["Is it safe?", "How do I apply it?"]"#.to_string(),
            answers: HashMap::new(),
            answer_delays_ms: HashMap::new(),
            failing_questions: Vec::new(),
            product_page_reply: PRODUCT_PAGE_JSON.to_string(),
            competitor_reply: COMPETITOR_TEXT.to_string(),
            comparison_reply: COMPARISON_PAGE_JSON.to_string(),
            prompts_seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedLlm {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts_seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.prompts_seen.lock() {
            seen.push(prompt.to_string());
        }

        if prompt.contains("Generate exactly") {
            return Ok(self.questions_reply.clone());
        }
        if let Some(question) = question_in(prompt) {
            if let Some(delay) = self.answer_delays_ms.get(&question) {
                tokio::time::sleep(Duration::from_millis(*delay)).await;
            }
            if self.failing_questions.contains(&question) {
                return Err(ServiceError::status(500, format!("upstream failed on `{question}`")));
            }
            return Ok(self
                .answers
                .get(&question)
                .cloned()
                .unwrap_or_else(|| format!("Answer to {question}")));
        }
        if prompt.contains("Create a Product Page") {
            return Ok(self.product_page_reply.clone());
        }
        if prompt.contains("Create a fictional competitor") {
            return Ok(self.competitor_reply.clone());
        }
        if prompt.contains("Compare Product A") {
            return Ok(self.comparison_reply.clone());
        }

        Err(ServiceError::decode(format!("unscripted prompt: {prompt}")))
    }
}

fn question_in(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix("Question: "))
        .map(|question| question.trim().to_string())
}

/// Returns the same text for every prompt.
pub struct FixedLlm(pub String);

#[async_trait]
impl LlmClient for FixedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
        Ok(self.0.clone())
    }
}

pub fn test_limits() -> CallLimits {
    CallLimits {
        timeout: Duration::from_secs(5),
        max_concurrency: 8,
        retry: RetryPolicy::none(),
    }
}

pub fn steps_with(client: Arc<dyn LlmClient>, target_question_count: usize) -> PageSteps {
    let prompts = PromptLibrary::new().expect("prompt templates compile");
    PageSteps::new(CompletionService::new(client, test_limits()), prompts, target_question_count)
}
