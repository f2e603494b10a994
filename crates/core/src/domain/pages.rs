use serde::{Deserialize, Serialize};

use crate::domain::questions::QuestionList;
use crate::extract::{RecordShape, Shaped};

pub const DEFAULT_FAQ_CATEGORY: &str = "General";
pub const DEFAULT_FAQ_PAGE_TITLE: &str = "Frequently Asked Questions";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
    /// Free-form tag; every item currently carries [`DEFAULT_FAQ_CATEGORY`].
    pub category: String,
}

impl FaqItem {
    pub fn general(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: DEFAULT_FAQ_CATEGORY.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqPage {
    #[serde(default = "default_page_title")]
    pub page_title: String,
    pub faqs: Vec<FaqItem>,
}

fn default_page_title() -> String {
    DEFAULT_FAQ_PAGE_TITLE.to_string()
}

impl FaqPage {
    pub fn new(faqs: Vec<FaqItem>) -> Self {
        Self { page_title: default_page_title(), faqs }
    }

    /// Pairs `answers[i]` with `questions[i]`. Returns `None` when the lengths differ.
    pub fn from_answers(questions: &QuestionList, answers: Vec<String>) -> Option<Self> {
        if questions.len() != answers.len() {
            return None;
        }
        let faqs = questions
            .iter()
            .zip(answers)
            .map(|(question, answer)| FaqItem::general(question.clone(), answer))
            .collect();
        Some(Self::new(faqs))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub title: String,
    pub headline: String,
    pub features_section: Vec<String>,
    pub usage_guide: String,
    pub safety_warning: String,
    pub seo_tags: Vec<String>,
}

impl Shaped for ProductPage {
    fn shape() -> RecordShape {
        RecordShape::new("ProductPage")
            .string("title", "Page title, usually the product name")
            .string("headline", "One-line marketing headline")
            .string_list("features_section", "Feature and benefit bullet points")
            .string("usage_guide", "How to use the product")
            .string("safety_warning", "Side effects and precautions")
            .string_list("seo_tags", "Search keywords for the page")
    }
}

/// One row of the comparison matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonItem {
    pub feature: String,
    pub our_product: String,
    pub competitor_product: String,
}

impl Shaped for ComparisonItem {
    fn shape() -> RecordShape {
        RecordShape::new("ComparisonItem")
            .string("feature", "The attribute being compared")
            .string("our_product", "How our product handles the feature")
            .string("competitor_product", "How the competitor handles the feature")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPage {
    pub title: String,
    pub competitor_name: String,
    pub comparison_table: Vec<ComparisonItem>,
    pub verdict: String,
}

impl Shaped for ComparisonPage {
    fn shape() -> RecordShape {
        RecordShape::new("ComparisonPage")
            .string("title", "Comparison page title")
            .string("competitor_name", "Name of the competing product")
            .record_list("comparison_table", "Feature-by-feature rows", ComparisonItem::shape())
            .string("verdict", "Closing recommendation")
    }
}
