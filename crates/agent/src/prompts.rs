use tera::{Context, Tera};
use thiserror::Error;

const QUESTION_GENERATION: &str = "question_generation";
const FAQ_ANSWER: &str = "faq_answer";
const PRODUCT_PAGE: &str = "product_page";
const COMPETITOR: &str = "competitor";
const COMPARISON: &str = "comparison";

const TEMPLATES: [(&str, &str); 5] = [
    (
        QUESTION_GENERATION,
        "Analyze this product: {{ product_json }}\n\
         Generate exactly {{ question_count }} distinct user questions about it.\n\
         Return the output as a pure JSON list of strings.\n\
         Example: [\"Question 1?\", \"Question 2?\"]\n",
    ),
    (
        FAQ_ANSWER,
        "Product: {{ product_json }}\n\
         Question: {{ question }}\n\
         Answer the question concisely based on the product data.\n",
    ),
    (
        PRODUCT_PAGE,
        "Create a Product Page for: {{ product_json }}\n\
         Structure: Headline, Benefits, Usage, Safety.\n\n\
         IMPORTANT: Return ONLY valid JSON matching the instructions.\n\
         {{ format_instructions }}\n",
    ),
    (
        COMPETITOR,
        "Create a fictional competitor to {{ product_name }}.\n\
         Return Name, Price, Ingredients.\n",
    ),
    (
        COMPARISON,
        "Compare Product A: {{ product_json }}\n\
         vs Product B: {{ competitor_text }}\n\n\
         IMPORTANT: Return ONLY valid JSON matching the instructions.\n\
         {{ format_instructions }}\n",
    ),
];

#[derive(Debug, Error)]
#[error("could not render prompt `{template}`: {source}")]
pub struct PromptError {
    pub template: &'static str,
    #[source]
    pub source: tera::Error,
}

/// The five prompts a generation run sends, rendered without HTML escaping.
pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(TEMPLATES)
            .map_err(|source| PromptError { template: "library", source })?;
        Ok(Self { tera })
    }

    pub fn question_generation(
        &self,
        product_json: &str,
        question_count: usize,
    ) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("product_json", product_json);
        context.insert("question_count", &question_count);
        self.render(QUESTION_GENERATION, &context)
    }

    pub fn faq_answer(&self, product_json: &str, question: &str) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("product_json", product_json);
        context.insert("question", question);
        self.render(FAQ_ANSWER, &context)
    }

    pub fn product_page(
        &self,
        product_json: &str,
        format_instructions: &str,
    ) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("product_json", product_json);
        context.insert("format_instructions", format_instructions);
        self.render(PRODUCT_PAGE, &context)
    }

    pub fn competitor(&self, product_name: &str) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("product_name", product_name);
        self.render(COMPETITOR, &context)
    }

    pub fn comparison(
        &self,
        product_json: &str,
        competitor_text: &str,
        format_instructions: &str,
    ) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("product_json", product_json);
        context.insert("competitor_text", competitor_text);
        context.insert("format_instructions", format_instructions);
        self.render(COMPARISON, &context)
    }

    fn render(&self, template: &'static str, context: &Context) -> Result<String, PromptError> {
        self.tera.render(template, context).map_err(|source| PromptError { template, source })
    }
}
