//! System prompt assembly

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::llm::PromptMessage;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful music assistant. You can refer to the following information from our knowledge base: {knowledge}.
Additionally, here's some recent information from a web search: {web}.
Answer all queries in plain text with no syntaxing, bolding or italics. If you don't have enough information, say so.";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(knowledge|web)\}").expect("valid regex"));

/// System prompt with `{knowledge}` and `{web}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill both placeholders in one pass, so braces inside the inserted
    /// text are never expanded again
    pub fn render(&self, knowledge: &str, web: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "knowledge" => knowledge.to_string(),
                _ => web.to_string(),
            })
            .into_owned()
    }

    /// System prompt followed by the user's question
    pub fn messages(&self, knowledge: &str, web: &str, question: &str) -> Vec<PromptMessage> {
        vec![
            PromptMessage::system(self.render(knowledge, web)),
            PromptMessage::user(question),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_default_prompt_mentions_sources() {
        let text = PromptTemplate::default().render("KB FACT", "WEB FACT");
        assert!(text.starts_with("You are a helpful music assistant."));
        assert!(text.contains("knowledge base: KB FACT."));
        assert!(text.contains("web search: WEB FACT."));
        assert!(!text.contains("{knowledge}"));
    }

    #[test]
    fn test_inserted_text_is_not_reexpanded() {
        let template = PromptTemplate::new("[{knowledge}] [{web}]");
        assert_eq!(template.render("{web}", "x"), "[{web}] [x]");
    }

    #[test]
    fn test_messages_order() {
        let messages = PromptTemplate::default().messages("", "", "Who wrote Clair de Lune?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Who wrote Clair de Lune?");
    }
}
