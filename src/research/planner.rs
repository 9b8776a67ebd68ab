//! Query decomposition into research plans.
//!
//! The planner asks the LLM to break a query into sub-questions and a tool
//! sequence. It never fails: malformed or missing model output is repaired
//! from templates, and any LLM error yields a fixed fallback plan marked
//! `success = false`.

use crate::llm::LLMClient;
use crate::types::Plan;
use crate::utils::config::PipelineLimits;
use serde_json::Value;
use std::sync::Arc;

const PLANNING_SYSTEM_PROMPT: &str = "You are a research planning assistant. Break down research \
queries into 3-7 focused sub-questions that can be answered through web search and analysis. \
Determine which tools are needed for each sub-question.\n\n\
Available tools:\n\
- web_search: Search the internet for information\n\
- scraper: Extract content from webpages\n\
- data_analysis: Analyze numbers and create charts\n\
- calculator: Perform mathematical calculations\n\
- summarizer: Summarize long texts\n\n\
Respond with a JSON object containing:\n\
- sub_questions: array of 3-7 sub-questions\n\
- tool_sequence: array of tool names in execution order\n\
- reasoning: brief explanation of the plan";

pub struct Planner {
    llm: Arc<dyn LLMClient>,
    max_sub_questions: usize,
}

impl Planner {
    pub fn new(llm: Arc<dyn LLMClient>, limits: &PipelineLimits) -> Self {
        Self {
            llm,
            max_sub_questions: limits.max_sub_questions,
        }
    }

    /// Create a research plan for a sanitized query. Never fails: planning
    /// errors produce the fallback plan instead.
    pub async fn create_plan(&self, query: &str) -> Plan {
        let prompt = format!(
            "Break down this research query into sub-questions and create an execution plan:\n\n\
             Query: {query}\n\n\
             Provide a JSON response with:\n\
             1. sub_questions: 3-7 focused sub-questions\n\
             2. tool_sequence: ordered list of tools needed (e.g., [\"web_search\", \"scraper\", \"data_analysis\"])\n\
             3. reasoning: brief explanation of why this plan will work"
        );

        match self.llm.generate_json(&prompt, PLANNING_SYSTEM_PROMPT).await {
            Ok(value) => self.plan_from_response(query, value),
            Err(e) => {
                tracing::warn!(query, "planning failed, using fallback plan: {e}");
                fallback_plan(query, Some(e.to_string()))
            }
        }
    }

    fn plan_from_response(&self, query: &str, value: Value) -> Plan {
        let mut sub_questions: Vec<String> = value
            .get("sub_questions")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        if sub_questions.len() < 3 {
            sub_questions = template_questions(query);
        }
        sub_questions.truncate(self.max_sub_questions);

        let mut tool_sequence: Vec<String> = value
            .get("tool_sequence")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        if tool_sequence.is_empty() {
            tool_sequence = vec![
                crate::tools::WEB_SEARCH.to_string(),
                crate::tools::SCRAPER.to_string(),
            ];
        }

        let reasoning = value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or("Standard research plan")
            .to_string();

        Plan {
            query: query.to_string(),
            sub_questions,
            tool_sequence,
            reasoning,
            success: true,
            error: None,
        }
    }
}

fn template_questions(query: &str) -> Vec<String> {
    vec![
        format!("What is {query}?"),
        format!("What are the key aspects of {query}?"),
        format!("What are recent developments regarding {query}?"),
    ]
}

/// The fixed plan used when planning itself fails.
fn fallback_plan(query: &str, error: Option<String>) -> Plan {
    Plan {
        query: query.to_string(),
        sub_questions: template_questions(query),
        tool_sequence: vec![
            crate::tools::WEB_SEARCH.to_string(),
            crate::tools::SCRAPER.to_string(),
            crate::tools::SUMMARIZER.to_string(),
        ],
        reasoning: "Fallback plan due to planning error".to_string(),
        success: false,
        error,
    }
}
