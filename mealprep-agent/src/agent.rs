//! Agent implementation - orchestrates the model <-> tool loop
//!
//! One `run` call is one user turn: the thread history goes to the
//! model, tool calls are executed and their results appended, and the
//! loop repeats until the model answers in plain text or the turn
//! budget runs out.

use crate::provider::{
    ChatMessage, CompletionRequest, LlmProvider, ToolChoice, UsageTracker,
};
use crate::thread::ThreadStore;
use crate::tools::ToolRegistry;
use mealprep_error::{Error, Result};
use tracing::{debug, warn};

/// What the system prompt tells the model it is and how to work.
const SYSTEM_PROMPT: &str = "\
You are an expert meal prep assistant. You help people plan a week of \
batch-cooked meals with real products from the Tesco grocery catalog.

You have these tools:
- analyze_user_preferences: parse dietary restrictions, macro targets, meal \
count, time limit, complexity, and budget from the user's words
- search_tesco_products: search the catalog for products with prices and \
promotions
- get_product_details: fetch one product's full record including nutrition
- generate_recipe: build a batch-cook recipe from ingredients with estimated \
nutrition
- calculate_nutrition_totals: sum nutrition across recipes and average it \
over the week
- optimize_for_waste_reduction: find single-use ingredients and suggest \
swaps
- evaluate_recipe_feedback: turn feedback on a recipe into concrete changes

Work in this order: understand the user's preferences first, then search \
for real products, then build recipes around what you found, then check \
the nutrition against their targets and the plan for waste. Stay inside \
the user's budget and cooking time limit when picking products and \
recipes. Quote real prices and product names from tool results; never \
invent them. If a tool returns an error, tell the user what went wrong \
and adjust rather than retrying the same call.";

/// Reply used when the model returns neither text nor tool calls.
const FALLBACK_REPLY: &str =
    "I wasn't able to put together a reply there. Could you rephrase that?";

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model to request completions from
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Max model round-trips per user turn
    pub max_turns: usize,
    /// Print tool activity to stdout
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_turns: 8,
            verbose: false,
        }
    }
}

/// The agent orchestrator - owns the provider, tools, and threads.
pub struct MealPrepAgent<P: LlmProvider> {
    provider: P,
    tools: ToolRegistry,
    threads: ThreadStore,
    usage: UsageTracker,
    config: AgentConfig,
}

impl<P: LlmProvider> MealPrepAgent<P> {
    /// Create a new agent with default configuration
    pub fn new(provider: P, tools: ToolRegistry) -> Self {
        Self::with_config(provider, tools, AgentConfig::default())
    }

    /// Create a new agent with custom configuration
    pub fn with_config(provider: P, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            threads: ThreadStore::new(),
            usage: UsageTracker::new(),
            config,
        }
    }

    /// Run one user turn to completion and return the reply text.
    pub async fn run(&mut self, thread_id: &str, input: &str) -> Result<String> {
        let history = self.threads.get_or_create(thread_id);
        if history.is_empty() {
            history.push(ChatMessage::system(SYSTEM_PROMPT));
        }
        history.push(ChatMessage::user(input));

        for turn in 0..self.config.max_turns {
            let messages = self
                .threads
                .history(thread_id)
                .map(|msgs| msgs.to_vec())
                .unwrap_or_default();

            let request = CompletionRequest::new(messages)
                .with_model(self.config.model.as_str())
                .with_temperature(self.config.temperature)
                .with_tools(ToolRegistry::definitions())
                .with_tool_choice(ToolChoice::Auto);

            debug!(thread = thread_id, turn, "requesting completion");
            let response = self.provider.complete(&request).await?;
            self.usage.track(&response.model, &response.usage);

            if response.has_tool_calls() {
                self.threads.append(
                    thread_id,
                    ChatMessage::assistant_with_tools(
                        response.content.clone(),
                        response.tool_calls.clone(),
                    ),
                );

                for call in &response.tool_calls {
                    if self.config.verbose {
                        println!("   [tool] {}({})", call.name, call.arguments);
                    }
                    let result = self.tools.execute(call).await;
                    if self.config.verbose && result.get("error").is_some() {
                        println!("   [tool] {} -> {}", call.name, result["error"]);
                    }
                    self.threads
                        .append(thread_id, ChatMessage::tool_result(&call.id, result.to_string()));
                }
                continue;
            }

            let reply = match response.content {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    warn!(thread = thread_id, "model returned no content");
                    FALLBACK_REPLY.to_string()
                }
            };
            self.threads.append(thread_id, ChatMessage::assistant(&reply));
            return Ok(reply);
        }

        Err(Error::turn_limit_exceeded(self.config.max_turns).with_operation("MealPrepAgent::run"))
    }

    /// Token usage accumulated across every run so far.
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Drop a thread's history. Returns whether the thread existed.
    pub fn reset_thread(&mut self, thread_id: &str) -> bool {
        self.threads.reset(thread_id)
    }

    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        CompletionResponse, FinishReason, ProviderError, Role, ToolCall, Usage,
    };
    use mealprep_error::ErrorKind;
    use mealprep_tesco::{Catalog, CatalogConfig};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted provider: pops one canned response per complete() call.
    struct StubProvider {
        responses: Mutex<VecDeque<CompletionResponse>>,
    }

    impl StubProvider {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }

        fn text(content: &str) -> CompletionResponse {
            CompletionResponse {
                model: "stub-model".to_string(),
                content: Some(content.to_string()),
                tool_calls: Vec::new(),
                finish_reason: FinishReason::Stop,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            }
        }

        fn tool(name: &str, arguments: serde_json::Value) -> CompletionResponse {
            CompletionResponse {
                model: "stub-model".to_string(),
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                }],
                finish_reason: FinishReason::ToolCalls,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            }
        }

        fn empty() -> CompletionResponse {
            CompletionResponse {
                model: "stub-model".to_string(),
                content: None,
                tool_calls: Vec::new(),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            }
        }
    }

    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Network("stub exhausted".to_string()))
        }
    }

    fn agent_with(responses: Vec<CompletionResponse>) -> MealPrepAgent<StubProvider> {
        let catalog = Catalog::new(CatalogConfig::mock()).unwrap();
        MealPrepAgent::new(StubProvider::new(responses), ToolRegistry::new(catalog))
    }

    #[tokio::test]
    async fn test_run_executes_tools_then_answers() {
        let mut agent = agent_with(vec![
            StubProvider::tool("generate_recipe", json!({"ingredients": ["rice"]})),
            StubProvider::text("Here is your plan."),
        ]);

        let reply = agent.run("default", "plan my week").await.unwrap();
        assert_eq!(reply, "Here is your plan.");

        // system, user, assistant w/ tool call, tool result, assistant
        let history = agent.threads().history("default").unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[3].role, Role::Tool);
        assert!(history[3]
            .content
            .as_deref()
            .unwrap()
            .contains("High-Protein Rice Bowl"));

        assert_eq!(agent.usage().total_calls, 2);
        assert_eq!(agent.usage().total_tokens(), 30);
    }

    #[tokio::test]
    async fn test_run_hits_turn_limit() {
        let responses = (0..4)
            .map(|_| StubProvider::tool("analyze_user_preferences", json!({"input": "quick"})))
            .collect();
        let mut agent = agent_with(responses);
        agent.config.max_turns = 3;

        let err = agent.run("default", "plan my week").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TurnLimitExceeded);
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let mut agent = agent_with(vec![StubProvider::empty()]);
        let reply = agent.run("default", "hello").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_system_prompt_injected_once() {
        let mut agent = agent_with(vec![
            StubProvider::text("First reply."),
            StubProvider::text("Second reply."),
        ]);

        agent.run("default", "hello").await.unwrap();
        agent.run("default", "again").await.unwrap();

        let history = agent.threads().history("default").unwrap();
        let system_count = history.iter().filter(|m| m.role == Role::System).count();
        assert_eq!(system_count, 1);
        assert_eq!(history[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_reset_thread() {
        let mut agent = agent_with(vec![StubProvider::text("Reply.")]);
        agent.run("default", "hello").await.unwrap();

        assert!(agent.reset_thread("default"));
        assert!(!agent.reset_thread("default"));
        assert!(agent.threads().history("default").is_none());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut agent = agent_with(vec![]);
        let err = agent.run("default", "hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(err.is_retryable());
    }
}
