//! # Mealprep Agent
//!
//! A tool-calling agent for weekly meal prep planning:
//! 1. User describes what they want in plain words
//! 2. The model calls tools to parse preferences and search the catalog
//! 3. Deterministic planning logic builds recipes and checks nutrition
//! 4. Tool results feed back into the conversation until the model answers
//!
//! The model decides the workflow; the numbers come from the tools.

pub mod agent;
pub mod plan;
pub mod provider;
pub mod thread;
pub mod tools;

pub use agent::{AgentConfig, MealPrepAgent};
pub use plan::{
    analyze_waste, evaluate_feedback, generate_recipe, nutrition_totals, parse_preferences,
    Complexity, FeedbackReport, MacroTargets, NutritionSummary, Preferences, Recipe,
    RecipeNutrition, WasteReport,
};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, Role, ToolCall, ToolChoice, ToolDefinition,
    Usage, UsageTracker,
};
pub use thread::ThreadStore;
pub use tools::ToolRegistry;

pub use mealprep_error::{Error, ErrorKind, ErrorStatus, Result};
