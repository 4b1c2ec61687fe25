//! Tool registry - the functions exposed to the model
//!
//! Seven tools cover the whole workflow: preference parsing, catalog
//! search and lookup, recipe generation, nutrition math, waste
//! analysis, and feedback triage. `execute` never returns an error;
//! every failure is folded into a `{"error": ...}` payload so the
//! model can read it and recover.

use crate::plan::{
    analyze_waste, evaluate_feedback, generate_recipe, nutrition_totals, parse_preferences,
    Preferences, Recipe,
};
use crate::provider::{ToolCall, ToolDefinition};
use mealprep_error::{Error, ErrorKind, Result};
use mealprep_tesco::error::product_not_found;
use mealprep_tesco::Catalog;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_SEARCH_LIMIT: usize = 5;
const MAX_SEARCH_LIMIT: usize = 10;

pub struct ToolRegistry {
    catalog: Catalog,
}

#[derive(Deserialize)]
struct PreferencesArgs {
    input: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct DetailsArgs {
    product_url: String,
}

#[derive(Deserialize)]
struct RecipeArgs {
    ingredients: Vec<String>,
    #[serde(default)]
    preferences: Option<Preferences>,
}

#[derive(Deserialize)]
struct RecipesArgs {
    recipes: Vec<Recipe>,
}

#[derive(Deserialize)]
struct FeedbackArgs {
    recipe_name: String,
    feedback: String,
}

impl ToolRegistry {
    pub fn new(catalog: Catalog) -> Self {
        ToolRegistry { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Tool schemas in the chat-completions function format.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "analyze_user_preferences",
                "Parse dietary restrictions, macro targets, meal count, time limit, \
                 complexity, and budget out of the user's own words.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "The user's description of what they want, verbatim"
                    }
                },
                "required": ["input"]
            })),
            ToolDefinition::new(
                "search_tesco_products",
                "Search the Tesco grocery catalog. Returns product names, prices, \
                 promotions, and nutrition where known.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for, e.g. 'chicken breast'"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Max results to return, default 5, max 10"
                    }
                },
                "required": ["query"]
            })),
            ToolDefinition::new(
                "get_product_details",
                "Fetch one product's full record, including its nutrition table, \
                 by product page URL.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "product_url": {
                        "type": "string",
                        "description": "Product page URL from a previous search"
                    }
                },
                "required": ["product_url"]
            })),
            ToolDefinition::new(
                "generate_recipe",
                "Build a batch-cook recipe from a list of ingredients, with \
                 estimated per-serving nutrition.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "ingredients": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Ingredients, lead ingredient first"
                    },
                    "preferences": {
                        "type": "object",
                        "description": "Preferences from analyze_user_preferences, if available"
                    }
                },
                "required": ["ingredients"]
            })),
            ToolDefinition::new(
                "calculate_nutrition_totals",
                "Sum nutrition across a set of recipes and compute the daily \
                 average over a seven-day week.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "recipes": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Recipes from generate_recipe"
                    }
                },
                "required": ["recipes"]
            })),
            ToolDefinition::new(
                "optimize_for_waste_reduction",
                "Score how many ingredients are only used once across the plan \
                 and suggest ways to share them.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "recipes": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Recipes from generate_recipe"
                    }
                },
                "required": ["recipes"]
            })),
            ToolDefinition::new(
                "evaluate_recipe_feedback",
                "Turn the user's feedback on a recipe into concrete issues, \
                 suggested changes, and a priority.",
            )
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "recipe_name": {
                        "type": "string",
                        "description": "Which recipe the feedback is about"
                    },
                    "feedback": {
                        "type": "string",
                        "description": "The user's feedback, verbatim"
                    }
                },
                "required": ["recipe_name", "feedback"]
            })),
        ]
    }

    /// Run one tool call. Infallible by contract: the model gets a JSON
    /// payload either way, with failures under an `error` key.
    pub async fn execute(&mut self, call: &ToolCall) -> Value {
        debug!(tool = %call.name, args = %call.arguments, "executing tool");

        let result = match call.name.as_str() {
            "analyze_user_preferences" => self.run_analyze_preferences(call),
            "search_tesco_products" => self.run_search(call).await,
            "get_product_details" => self.run_product_details(call).await,
            "generate_recipe" => self.run_generate_recipe(call),
            "calculate_nutrition_totals" => self.run_nutrition_totals(call),
            "optimize_for_waste_reduction" => self.run_waste_analysis(call),
            "evaluate_recipe_feedback" => self.run_feedback(call),
            other => Ok(json!({"error": format!("unknown tool: {}", other)})),
        };

        result.unwrap_or_else(|e| json!({"error": e.to_string()}))
    }

    fn run_analyze_preferences(&self, call: &ToolCall) -> Result<Value> {
        let args: PreferencesArgs = parse_args(call)?;
        let prefs = parse_preferences(&args.input);
        to_payload(&prefs)
    }

    async fn run_search(&self, call: &ToolCall) -> Result<Value> {
        let args: SearchArgs = parse_args(call)?;
        let limit = args
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let products = self.catalog.search(&args.query, limit).await?;
        if products.is_empty() {
            return Err(product_not_found(&args.query));
        }

        to_payload(&json!({
            "query": args.query,
            "count": products.len(),
            "products": products,
        }))
    }

    async fn run_product_details(&mut self, call: &ToolCall) -> Result<Value> {
        let args: DetailsArgs = parse_args(call)?;
        let product = self.catalog.product_details(&args.product_url).await?;
        to_payload(&product)
    }

    fn run_generate_recipe(&self, call: &ToolCall) -> Result<Value> {
        let args: RecipeArgs = parse_args(call)?;
        let prefs = args.preferences.unwrap_or_default();
        let recipe = generate_recipe(&args.ingredients, &prefs)?;
        to_payload(&recipe)
    }

    fn run_nutrition_totals(&self, call: &ToolCall) -> Result<Value> {
        let args: RecipesArgs = parse_args(call)?;
        to_payload(&nutrition_totals(&args.recipes))
    }

    fn run_waste_analysis(&self, call: &ToolCall) -> Result<Value> {
        let args: RecipesArgs = parse_args(call)?;
        to_payload(&analyze_waste(&args.recipes))
    }

    fn run_feedback(&self, call: &ToolCall) -> Result<Value> {
        let args: FeedbackArgs = parse_args(call)?;
        to_payload(&evaluate_feedback(&args.recipe_name, &args.feedback))
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T> {
    call.parse_arguments().map_err(|e| {
        Error::new(
            ErrorKind::InvalidArgument,
            format!("invalid arguments for {}: {}", call.name, e),
        )
        .with_operation("ToolRegistry::execute")
    })
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        Error::new(ErrorKind::Unexpected, "failed to serialize tool result")
            .with_operation("ToolRegistry::execute")
            .set_source(e)
    })
}
