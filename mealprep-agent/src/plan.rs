//! Meal planning domain logic
//!
//! Everything here is deterministic: preference parsing, recipe assembly,
//! nutrition arithmetic, waste analysis, and feedback triage. The model
//! decides *when* to call these; the numbers themselves never come from
//! the model.

use mealprep_error::{Error, ErrorKind, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static CALORIES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:calories|kcal)").expect("regex: calories"));
static MEALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*meals?\b").expect("regex: meals"));
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:minutes|mins|min)\b").expect("regex: minutes"));
static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:£(\d+(?:\.\d+)?)\s*(?:per meal|a meal|/meal)|budget (?:of|is) £?(\d+(?:\.\d+)?))")
        .expect("regex: budget")
});

/// Weekly macro targets, per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Default for MacroTargets {
    fn default() -> Self {
        MacroTargets {
            calories: 2000.0,
            protein_g: 150.0,
            carbs_g: 200.0,
            fat_g: 65.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Involved,
}

/// What the user wants from the week's prep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub dietary_restrictions: Vec<String>,
    pub macro_targets: MacroTargets,
    pub cooking_time_limit_mins: u32,
    pub complexity: Complexity,
    pub meal_count: u32,
    pub budget_per_meal: Option<f64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            dietary_restrictions: Vec::new(),
            macro_targets: MacroTargets::default(),
            cooking_time_limit_mins: 30,
            complexity: Complexity::Medium,
            meal_count: 7,
            budget_per_meal: None,
        }
    }
}

/// Keyword scan over free-form user text. Anything not mentioned keeps
/// its default, so partial statements ("vegetarian, 5 meals") work.
pub fn parse_preferences(input: &str) -> Preferences {
    let lower = input.to_lowercase();
    let mut prefs = Preferences::default();

    for restriction in [
        "vegetarian",
        "vegan",
        "gluten-free",
        "gluten free",
        "dairy-free",
        "dairy free",
        "pescatarian",
    ] {
        if lower.contains(restriction) {
            prefs
                .dietary_restrictions
                .push(restriction.replace(' ', "-"));
        }
    }
    prefs.dietary_restrictions.dedup();

    if lower.contains("high protein") || lower.contains("high-protein") {
        prefs.macro_targets.protein_g = 180.0;
    }

    if let Some(caps) = CALORIES_RE.captures(&lower) {
        if let Ok(calories) = caps[1].parse::<f64>() {
            prefs.macro_targets.calories = calories;
        }
    }
    if let Some(caps) = MEALS_RE.captures(&lower) {
        if let Ok(meals) = caps[1].parse::<u32>() {
            if meals > 0 {
                prefs.meal_count = meals;
            }
        }
    }
    if let Some(caps) = MINUTES_RE.captures(&lower) {
        if let Ok(minutes) = caps[1].parse::<u32>() {
            if minutes > 0 {
                prefs.cooking_time_limit_mins = minutes;
            }
        }
    }
    if let Some(caps) = BUDGET_RE.captures(&lower) {
        let amount = caps.get(1).or_else(|| caps.get(2));
        if let Some(amount) = amount.and_then(|m| m.as_str().parse::<f64>().ok()) {
            prefs.budget_per_meal = Some(amount);
        }
    }

    if lower.contains("quick") || lower.contains("simple") || lower.contains("easy") {
        prefs.complexity = Complexity::Simple;
    }
    if lower.contains("fancy") || lower.contains("gourmet") || lower.contains("involved") {
        prefs.complexity = Complexity::Involved;
    }

    prefs
}

/// Per-serving nutrition, plain numbers for arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeNutrition {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl RecipeNutrition {
    fn add(&mut self, other: RecipeNutrition) {
        self.calories += other.calories;
        self.protein_g += other.protein_g;
        self.carbs_g += other.carbs_g;
        self.fat_g += other.fat_g;
    }

    fn scaled(self, factor: f64) -> RecipeNutrition {
        RecipeNutrition {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time_mins: u32,
    pub difficulty: Complexity,
    pub nutrition: RecipeNutrition,
}

/// Per-serving estimate for one ingredient portion. Coarse on purpose;
/// real nutrition comes from the product catalog when available.
fn ingredient_estimate(ingredient: &str) -> RecipeNutrition {
    let lower = ingredient.to_lowercase();
    let (calories, protein_g, carbs_g, fat_g) = if lower.contains("chicken") {
        (330.0, 38.0, 0.0, 9.0)
    } else if lower.contains("rice") {
        (175.0, 3.5, 38.0, 0.5)
    } else if lower.contains("broccoli") {
        (35.0, 2.8, 7.0, 0.4)
    } else if lower.contains("salmon") {
        (280.0, 28.0, 0.0, 18.0)
    } else if lower.contains("yogurt") {
        (90.0, 9.0, 5.0, 4.0)
    } else if lower.contains("egg") {
        (78.0, 6.0, 0.6, 5.0)
    } else if lower.contains("pasta") {
        (190.0, 7.0, 37.0, 1.2)
    } else if lower.contains("beef") {
        (250.0, 26.0, 0.0, 15.0)
    } else {
        (120.0, 4.0, 15.0, 4.0)
    };

    RecipeNutrition {
        calories,
        protein_g,
        carbs_g,
        fat_g,
    }
}

/// Build a batch-cook recipe around the given ingredients.
pub fn generate_recipe(ingredients: &[String], prefs: &Preferences) -> Result<Recipe> {
    let lead = ingredients
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument, "a recipe needs at least one ingredient")
                .with_operation("generate_recipe")
        })?;

    let lead_title = title_case(lead);
    let name = if prefs.macro_targets.protein_g >= 150.0 {
        format!("High-Protein {} Bowl", lead_title)
    } else {
        format!("{} Meal-Prep Bowl", lead_title)
    };

    let everything = ingredients.join(", ");
    let instructions = vec![
        format!("Prep the {}: wash, trim, and cut into even portions.", everything),
        format!(
            "Batch-cook everything in one session, seasoning as you go; the {} goes in first.",
            lead.to_lowercase()
        ),
        format!(
            "Divide into {} containers, cool, and refrigerate.",
            prefs.meal_count
        ),
    ];

    let mut nutrition = RecipeNutrition::default();
    for ingredient in ingredients {
        nutrition.add(ingredient_estimate(ingredient));
    }

    Ok(Recipe {
        name,
        ingredients: ingredients.to_vec(),
        instructions,
        cooking_time_mins: prefs.cooking_time_limit_mins.min(25),
        difficulty: prefs.complexity,
        nutrition,
    })
}

/// Totals across a set of recipes plus the per-day average over a prep
/// week. The divisor is a week, not the recipe count: eating three
/// recipes across seven days still spreads over seven days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub total: RecipeNutrition,
    pub daily_average: RecipeNutrition,
}

pub fn nutrition_totals(recipes: &[Recipe]) -> NutritionSummary {
    let mut total = RecipeNutrition::default();
    for recipe in recipes {
        total.add(recipe.nutrition);
    }

    NutritionSummary {
        total,
        daily_average: total.scaled(1.0 / 7.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteReport {
    /// Fraction of unique ingredients used by only one recipe, 0.0 to 1.0.
    pub waste_score: f64,
    pub shared_ingredients: Vec<String>,
    pub single_use_ingredients: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Ingredients bought for a single recipe are the ones that rot in the
/// fridge. Score how much of the shopping list is single-use.
pub fn analyze_waste(recipes: &[Recipe]) -> WasteReport {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for recipe in recipes {
        for ingredient in &recipe.ingredients {
            *counts.entry(ingredient.trim().to_lowercase()).or_default() += 1;
        }
    }

    let shared: Vec<String> = counts
        .iter()
        .filter(|(_, &n)| n > 1)
        .map(|(name, _)| name.clone())
        .collect();
    let single_use: Vec<String> = counts
        .iter()
        .filter(|(_, &n)| n == 1)
        .map(|(name, _)| name.clone())
        .collect();

    let waste_score = if counts.is_empty() {
        0.0
    } else {
        single_use.len() as f64 / counts.len() as f64
    };

    let mut suggestions: Vec<String> = single_use
        .iter()
        .map(|name| format!("Use {} in a second recipe or buy a smaller pack.", name))
        .collect();
    suggestions.push("Build recipes around shared staples like rice and frozen vegetables.".into());
    suggestions.push("Check pack sizes against how much the week actually needs.".into());

    WasteReport {
        waste_score,
        shared_ingredients: shared,
        single_use_ingredients: single_use,
        suggestions,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub recipe_name: String,
    pub feedback_type: String,
    pub issues_identified: Vec<String>,
    pub suggested_changes: Vec<String>,
    pub priority: String,
}

/// Map free-form feedback onto concrete recipe changes.
pub fn evaluate_feedback(recipe_name: &str, feedback: &str) -> FeedbackReport {
    let lower = feedback.to_lowercase();
    let mut issues = Vec::new();
    let mut changes = Vec::new();

    let mut taste = false;
    let mut time = false;
    let mut cost = false;

    if lower.contains("salty") || lower.contains("salt") {
        issues.push("too_salty".to_string());
        changes.push("reduce_salt_by_25%".to_string());
        taste = true;
    }
    if lower.contains("bland") || lower.contains("boring") {
        issues.push("under_seasoned".to_string());
        changes.push("add_herbs_and_spices".to_string());
        taste = true;
    }
    if lower.contains("sweet") {
        issues.push("too_sweet".to_string());
        changes.push("reduce_sweetener".to_string());
        taste = true;
    }
    if lower.contains("spicy") || lower.contains("hot") {
        issues.push("too_spicy".to_string());
        changes.push("reduce_chilli".to_string());
        taste = true;
    }
    if lower.contains("dry") || lower.contains("tough") {
        issues.push("overcooked_protein".to_string());
        changes.push("reduce_cooking_time".to_string());
        taste = true;
    }
    if lower.contains("long") || lower.contains("slow") || lower.contains("forever") {
        issues.push("cooking_time_too_long".to_string());
        changes.push("use_pre_cooked_ingredients".to_string());
        time = true;
    }
    if lower.contains("expensive") || lower.contains("costly") || lower.contains("pricey") {
        issues.push("over_budget".to_string());
        changes.push("swap_premium_ingredients".to_string());
        cost = true;
    }

    let feedback_type = if taste {
        "taste_adjustment"
    } else if time {
        "time_adjustment"
    } else if cost {
        "cost_adjustment"
    } else {
        "general"
    };

    let priority = if issues.len() >= 3 || lower.contains("inedible") || lower.contains("awful") {
        "high"
    } else if issues.is_empty() {
        "low"
    } else {
        "medium"
    };

    FeedbackReport {
        recipe_name: recipe_name.to_string(),
        feedback_type: feedback_type.to_string(),
        issues_identified: issues,
        suggested_changes: changes,
        priority: priority.to_string(),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.macro_targets.calories, 2000.0);
        assert_eq!(prefs.macro_targets.protein_g, 150.0);
        assert_eq!(prefs.cooking_time_limit_mins, 30);
        assert_eq!(prefs.meal_count, 7);
        assert_eq!(prefs.complexity, Complexity::Medium);
        assert_eq!(prefs.budget_per_meal, None);
    }

    #[test]
    fn test_parse_preferences_full_sentence() {
        let prefs = parse_preferences(
            "I'm vegetarian, want high protein meals, around 1800 calories, \
             5 meals for the week, 20 minutes tops, keep it quick",
        );

        assert_eq!(prefs.dietary_restrictions, vec!["vegetarian"]);
        assert_eq!(prefs.macro_targets.protein_g, 180.0);
        assert_eq!(prefs.macro_targets.calories, 1800.0);
        assert_eq!(prefs.meal_count, 5);
        assert_eq!(prefs.cooking_time_limit_mins, 20);
        assert_eq!(prefs.complexity, Complexity::Simple);
    }

    #[test]
    fn test_parse_preferences_budget_forms() {
        let prefs = parse_preferences("keep it under £3.50 per meal");
        assert_eq!(prefs.budget_per_meal, Some(3.5));

        let prefs = parse_preferences("my budget is £4");
        assert_eq!(prefs.budget_per_meal, Some(4.0));
    }

    #[test]
    fn test_parse_preferences_complexity_and_restrictions() {
        let prefs = parse_preferences("something fancy, gluten free and dairy-free");
        assert_eq!(prefs.complexity, Complexity::Involved);
        assert!(prefs.dietary_restrictions.contains(&"gluten-free".to_string()));
        assert!(prefs.dietary_restrictions.contains(&"dairy-free".to_string()));
    }

    #[test]
    fn test_generate_recipe_requires_ingredients() {
        let err = generate_recipe(&[], &Preferences::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_generate_recipe_sums_nutrition() {
        let ingredients = vec![
            "chicken breast".to_string(),
            "rice".to_string(),
            "broccoli".to_string(),
        ];
        let recipe = generate_recipe(&ingredients, &Preferences::default()).unwrap();

        assert_eq!(recipe.name, "High-Protein Chicken Breast Bowl");
        assert_eq!(recipe.cooking_time_mins, 25);
        assert_eq!(recipe.instructions.len(), 3);
        assert!(close(recipe.nutrition.calories, 540.0));
        assert!(close(recipe.nutrition.protein_g, 44.3));
        assert!(close(recipe.nutrition.carbs_g, 45.0));
        assert!(close(recipe.nutrition.fat_g, 9.9));
    }

    #[test]
    fn test_generate_recipe_respects_time_and_name() {
        let mut prefs = Preferences::default();
        prefs.cooking_time_limit_mins = 15;
        prefs.macro_targets.protein_g = 100.0;

        let recipe = generate_recipe(&["salmon".to_string()], &prefs).unwrap();
        assert_eq!(recipe.name, "Salmon Meal-Prep Bowl");
        assert_eq!(recipe.cooking_time_mins, 15);
    }

    #[test]
    fn test_nutrition_totals_daily_average_is_weekly() {
        let prefs = Preferences::default();
        let a = generate_recipe(&["chicken".to_string()], &prefs).unwrap();
        let b = generate_recipe(&["rice".to_string()], &prefs).unwrap();

        let summary = nutrition_totals(&[a, b]);
        assert!(close(summary.total.calories, 505.0));
        assert!(close(summary.daily_average.calories, 505.0 / 7.0));
    }

    #[test]
    fn test_nutrition_totals_empty() {
        let summary = nutrition_totals(&[]);
        assert!(close(summary.total.calories, 0.0));
        assert!(close(summary.daily_average.protein_g, 0.0));
    }

    #[test]
    fn test_analyze_waste_scores_single_use() {
        let prefs = Preferences::default();
        let a = generate_recipe(&["chicken".to_string(), "rice".to_string()], &prefs).unwrap();
        let b = generate_recipe(&["chicken".to_string(), "broccoli".to_string()], &prefs).unwrap();

        let report = analyze_waste(&[a, b]);
        assert_eq!(report.shared_ingredients, vec!["chicken"]);
        assert_eq!(report.single_use_ingredients, vec!["broccoli", "rice"]);
        assert!(close(report.waste_score, 2.0 / 3.0));
        assert!(report.suggestions.iter().any(|s| s.contains("rice")));
    }

    #[test]
    fn test_analyze_waste_empty() {
        let report = analyze_waste(&[]);
        assert!(close(report.waste_score, 0.0));
        assert!(report.shared_ingredients.is_empty());
    }

    #[test]
    fn test_evaluate_feedback_taste_and_time() {
        let report = evaluate_feedback(
            "High-Protein Chicken Breast Bowl",
            "way too salty and cooking took forever",
        );

        assert_eq!(report.feedback_type, "taste_adjustment");
        assert!(report.issues_identified.contains(&"too_salty".to_string()));
        assert!(report
            .issues_identified
            .contains(&"cooking_time_too_long".to_string()));
        assert!(report
            .suggested_changes
            .contains(&"reduce_salt_by_25%".to_string()));
        assert_eq!(report.priority, "medium");
    }

    #[test]
    fn test_evaluate_feedback_time_only() {
        let report = evaluate_feedback("Salmon Meal-Prep Bowl", "takes too long to make");
        assert_eq!(report.feedback_type, "time_adjustment");
        assert_eq!(report.priority, "medium");
    }

    #[test]
    fn test_evaluate_feedback_awful_is_high_priority() {
        let report = evaluate_feedback("Bowl", "awful, bland and dry");
        assert_eq!(report.priority, "high");
        assert_eq!(report.feedback_type, "taste_adjustment");
    }

    #[test]
    fn test_evaluate_feedback_praise_is_low_priority() {
        let report = evaluate_feedback("Bowl", "loved it, making it again");
        assert_eq!(report.feedback_type, "general");
        assert_eq!(report.priority, "low");
        assert!(report.issues_identified.is_empty());
    }
}
