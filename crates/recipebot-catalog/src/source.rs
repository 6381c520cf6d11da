//! JSON file catalog source.
//!
//! Accepts the record shapes seen in hand-maintained recipe files and
//! resolves them into [`Item`] once, at load time:
//! - `ingredients`: `[{"ingredient": "Flour", "amount": "200 g"}]`
//!   (`name` works too, amounts may be numbers) or one pre-joined string
//! - `instructions`: list of steps or one multi-line string
//! - missing `title` becomes "Untitled"

use async_trait::async_trait;
use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::CatalogSource;
use recipebot_core::types::{Ingredient, Item, UNTITLED};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Catalog stored as a JSON array on disk. Re-read on every load.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<Item>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RecipeBotError::CatalogUnavailable(format!("{} not found", self.path.display()))
            } else {
                RecipeBotError::CatalogUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                ))
            }
        })?;

        let items = parse_catalog(&content)?;
        tracing::info!("📚 Loaded {} recipes from {}", items.len(), self.path.display());
        Ok(items)
    }
}

/// Parse catalog JSON into items. An empty catalog is malformed: there is
/// nothing to deliver.
pub fn parse_catalog(content: &str) -> Result<Vec<Item>> {
    let records: Vec<RawRecipe> = serde_json::from_str(content)
        .map_err(|e| RecipeBotError::CatalogMalformed(format!("invalid recipe JSON: {e}")))?;

    if records.is_empty() {
        return Err(RecipeBotError::CatalogMalformed(
            "catalog contains no recipes".into(),
        ));
    }

    Ok(records.into_iter().map(RawRecipe::into_item).collect())
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    ingredients: Option<RawIngredients>,
    #[serde(default)]
    instructions: Option<RawInstructions>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIngredients {
    List(Vec<RawIngredient>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIngredient {
    Entry {
        #[serde(alias = "name")]
        ingredient: String,
        #[serde(default)]
        amount: Option<serde_json::Value>,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInstructions {
    List(Vec<String>),
    Text(String),
}

impl RawRecipe {
    fn into_item(self) -> Item {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let ingredients = match self.ingredients {
            None => Vec::new(),
            Some(RawIngredients::Text(text)) => split_lines(&text)
                .map(|line| Ingredient::new(line, ""))
                .collect(),
            Some(RawIngredients::List(list)) => list
                .into_iter()
                .filter_map(|raw| match raw {
                    RawIngredient::Entry { ingredient, amount } => {
                        let name = ingredient.trim().to_string();
                        (!name.is_empty()).then(|| Ingredient::new(name, amount_text(amount)))
                    }
                    RawIngredient::Text(text) => {
                        let name = text.trim().to_string();
                        (!name.is_empty()).then(|| Ingredient::new(name, ""))
                    }
                })
                .collect(),
        };

        let instructions = match self.instructions {
            None => Vec::new(),
            Some(RawInstructions::Text(text)) => split_lines(&text).map(String::from).collect(),
            Some(RawInstructions::List(steps)) => steps
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Item {
            title,
            ingredients,
            instructions,
            category,
        }
    }
}

fn amount_text(amount: Option<serde_json::Value>) -> String {
    match amount {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}
