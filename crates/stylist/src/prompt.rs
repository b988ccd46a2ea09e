//! Prompt construction for outfit recommendation
//!
//! Pure functions turning wardrobe data into the instruction payload and the
//! output schema a recommendation provider must satisfy. Items and categories
//! are rendered in a stable order so identical inputs always produce
//! byte-identical prompts.

use serde_json::{json, Value};
use vestia_common::db::{CategorySummary, WardrobeItemDetail};

/// Render one item as a prompt line
fn render_item(item: &WardrobeItemDetail) -> String {
    let mut categories: Vec<String> = item.category_ids.iter().map(|c| c.to_string()).collect();
    categories.sort();

    format!(
        "- id: {} | name: {} | description: {} | season: {} | primaryColor: {} | secondaryColor: {} | style: {} | material: {} | size: {} | categoryIds: [{}]",
        item.id,
        item.name,
        item.description,
        item.season,
        item.primary_color,
        item.secondary_color.as_deref().unwrap_or("none"),
        item.style,
        item.material,
        item.size,
        categories.join(", "),
    )
}

/// Render a slice of items sorted by id
fn render_items(items: &[WardrobeItemDetail]) -> String {
    let mut sorted: Vec<&WardrobeItemDetail> = items.iter().collect();
    sorted.sort_by_key(|i| i.id);
    sorted
        .iter()
        .map(|i| render_item(i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render categories sorted by id
fn render_categories(categories: &[CategorySummary]) -> String {
    let mut sorted: Vec<&CategorySummary> = categories.iter().collect();
    sorted.sort_by_key(|c| c.id);
    sorted
        .iter()
        .map(|c| format!("- {} ({})", c.name, c.id))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the guided-mode prompt: the user picked base items and category
/// constraints, and the model completes the outfit around them.
pub fn build_guided_prompt(
    base_items: &[WardrobeItemDetail],
    candidate_items: &[WardrobeItemDetail],
    categories: &[CategorySummary],
    occasions: &[String],
    description: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are an expert fashion stylist and personal shopper AI assistant. \
Your goal is to create outfit combinations based on a user's selected clothing items.

Each clothing item is described by: id, name, description, season, primaryColor, \
secondaryColor, style, material, size, and the ids of the categories it belongs to.

Your task:
1. Analyze the user's selected base clothing item(s) and the optional outfit description.
2. From the provided candidate items, recommend additional items to create a complete \
and stylish outfit.
3. Consider season appropriateness, cohesive style, color harmony with the base \
item(s), category coverage (a full outfit spans several categories), and material \
compatibility.
4. Do not recommend items that duplicate the selected base items; recommend \
complementary items only.
5. Only recommend items present in the candidate list.

Return a JSON object with 'outfitRecommendation' (an array of objects carrying the \
id of each recommended item) and 'overallExplanation' (a brief justification of the \
outfit as a whole).\n",
    );

    prompt.push_str("\n# Base items:\n");
    prompt.push_str(&render_items(base_items));

    prompt.push_str("\n\n# Candidate items:\n");
    prompt.push_str(&render_items(candidate_items));

    prompt.push_str("\n\n# Categories:\n");
    prompt.push_str(&render_categories(categories));

    if !occasions.is_empty() {
        prompt.push_str("\n\n# Occasions:\n");
        for occasion in occasions {
            prompt.push_str(&format!("- {}\n", occasion));
        }
    }

    if let Some(description) = description {
        prompt.push_str("\n# Outfit description:\n");
        prompt.push_str(description);
        prompt.push('\n');
    }

    prompt
}

/// Build the quick-mode prompt: unattended generation for a stated occasion,
/// choosing freely from the eligible wardrobe. Excluded ids (items already
/// suggested in this session) are restated to the model even though the item
/// list is pre-filtered, so a provider that hallucinates ids is steered away
/// from them.
pub fn build_quick_prompt(
    items: &[WardrobeItemDetail],
    occasion: &str,
    exclude: &[uuid::Uuid],
) -> String {
    let mut prompt = String::from(
        "You are an expert fashion stylist AI. Assemble one complete outfit for the \
occasion below, choosing only from the wardrobe items provided.

Each clothing item is described by: id, name, description, season, primaryColor, \
secondaryColor, style, material, size, and the ids of the categories it belongs to.

Rules:
1. The outfit must contain between 3 and 10 items.
2. Cover complementary categories (for example a top, a bottom, and shoes) rather \
than several items of the same kind.
3. Match the occasion's formality and the items' seasons; keep colors harmonious.
4. Use item ids exactly as given; never invent ids.

Return a JSON object with 'outfitRecommendation' (an array of the chosen item ids) \
and 'overallExplanation' (a brief justification of the outfit as a whole).\n",
    );

    prompt.push_str(&format!("\n# Occasion:\n{}\n", occasion));

    prompt.push_str("\n# Wardrobe items:\n");
    prompt.push_str(&render_items(items));
    prompt.push('\n');

    if !exclude.is_empty() {
        let mut excluded: Vec<String> = exclude.iter().map(|id| id.to_string()).collect();
        excluded.sort();

        prompt.push_str("\n# Previously suggested item ids (do not use):\n");
        for id in excluded {
            prompt.push_str(&format!("- {}\n", id));
        }
    }

    prompt
}

/// Output schema for quick mode: a flat array of item ids plus an explanation
pub fn quick_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "outfitRecommendation": {
                "type": "array",
                "items": { "type": "string" }
            },
            "overallExplanation": { "type": "string" }
        },
        "required": ["outfitRecommendation", "overallExplanation"]
    })
}

/// Output schema for guided mode: recommended items as `{id}` objects
pub fn guided_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "outfitRecommendation": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" }
                    },
                    "required": ["id"]
                }
            },
            "overallExplanation": { "type": "string" }
        },
        "required": ["outfitRecommendation", "overallExplanation"]
    })
}
