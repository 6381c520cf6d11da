//! Formatter — turns an item into delivery-ready plain text. Pure, no I/O.

use recipebot_core::types::{Item, UNTITLED};

const BRACKETS: [char; 4] = ['[', ']', '{', '}'];

/// Render the full post:
///
/// ```text
/// Title
///
/// Flour - 200 g
/// Eggs - 2
///
/// 1. Mix.
/// 2. Fry.
/// ```
///
/// Brackets are stripped from every free-text field. Missing sections
/// render empty; the result never ends with blank lines.
pub fn render(item: &Item) -> String {
    let ingredients = item
        .ingredients
        .iter()
        .filter_map(|ing| {
            let name = clean(&ing.name);
            let amount = clean(&ing.amount);
            match (name.is_empty(), amount.is_empty()) {
                (true, _) => None,
                (false, true) => Some(name),
                (false, false) => Some(format!("{name} - {amount}")),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let instructions = item
        .instructions
        .iter()
        .map(|step| clean(step))
        .filter(|step| !step.is_empty())
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let out = format!("{}\n\n{ingredients}\n\n{instructions}", render_title(item));
    out.trim_end().to_string()
}

/// Title line alone, used as a short photo caption.
pub fn render_title(item: &Item) -> String {
    let title = clean(&item.title);
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| !BRACKETS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}
