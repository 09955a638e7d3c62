//! Validate a screen definition by building its action list.

use anyhow::{Context, Result};
use screenkit_core::{ActionList, ScreenDefinition};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CheckSummary<'a> {
    name: &'a str,
    actions: Vec<&'static str>,
}

pub fn check_definition(path: &Path, json: bool) -> Result<()> {
    let definition = ScreenDefinition::from_file(path)
        .with_context(|| format!("Failed to load screen definition {}", path.display()))?;
    let actions = ActionList::from_definition(&definition)
        .with_context(|| format!("Invalid screen definition {}", path.display()))?;

    let summary = CheckSummary {
        name: &definition.name,
        actions: actions.iter().map(|a| a.tag()).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Screen {} is valid: {} actions",
            summary.name,
            summary.actions.len()
        );
        for (index, tag) in summary.actions.iter().enumerate() {
            println!("  #{index} <{tag}>");
        }
    }

    Ok(())
}
