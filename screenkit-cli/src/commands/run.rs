//! Run a screen definition's actions against a JSON context.

use anyhow::{bail, Context as _, Result};
use screenkit_core::context::keys;
use screenkit_core::{
    ActionEnv, ActionList, Config, Context, FilePropertySource, MemoryStore, ScreenDefinition,
    ScriptRegistry, Value,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RunOptions {
    pub context: Option<PathBuf>,
    pub trail: Vec<String>,
    pub pretty: bool,
}

/// Load the config file, or fall back to defaults when it does not exist.
fn load_config(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        Config::from_file(config_path).context("Failed to load configuration")
    } else {
        debug!(
            "No configuration at {}, using defaults",
            config_path.display()
        );
        Ok(Config::default())
    }
}

fn initial_context(config: &Config, opts: &RunOptions) -> Result<Context> {
    let mut context = if config.context.global {
        Context::with_global()
    } else {
        Context::new()
    };

    if let Some(locale) = config.locale()? {
        context.set_locale(&locale);
    }
    if let Some(time_zone) = config.context.time_zone.as_deref() {
        context.insert(keys::TIME_ZONE, time_zone);
    }

    if let Some(path) = &opts.context {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse context file {}", path.display()))?;
        match Value::from_json(json) {
            Value::Map(map) => context.extend(map),
            other => bail!(
                "Context file {} must hold a JSON object, found {}",
                path.display(),
                other.type_name()
            ),
        }
    }

    if !opts.trail.is_empty() {
        context.set_widget_trail(opts.trail.iter().cloned());
    }

    Ok(context)
}

pub fn run_definition(config_path: &Path, definition_path: &Path, opts: RunOptions) -> Result<()> {
    let config = load_config(config_path)?;
    let definition = ScreenDefinition::from_file(definition_path).with_context(|| {
        format!(
            "Failed to load screen definition {}",
            definition_path.display()
        )
    })?;
    let actions = ActionList::from_definition(&definition)
        .with_context(|| format!("Invalid screen definition {}", definition_path.display()))?;

    let session = Arc::new(MemoryStore::new());
    let application = Arc::new(MemoryStore::new());
    let mut env = ActionEnv::new()
        .with_session(session.clone())
        .with_application(application.clone())
        .with_scripts(ScriptRegistry::new());
    let roots = config.property_roots();
    if !roots.is_empty() {
        env = env.with_properties(Arc::new(FilePropertySource::with_cache_size(
            roots,
            config.properties.cache_size,
        )));
    }

    let mut context = initial_context(&config, &opts)?;
    info!(
        "Running {} actions of screen {}",
        actions.len(),
        definition.name
    );
    actions
        .run(&mut context, &env)
        .with_context(|| format!("Screen {} failed", definition.name))?;

    let output = serde_json::json!({
        "context": Value::Map(context.flatten()).to_json(),
        "session": Value::Map(session.snapshot()).to_json(),
        "application": Value::Map(application.snapshot()).to_json(),
    });
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string(&output)?);
    }

    Ok(())
}
