use anyhow::Result;

use crate::builders::reporter::{ConsoleReporter, ManagedExcludes, OutputFormat, StatusReporter, export};
use crate::core::config::ConfigManager;
use crate::core::engine::ExcludeEngine;
use crate::core::git::Git2Client;
use crate::core::state::GitStateClassifier;

pub fn initialize_repository() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    config_manager.initialize()?;
    println!("✓ Initialized private exclude settings for this repository");
    Ok(())
}

pub fn add_paths(paths: &[String]) -> Result<()> {
    let engine = get_engine()?;
    let result = engine.add_multiple_to_git_exclude(paths)?;
    println!("{}", ConsoleReporter::new().render_batch("add", &result));
    Ok(())
}

pub fn remove_paths(paths: &[String]) -> Result<()> {
    let engine = get_engine()?;
    let result = engine.remove_multiple_from_git_exclude(paths)?;
    println!("{}", ConsoleReporter::new().render_batch("remove", &result));
    Ok(())
}

pub fn list_managed(format: OutputFormat) -> Result<()> {
    let engine = get_engine()?;
    let managed = ManagedExcludes {
        exclude_file: engine.exclude_file_path().display().to_string(),
        marker: engine.settings().marker_comment.clone(),
        entries: engine.get_pgit_managed_excludes()?,
    };
    match format {
        OutputFormat::Text => println!("{}", ConsoleReporter::new().render_managed(&managed)),
        other => print!("{}", export(&managed, other)?),
    }
    Ok(())
}

pub fn check_path(path: &str) -> Result<()> {
    let engine = get_engine()?;
    if engine.is_in_git_exclude(path) {
        println!("✓ {} is privately excluded", path.trim());
    } else {
        println!("✗ {} is not in the managed exclusions", path.trim());
    }
    Ok(())
}

pub fn show_state(path: &str, legacy: bool, format: OutputFormat) -> Result<()> {
    let config_manager = get_config_manager()?;
    let settings = config_manager.load_settings()?;
    let root = config_manager.get_repo_root();
    let engine = ExcludeEngine::new(root, &settings);
    let git = Git2Client::new(root);
    let classifier = GitStateClassifier::new(&git, &engine);
    let reporter = ConsoleReporter::new();

    if legacy {
        let state = classifier.get_legacy_file_git_state(path)?;
        match format {
            OutputFormat::Text => println!("{}", reporter.render_legacy_state(path.trim(), &state)),
            other => print!("{}", export(&state, other)?),
        }
    } else {
        let state = classifier.get_file_git_state(path)?;
        match format {
            OutputFormat::Text => println!("{}", reporter.render_state(&state)),
            other => print!("{}", export(&state, other)?),
        }
    }
    Ok(())
}

// Helper function to create an engine for the current repository
fn get_engine() -> Result<ExcludeEngine> {
    let config_manager = get_config_manager()?;
    let settings = config_manager.load_settings()?;
    Ok(ExcludeEngine::new(config_manager.get_repo_root(), &settings))
}

// Helper function to create ConfigManager instance
fn get_config_manager() -> Result<ConfigManager> {
    ConfigManager::new()
}
