//! Command dispatch: load the tree, run the operation, print the result

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use generational_arena::Index;
use tracing::{debug, instrument};

use crate::application::load_tree;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{DecisionTree, DomainError, TreeConvert};

/// Step that moves the journey one level back in `walk`.
pub const BACK: &str = "..";

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show) => show(&open_tree(cli)?),
        Some(Commands::Stats) => stats(&open_tree(cli)?),
        Some(Commands::Leaves) => leaves(&open_tree(cli)?),
        Some(Commands::Find { id }) => find(&open_tree(cli)?, id),
        Some(Commands::Walk { choices }) => walk(open_tree(cli)?, choices),
        Some(Commands::Export) => export(&open_tree(cli)?),
        Some(Commands::Validate) => validate(cli),
        Some(Commands::Config { command }) => config(command),
        Some(Commands::Completion { shell }) => completion(*shell),
        None => Ok(()),
    }
}

fn resolve_tree_file(file: Option<&Path>, settings: &Settings) -> CliResult<PathBuf> {
    file.map(Path::to_path_buf)
        .or_else(|| settings.tree_file.clone())
        .ok_or_else(|| {
            CliError::Usage("no tree file: pass --file or set tree_file in config".to_string())
        })
}

#[instrument(level = "debug", skip(cli))]
fn open_tree(cli: &Cli) -> CliResult<DecisionTree> {
    let settings = Settings::load(None)?;
    let path = resolve_tree_file(cli.file.as_deref(), &settings)?;
    debug!("tree file: {}", path.display());
    Ok(load_tree(&path, settings.tree)?)
}

fn id_of(tree: &DecisionTree, idx: Index) -> &str {
    tree.data(idx).map(|data| data.id.as_str()).unwrap_or("?")
}

fn path_string(tree: &DecisionTree, path: &[Index]) -> String {
    path.iter()
        .map(|&idx| id_of(tree, idx))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn show(tree: &DecisionTree) -> CliResult<()> {
    output::info(&tree.to_tree_string());
    Ok(())
}

fn stats(tree: &DecisionTree) -> CliResult<()> {
    let stats = tree.stats();
    output::action("nodes", &stats.nodes);
    output::action("leaves", &stats.leaves);
    output::action("end nodes", &stats.end_nodes);
    output::action("height", &stats.height);
    Ok(())
}

fn leaves(tree: &DecisionTree) -> CliResult<()> {
    for idx in tree.leaf_nodes() {
        output::info(id_of(tree, idx));
    }
    Ok(())
}

fn find(tree: &DecisionTree, id: &str) -> CliResult<()> {
    let idx = tree
        .find_node_by_id(id)
        .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
    let Some(node) = tree.node(idx) else {
        return Err(DomainError::NodeNotFound(id.to_string()).into());
    };

    output::header(&node.data);
    if let Some(description) = &node.data.description {
        output::detail(description);
    }
    if node.is_end_node() {
        output::detail(&format!(
            "end node: {}",
            node.data.end_message.as_deref().unwrap_or("")
        ));
    }
    output::action("path", &path_string(tree, &tree.path_to(idx)));
    Ok(())
}

#[instrument(level = "debug", skip(tree))]
fn walk(mut tree: DecisionTree, choices: &[String]) -> CliResult<()> {
    tree.start_journey()?;
    for choice in choices {
        if choice == BACK {
            tree.go_back()?;
        } else {
            tree.navigate_to_child(choice)?;
        }
    }

    output::action("path", &path_string(&tree, &tree.current_path()));
    let Some(current) = tree.current_node().and_then(|idx| tree.node(idx)) else {
        return Err(DomainError::NoActiveJourney.into());
    };

    if current.is_end_node() {
        output::success(current.data.end_message.as_deref().unwrap_or("End of journey"));
        return Ok(());
    }
    output::header(&current.data);
    for &child in &current.children {
        if let Some(data) = tree.data(child) {
            output::detail(data);
        }
    }
    if current.is_leaf() {
        output::warning("dead end: no choices left");
    }
    Ok(())
}

fn export(tree: &DecisionTree) -> CliResult<()> {
    output::info(&tree.to_json()?);
    Ok(())
}

fn validate(cli: &Cli) -> CliResult<()> {
    let tree = open_tree(cli)?;
    let stats = tree.stats();
    output::success(&format!(
        "valid tree: {} nodes, height {}",
        stats.nodes, stats.height
    ));
    Ok(())
}

fn config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(None)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".to_string());
            output::action("global", &global);
            let cwd = std::env::current_dir().map_err(|e| {
                CliError::InvalidArgs(format!("cannot determine current directory: {}", e))
            })?;
            output::action("local", &local_config_path(&cwd).display());
        }
    }
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
