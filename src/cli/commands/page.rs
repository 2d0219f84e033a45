//! Page body command implementations.

use colored::Colorize;

use crate::cli::{Cli, PageCommands};
use crate::error::Result;
use crate::sync::parse_page_ref;

/// Execute page commands.
pub fn execute(command: &PageCommands, cli: &Cli, json: bool) -> Result<()> {
    match command {
        PageCommands::Download { page } => download(page, cli, json),
        PageCommands::Upload { page } => upload(page, cli, json),
    }
}

fn download(page: &str, cli: &Cli, json: bool) -> Result<()> {
    let id = parse_page_ref(page)?;
    let (manager, opts) = super::build(cli)?;
    let rt = super::runtime()?;

    match rt.block_on(manager.download_body(&id, &opts)) {
        Ok(outcome) => {
            if json {
                let output = serde_json::json!({
                    "success": true,
                    "documentId": id,
                    "skipped": outcome.skipped,
                    "version": outcome.version,
                    "bodyPath": outcome.body_path,
                    "metaPath": outcome.meta_path,
                    "log": outcome.log_path,
                });
                println!("{output}");
            } else if outcome.skipped {
                println!(
                    "Already up to date: page {id} at version {}",
                    outcome.version
                );
            } else {
                println!(
                    "{} page {id} at version {}",
                    "Downloaded".green(),
                    outcome.version
                );
                println!("  Body: {}", outcome.body_path.display());
                println!("  Meta: {}", outcome.meta_path.display());
            }
            Ok(())
        }
        Err(failure) => Err(super::report_failure(failure, json)),
    }
}

fn upload(page: &str, cli: &Cli, json: bool) -> Result<()> {
    let id = parse_page_ref(page)?;
    let (manager, opts) = super::build(cli)?;
    let rt = super::runtime()?;

    match rt.block_on(manager.upload_body(&id, &opts)) {
        Ok(outcome) => {
            if json {
                let output = serde_json::json!({
                    "success": true,
                    "documentId": id,
                    "pageUpdated": outcome.page_updated,
                    "version": outcome.version,
                    "log": outcome.log_path,
                });
                println!("{output}");
            } else if outcome.page_updated {
                println!(
                    "{} page {id}, now at version {}",
                    "Uploaded".green(),
                    outcome.version
                );
            } else {
                println!(
                    "No local changes: page {id} still at version {}",
                    outcome.version
                );
            }
            Ok(())
        }
        Err(failure) => Err(super::report_failure(failure, json)),
    }
}
