//! Attachment command implementations.

use std::collections::BTreeSet;

use colored::Colorize;

use crate::cli::{AttachmentCommands, Cli};
use crate::error::Result;
use crate::sync::parse_page_ref;

/// Execute attachment commands.
pub fn execute(command: &AttachmentCommands, cli: &Cli, json: bool) -> Result<()> {
    match command {
        AttachmentCommands::Download { page, only } => download(page, only, cli, json),
        AttachmentCommands::Upload { page, only } => upload(page, only, cli, json),
    }
}

/// Turn repeated `--only` flags into the filter set, `None` when absent.
fn filter_set(only: &[String]) -> Option<BTreeSet<String>> {
    if only.is_empty() {
        None
    } else {
        Some(only.iter().cloned().collect())
    }
}

fn download(page: &str, only: &[String], cli: &Cli, json: bool) -> Result<()> {
    let id = parse_page_ref(page)?;
    let filter = filter_set(only);
    let (manager, opts) = super::build(cli)?;
    let rt = super::runtime()?;

    match rt.block_on(manager.download_attachments(&id, filter.as_ref(), &opts)) {
        Ok(outcome) => {
            if json {
                let output = serde_json::json!({
                    "success": true,
                    "documentId": id,
                    "downloaded": outcome.downloaded,
                    "skipped": outcome.skipped,
                    "removed": outcome.removed,
                    "log": outcome.log_path,
                });
                println!("{output}");
            } else {
                println!(
                    "{} {} attachment(s) for page {id}",
                    "Downloaded".green(),
                    outcome.downloaded.len()
                );
                for title in &outcome.downloaded {
                    println!("  + {title}");
                }
                if !outcome.skipped.is_empty() {
                    println!("  {} unchanged", outcome.skipped.len());
                }
                for title in &outcome.removed {
                    println!("  {} {title} (gone remotely)", "removed".yellow());
                }
            }
            Ok(())
        }
        Err(failure) => Err(super::report_failure(failure, json)),
    }
}

fn upload(page: &str, only: &[String], cli: &Cli, json: bool) -> Result<()> {
    let id = parse_page_ref(page)?;
    let filter = filter_set(only);
    let (manager, opts) = super::build(cli)?;
    let rt = super::runtime()?;

    match rt.block_on(manager.upload_attachments(&id, filter.as_ref(), &opts)) {
        Ok(outcome) => {
            if json {
                let output = serde_json::json!({
                    "success": true,
                    "documentId": id,
                    "uploaded": outcome.uploaded,
                    "skipped": outcome.skipped,
                    "log": outcome.log_path,
                });
                println!("{output}");
            } else {
                println!(
                    "{} {} attachment(s) for page {id}",
                    "Uploaded".green(),
                    outcome.uploaded.len()
                );
                for title in &outcome.uploaded {
                    println!("  + {title}");
                }
                if !outcome.skipped.is_empty() {
                    println!("  {} unchanged", outcome.skipped.len());
                }
            }
            Ok(())
        }
        Err(failure) => Err(super::report_failure(failure, json)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_set_empty_means_unfiltered() {
        assert!(filter_set(&[]).is_none());
        let set = filter_set(&["a.png".to_string(), "b.pdf".to_string()]).unwrap();
        assert!(set.contains("a.png"));
        assert_eq!(set.len(), 2);
    }
}
