//! Command dispatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chunkup_protocol::UploadProgress;
use chunkup_store::LocalStore;
use chunkup_uploader::{
    HttpUploadService, OfflineService, ProgressEmitter, RemoteDelete, UploadService,
    UploadSession, Uploader,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::config::Config;

/// Runs one command to completion.
pub async fn run(config: Config, cli: Cli) -> anyhow::Result<()> {
    let store = match &config.store_dir {
        Some(dir) => LocalStore::open(dir)?,
        None => LocalStore::open_default()?,
    };

    let service: Arc<dyn UploadService> = if cli.offline {
        Arc::new(OfflineService)
    } else {
        Arc::new(HttpUploadService::new(&config.service_config())?)
    };

    let uploader = Uploader::new(service, store, config.uploader_config());

    if config.gc_on_startup {
        match uploader.collect_garbage() {
            Ok(report) => tracing::debug!(
                scanned = report.scanned,
                removed = report.removed,
                "startup gc finished"
            ),
            Err(e) => tracing::warn!(error = %e, "startup gc failed"),
        }
    }

    match cli.command {
        Command::Upload { path, user } => {
            let emitter = progress_printer();
            let (cancel, watcher) = cancel_on_interrupt();
            let result = uploader
                .upload_file(&path, user.as_deref(), &emitter, cancel)
                .await;
            watcher.abort();
            print_session(&result?, &path);
        }
        Command::Resume {
            file_id,
            path,
            user,
        } => {
            let emitter = progress_printer();
            let (cancel, watcher) = cancel_on_interrupt();
            let result = uploader
                .resume(&file_id, &path, user.as_deref(), &emitter, cancel)
                .await;
            watcher.abort();
            print_session(&result?, &path);
        }
        Command::List => {
            let files = uploader.list_files()?;
            if files.is_empty() {
                println!("no files");
            }
            for f in files {
                println!(
                    "{:<40} {:<12} {:>12}  {:<24} {} chunks  {}",
                    f.file_id,
                    format!("{:?}", f.status).to_lowercase(),
                    f.size,
                    f.mime_type,
                    f.uploaded_chunks.len(),
                    f.file_name
                );
            }
        }
        Command::Status { file_id } => {
            let metadata = uploader.get_upload_metadata(&file_id).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Download { file_id, output } => {
            let file = uploader.download_file(&file_id).await?;
            let target = output.unwrap_or_else(|| download_target(&file.file_name, &file_id));
            std::fs::write(&target, &file.content)?;
            println!(
                "{file_id} -> {} ({} bytes)",
                target.display(),
                file.content.len()
            );
        }
        Command::Delete { file_id } => {
            let report = uploader.delete_file(&file_id).await?;
            let remote = match &report.remote {
                RemoteDelete::Deleted => "deleted".to_string(),
                RemoteDelete::NotImplemented => "not supported by service".to_string(),
                RemoteDelete::Failed(e) => format!("failed ({e})"),
            };
            println!(
                "{}: remote {remote}, {} local entries purged",
                report.file_id, report.purged_entries
            );
        }
        Command::Gc => {
            let report = uploader.collect_garbage()?;
            println!(
                "scanned {} ledger entries, removed {}",
                report.scanned, report.removed
            );
        }
    }

    Ok(())
}

/// Default download path: the stored file name, reduced to its last
/// component, in the current directory.
fn download_target(file_name: &str, file_id: &str) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(file_id))
}

/// Returns a token cancelled on Ctrl-C, and the task watching for it.
fn cancel_on_interrupt() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("SIGINT received, cancelling upload");
                cancel.cancel();
            }
        }
    });
    (cancel, watcher)
}

fn progress_printer() -> ProgressEmitter {
    let mut emitter = ProgressEmitter::new();
    emitter.on_progress(Box::new(|p: &UploadProgress| {
        println!(
            "{} [{}/{}] {:>5.1}% {:?}",
            p.file_name,
            p.uploaded_chunks.len(),
            p.total_chunks,
            p.progress,
            p.status
        );
    }));
    emitter
}

fn print_session(session: &UploadSession, path: &Path) {
    println!(
        "{} -> {} ({:?}, {:?}, {} chunks)",
        path.display(),
        session.file_id(),
        session.status(),
        session.mode(),
        session.total_chunks()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_target_stays_in_current_directory() {
        assert_eq!(download_target("report.pdf", "srv-1"), PathBuf::from("report.pdf"));
        assert_eq!(download_target("../../etc/passwd", "srv-1"), PathBuf::from("passwd"));
        assert_eq!(download_target("", "srv-1"), PathBuf::from("srv-1"));
        assert_eq!(download_target("..", "srv-1"), PathBuf::from("srv-1"));
    }
}
