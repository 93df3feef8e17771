use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Resumable chunked uploads", long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/chunkup/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never contact the upload service; record chunks locally only
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file
    Upload {
        path: PathBuf,
        /// User id sent to the service (default from config)
        #[arg(long)]
        user: Option<String>,
    },
    /// Continue an interrupted upload
    Resume {
        file_id: String,
        path: PathBuf,
        #[arg(long)]
        user: Option<String>,
    },
    /// List known files, completed first
    List,
    /// Show the metadata of an upload
    Status { file_id: String },
    /// Download a stored file from the service
    Download {
        file_id: String,
        /// Output path (default: the stored file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a file remotely and locally
    Delete { file_id: String },
    /// Remove expired ledger entries
    Gc,
}
