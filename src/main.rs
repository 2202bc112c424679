//! drive-storage CLI - issue Drive storage operations from the shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use drive_storage::{
    extract_id, Authenticator, CreateFolderOptions, DownloadOptions, DriveStorage, InfoOptions,
    ListOptions, RemoveOptions, UploadOptions, DEFAULT_DOWNLOAD_DIR,
};

/// CLI for the Drive storage facade.
#[derive(Parser)]
#[command(name = "drive-storage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files, optionally restricted to one folder.
    List {
        /// Folder URL or ID to list; omit to list everything accessible.
        folder: Option<String>,
    },

    /// Download a file to the local filesystem.
    Download {
        /// File URL or ID.
        file: String,

        /// Local name to save the file with.
        #[arg(long)]
        name: String,

        /// Local folder to save into.
        #[arg(long, short = 't')]
        to: Option<PathBuf>,
    },

    /// Upload a local file.
    Upload {
        /// Path of the local source file.
        path: PathBuf,

        /// Remote name; also determines the content type.
        #[arg(long)]
        name: String,

        /// Destination folder URL or ID.
        #[arg(long, short = 't')]
        to: String,
    },

    /// Delete a file or folder.
    Remove {
        /// File URL or ID.
        file: String,
    },

    /// Show id, name, and content type of a file.
    Info {
        /// File URL or ID.
        file: String,
    },

    /// Create a folder.
    Mkdir {
        /// Name of the new folder.
        name: String,

        /// Parent folder URL or ID.
        #[arg(long = "in")]
        parent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let auth = Authenticator::from_file(&cli.credentials)
        .with_context(|| format!("Failed to load credentials from {:?}", cli.credentials))?;
    let storage = DriveStorage::with_token_source(auth);

    match cli.command {
        Commands::List { folder } => {
            let parent = folder
                .as_deref()
                .map(extract_id)
                .transpose()
                .with_context(|| "Invalid folder URL or ID")?;

            let files = storage
                .list(ListOptions { parent })
                .await
                .context("Failed to list files")?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {:<40} {}", "ID", "TYPE", "NAME");
                println!("{}", "-".repeat(100));
                for file in files {
                    println!("{}", file);
                }
            }
        }

        Commands::Download { file, name, to } => {
            let file_id = extract_id(&file)
                .with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let dir = to
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

            storage
                .download(DownloadOptions {
                    file_id: file_id.clone(),
                    file_name: name.clone(),
                    destination: to,
                })
                .await
                .with_context(|| format!("Failed to download file: {}", file_id))?;

            println!("Saved to: {:?}", dir.join(name));
        }

        Commands::Upload { path, name, to } => {
            let folder_id =
                extract_id(&to).with_context(|| format!("Invalid folder URL or ID: {}", to))?;

            let created = storage
                .upload(UploadOptions {
                    file_path: path,
                    file_name: name,
                    parents: vec![folder_id],
                })
                .await
                .context("Failed to upload file")?;

            println!("Uploaded: {}", created);
        }

        Commands::Remove { file } => {
            let file_id = extract_id(&file)
                .with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let ack = storage
                .remove(RemoveOptions {
                    file_id: file_id.clone(),
                })
                .await
                .with_context(|| format!("Failed to remove file: {}", file_id))?;

            println!("Removed {} (ok: {})", file_id, ack.ok);
        }

        Commands::Info { file } => {
            let file_id = extract_id(&file)
                .with_context(|| format!("Invalid file URL or ID: {}", file))?;

            let info = storage
                .info(InfoOptions { file_id })
                .await
                .context("Failed to fetch file info")?;

            println!("id:   {}", info.id);
            println!("name: {}", info.name);
            println!("type: {}", info.mime_type.as_deref().unwrap_or("-"));
        }

        Commands::Mkdir { name, parent } => {
            let parent_id = extract_id(&parent)
                .with_context(|| format!("Invalid folder URL or ID: {}", parent))?;

            let created = storage
                .create_folder(CreateFolderOptions {
                    name,
                    parents: vec![parent_id],
                })
                .await
                .context("Failed to create folder")?;

            println!("Created: {}", created);
        }
    }

    Ok(())
}
