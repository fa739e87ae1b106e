//! Cloud drive FUSE filesystem for Linux
//!
//! Mounts the signed-in user's cloud drive at a local mount point. Every
//! filesystem request is answered live against the remote service.

use anyhow::{bail, Context, Result};
use clap::Parser;
use clouddrive_fuse::auth::credentials::CredentialStore;
use clouddrive_fuse::auth::graph_auth::GraphAuth;
use clouddrive_fuse::auth::session::establish_session;
use clouddrive_fuse::config::ProjectConfig;
use clouddrive_fuse::fuse::filesystem::{mount, CloudDriveFuse};
use clouddrive_fuse::fuse::DriveAdapter;
use clouddrive_fuse::log_appender::setup_logging;
use clouddrive_fuse::remote::graph_drive::GraphDrive;
use log::{error, info, LevelFilter};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "clouddrive-fuse", version, about = "Mount a cloud drive as a FUSE filesystem")]
struct Cli {
    /// Mount point path
    mountpoint: PathBuf,

    /// Settings file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long)]
    verbose: bool,

    /// Let other users access the mount
    #[arg(long)]
    allow_other: bool,
}

fn unmount(mountpoint: &Path) {
    match std::process::Command::new("fusermount")
        .arg("-u")
        .arg(mountpoint)
        .output()
    {
        Ok(_) => info!("Unmount requested for {}", mountpoint.display()),
        Err(e) => error!("Failed to unmount filesystem: {}", e),
    }
}

fn prompt_for_code(prompt: &str) -> Result<String> {
    println!("{}", prompt);
    print!("Enter verification code: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;
    Ok(code)
}

fn run(cli: Cli) -> Result<()> {
    let project_config = ProjectConfig::new(cli.config.as_deref())?;
    let settings = project_config.settings.clone();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        settings.log_level_filter()
    };
    setup_logging(project_config.data_dir(), level)?;

    info!("Starting cloud drive FUSE filesystem");
    info!("Mount point: {}", cli.mountpoint.display());
    info!("Settings file: {}", project_config.settings_path.display());

    if !cli.mountpoint.is_dir() {
        bail!("Mount point is not a directory: {}", cli.mountpoint.display());
    }
    if settings.client_id.is_empty() {
        bail!(
            "No client_id configured, set it in {}",
            project_config.settings_path.display()
        );
    }

    // Clear a stale mount left behind by a previous run
    let _ = std::process::Command::new("fusermount")
        .arg("-u")
        .arg(&cli.mountpoint)
        .output();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let auth = Arc::new(GraphAuth::new(
        &settings.client_id,
        &settings.tenant,
        runtime.handle().clone(),
    ));

    let credential_store = CredentialStore::new(project_config.config_dir());
    info!("Loading credentials from {}", credential_store.get_storage_info());
    let credentials = credential_store.load()?;

    if let Err(e) = establish_session(auth.as_ref(), &credentials, prompt_for_code) {
        error!("Authentication failed: {:#}", e);
        eprintln!("Authentication failed: {:#}", e);
        std::process::exit(1);
    }

    let drive = GraphDrive::connect(auth, runtime.handle().clone())?;
    let adapter = DriveAdapter::new(drive, &settings.cache_config);
    let filesystem = CloudDriveFuse::new(adapter, settings.attr_ttl);

    let mountpoint_for_shutdown = cli.mountpoint.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, shutting down...");
        unmount(&mountpoint_for_shutdown);
    })
    .context("Failed to set Ctrl-C handler")?;

    mount(filesystem, &cli.mountpoint, cli.allow_other)
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
