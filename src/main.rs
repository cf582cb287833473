use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_recorder::config::{RegistryMode, StorageKind, DEFAULT_CONFIG_PATH};
use voice_recorder::{
    create_router, AppState, AudioSink, CommandSink, Config, DecodeSink, DocumentStorage,
    FileStorage, KeyValueStorage, ListingView, Recorder, RecordingBackendFactory,
    RecordingRegistry, Registry, RegistryClient, StartOutcome,
};

#[derive(Parser)]
#[command(name = "voice-recorder", version, about = "Record audio and keep a registry of saved recordings")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the recordings registry HTTP service
    Serve,
    /// Print the saved recordings
    List,
    /// Record, then optionally download, play and save the result
    Record {
        /// Stop after this many seconds (Ctrl-C stops earlier)
        #[arg(long, default_value_t = 5)]
        seconds: u64,
        /// Download the recording under this name ("" for a timestamped name)
        #[arg(long)]
        download: Option<String>,
        /// Save this name to the registry
        #[arg(long)]
        save: Option<String>,
        /// Play the recording back when done
        #[arg(long)]
        play: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_recorder=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::List => list(&cfg).await,
        Command::Record {
            seconds,
            download,
            save,
            play,
        } => record(&cfg, seconds, download, save, play).await,
    }
}

fn local_registry(cfg: &Config) -> Registry {
    let storage: Arc<dyn DocumentStorage> = match cfg.registry.storage {
        StorageKind::File => Arc::new(FileStorage::new(cfg.registry.path())),
        StorageKind::KeyValue => Arc::new(KeyValueStorage::new(
            cfg.registry.path(),
            cfg.registry.key.clone(),
        )),
    };
    Registry::new(storage)
}

fn registry_handle(cfg: &Config) -> Arc<dyn RecordingRegistry> {
    match cfg.registry.mode {
        RegistryMode::Local => Arc::new(local_registry(cfg)),
        RegistryMode::Remote => Arc::new(RegistryClient::new(&cfg.registry.url)),
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    let registry = local_registry(cfg);
    if registry.initialize().await? {
        info!("Initialized empty registry at {}", cfg.registry.path().display());
    }

    let app = create_router(AppState::new(registry));
    let addr = cfg.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("{} listening on http://{}", cfg.service.name, addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn list(cfg: &Config) -> Result<()> {
    let mut view = ListingView::new(registry_handle(cfg));
    view.mount().await;
    print!("{}", view.render());
    Ok(())
}

async fn record(
    cfg: &Config,
    seconds: u64,
    download: Option<String>,
    save: Option<String>,
    play: bool,
) -> Result<()> {
    let backend = RecordingBackendFactory::create(
        cfg.recorder.audio_source(),
        cfg.recorder.backend_config(),
    )?;
    let sink: Arc<dyn AudioSink> = match &cfg.recorder.player {
        Some(command) => Arc::new(CommandSink::parse(command)?),
        None => Arc::new(DecodeSink),
    };

    let mut recorder = Recorder::new(backend, registry_handle(cfg), sink);

    recorder.check_device_availability().await;
    // First start only asks for permission
    if recorder.start().await? == StartOutcome::PermissionRequested {
        recorder.start().await?;
    }

    info!("Recording for up to {}s (Ctrl-C to stop)", seconds);
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let stopped = recorder.stop().await;
    info!("Recorded {}", recorder.formatted_elapsed());
    if let Err(e) = stopped {
        warn!("{}", e);
    }

    if let Some(name) = download {
        if let Some(path) = recorder.download(&name, cfg.recorder.downloads_path())? {
            println!("Saved {}", path.display());
        }
    }

    if play {
        // Playback problems are reported but never fatal
        match recorder.play().await {
            Ok(Some(report)) => info!("Played {:?}", report.duration_secs),
            Ok(None) => warn!("Nothing to play"),
            Err(e) => warn!("{}", e),
        }
    }

    if let Some(name) = save {
        recorder.set_pending_name(name);
        let entry = recorder.save_pending().await?;
        println!("Registered \"{}\"", entry.name);
    }

    recorder.shutdown().await;
    Ok(())
}
