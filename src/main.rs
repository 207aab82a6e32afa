//! HLS Recording Writer
//!
//! `hls-record-writer [serve|demo|init-config] [config.toml]`
//!
//! `serve` exposes the output directory over HTTP, `demo` records a
//! synthetic capture session into it, `init-config` writes a default
//! configuration file.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hls_record_writer::config::WriterConfig;
use hls_record_writer::config_file::{generate_default_config, ConfigFile};
use hls_record_writer::encoder::PassthroughFactory;
use hls_record_writer::error::{Result, WriterError};
use hls_record_writer::http::{create_router, ServeState};
use hls_record_writer::playlist::AssetManifest;
use hls_record_writer::resample::{CaptureFrame, ChannelLayout};
use hls_record_writer::segment::{DirectoryStore, SegmentStore};
use hls_record_writer::synthetic::{TestPatternGenerator, ToneGenerator};
use hls_record_writer::writer::{RecordSession, SessionOptions};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "hls-record-writer";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Demo,
    InitConfig,
}

/// Split `[command] [config]` the way the usage line reads.
fn parse_args(args: &[String]) -> (Command, String) {
    let (command, rest) = match args.first().map(String::as_str) {
        Some("serve") => (Command::Serve, &args[1..]),
        Some("demo") => (Command::Demo, &args[1..]),
        Some("init-config") => (Command::InitConfig, &args[1..]),
        _ => (Command::Serve, args),
    };
    let path = rest
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    (command, path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, config_path) = parse_args(&args);

    if command == Command::InitConfig {
        generate_default_config(&config_path)
            .map_err(|e| WriterError::Config(format!("{}: {}", config_path, e)))?;
        println!("Wrote default configuration to {}", config_path);
        return Ok(());
    }

    let (config, load_error) = load_config(&config_path);
    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    config.validate()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let store: Arc<dyn SegmentStore> = Arc::new(DirectoryStore::new(&config.recording.output_dir)?);

    match command {
        Command::Demo => {
            let demo_config = config.clone();
            let demo_store = store.clone();
            let manifest = tokio::task::spawn_blocking(move || run_demo(&demo_config, demo_store))
                .await
                .map_err(|e| WriterError::EncoderSession(e.to_string()))??;
            println!(
                "{}",
                config.recording.output_dir.join(&manifest.master).display()
            );
        }
        _ => serve(config, store).await?,
    }

    Ok(())
}

fn load_config(path: &str) -> (WriterConfig, Option<String>) {
    if !std::path::Path::new(path).exists() {
        return (WriterConfig::default(), None);
    }
    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_writer_config(), None),
        Err(e) => (WriterConfig::default(), Some(e.to_string())),
    }
}

async fn serve(config: WriterConfig, store: Arc<dyn SegmentStore>) -> Result<()> {
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| WriterError::Config(format!("{}: {}", config.socket_addr(), e)))?;

    let state = Arc::new(ServeState::new(config, store));
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Record a synthetic session: tone on app audio (44.1 kHz stereo), a
/// different tone on the mic (24 kHz mono), and a moving test pattern.
fn run_demo(config: &WriterConfig, store: Arc<dyn SegmentStore>) -> Result<AssetManifest> {
    let options = SessionOptions::from(config);
    let factory =
        PassthroughFactory::new(options.passthrough_config(config.segment.encoder_queue_depth));
    let session = RecordSession::start(options, store, &factory)?;
    tracing::info!("Demo session {}: {} s", session.id(), config.recording.demo_seconds);

    let frame_rate = config.video.frame_rate;
    let mut video = TestPatternGenerator::new(config.video.width, config.video.height, frame_rate);
    let mut app = ToneGenerator::new(44100, ChannelLayout::Stereo, 440.0, 441);
    let mut mic = ToneGenerator::new(24000, ChannelLayout::Mono, 660.0, 240);

    let total_frames = config.recording.demo_seconds as u64 * frame_rate as u64;
    for i in 0..total_frames {
        session.append_video(video.next_frame())?;

        let until = (i + 1) as f64 / frame_rate as f64;
        while (app.produced() as f64 / app.sample_rate() as f64) < until {
            let (samples, pts) = app.next_chunk();
            let frame = CaptureFrame::new(
                &samples,
                app.layout(),
                app.byte_order(),
                app.sample_rate(),
                pts,
            );
            session.append_app_audio(&frame)?;
        }
        while (mic.produced() as f64 / mic.sample_rate() as f64) < until {
            let (samples, pts) = mic.next_chunk();
            let frame = CaptureFrame::new(
                &samples,
                mic.layout(),
                mic.byte_order(),
                mic.sample_rate(),
                pts,
            );
            session.append_mic_audio(&frame)?;
        }
    }

    session.close()
}

/// Initialize logging with tracing
fn init_logging(config: &WriterConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("hls_record_writer={},tower_http=debug", config.log_level).into()
    });
    let json = config.log_format == "json";

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
