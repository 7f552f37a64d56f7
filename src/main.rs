mod config;
mod convert;
mod dispatch;
mod error;
mod fps;
mod frame;
mod pool;
mod publish;
mod relay;
mod render;
mod source;
mod transform;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use dispatch::CaptureDispatcher;
use error::PipelineError;
use frame::PackedBuffer;
use publish::FrameSlot;
use relay::RelayForwarder;
use render::{DisplaySink, RenderLoop};
use source::{SourceSettings, TestPatternSource};
use transform::TransformConfig;

/// Parse and validate resolution (WIDTHxHEIGHT format)
fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 1280x720)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok((width, height))
}

/// Parse and validate framerate (1-120 fps)
fn parse_framerate(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid framerate", s))?;
    if !(1..=120).contains(&fps) {
        return Err(format!(
            "Framerate must be between 1 and 120 fps, got {}",
            fps
        ));
    }
    Ok(fps)
}

/// Merge CLI threshold overrides into a resolved transform config.
///
/// Each flag applies only to the mode that carries it; overrides for other
/// modes are ignored.
fn apply_threshold_overrides(
    transform: TransformConfig,
    threshold: Option<u32>,
    low: Option<u32>,
    high: Option<u32>,
) -> TransformConfig {
    match transform {
        TransformConfig::Sobel { threshold: t } => TransformConfig::Sobel {
            threshold: threshold.unwrap_or(t),
        },
        TransformConfig::Hysteresis { low: l, high: h } => TransformConfig::Hysteresis {
            low: low.unwrap_or(l),
            high: high.unwrap_or(h),
        },
        other => other,
    }
}

/// Parse a transform mode name
fn parse_mode(s: &str) -> Result<TransformConfig, String> {
    TransformConfig::from_str(s).ok_or_else(|| {
        format!(
            "Unknown mode '{}'. Available modes: identity, grayscale, sobel, hysteresis",
            s
        )
    })
}

/// edgeviewer: live edge-detection viewer pipeline
#[derive(Parser)]
#[command(name = "edgeviewer")]
#[command(version, about = "Live edge-detection viewer pipeline")]
#[command(after_help = "EXAMPLES:
    # Run the pipeline with Sobel edges on a synthetic source
    edgeviewer run --mode sobel

    # Hysteresis edges with custom thresholds at 1280x720 for ten seconds
    edgeviewer run --mode hysteresis --low 30 --high 90 -r 1280x720 --duration 10

    # Push a JPEG snapshot of every 30th rendered frame
    edgeviewer run --relay-url http://127.0.0.1:5173/ingest --relay-every 30

    # List the available transform modes
    edgeviewer modes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against the synthetic test-pattern source
    Run {
        /// Transform mode (identity, grayscale, sobel, hysteresis)
        #[arg(long, short = 'm', value_parser = parse_mode)]
        mode: Option<TransformConfig>,

        /// Sobel threshold (applied to magnitude >> 3)
        #[arg(long, short = 't')]
        threshold: Option<u32>,

        /// Hysteresis low threshold (raw gradient magnitude)
        #[arg(long)]
        low: Option<u32>,

        /// Hysteresis high threshold (raw gradient magnitude)
        #[arg(long)]
        high: Option<u32>,

        /// Source resolution (WIDTHxHEIGHT, e.g., 1280x720)
        #[arg(long, short = 'r', value_parser = parse_resolution)]
        resolution: Option<(u32, u32)>,

        /// Source framerate (1-120 fps)
        #[arg(long, short = 'f', value_parser = parse_framerate)]
        framerate: Option<u32>,

        /// Stop after this many seconds (runs until Ctrl+C if not set)
        #[arg(long, short = 'd')]
        duration: Option<u64>,

        /// Relay endpoint receiving JPEG snapshots of the rendered stream
        #[arg(long)]
        relay_url: Option<String>,

        /// Push every Nth rendered frame to the relay
        #[arg(long)]
        relay_every: Option<u64>,

        /// Custom config file path (default: ~/.config/edgeviewer/config.toml)
        #[arg(long, short = 'c')]
        config: Option<std::path::PathBuf>,
    },

    /// List available transform modes
    Modes,
}

/// Display sink for the demo binary: counts frames and logs dimensions on
/// change instead of driving a real surface.
struct LogSink {
    last_dimensions: (u32, u32),
}

impl LogSink {
    fn new() -> Self {
        Self {
            last_dimensions: (0, 0),
        }
    }
}

impl DisplaySink for LogSink {
    fn present(&mut self, frame: &PackedBuffer) -> Result<(), PipelineError> {
        let dims = frame.dimensions();
        if dims != self.last_dimensions {
            log::info!("display surface now {}x{}", dims.0, dims.1);
            self.last_dimensions = dims;
        }
        Ok(())
    }
}

fn print_modes() {
    println!("Available transform modes:\n");
    println!("  identity    Pass the converted RGBA frame through untouched");
    println!("  grayscale   Replace each pixel with its luma");
    println!(
        "  sobel       Binary Sobel edge mask (default threshold {})",
        transform::DEFAULT_SOBEL_THRESHOLD
    );
    println!(
        "  hysteresis  Double-threshold edge mask with weak-edge promotion (default {}/{})",
        transform::DEFAULT_HYSTERESIS_LOW,
        transform::DEFAULT_HYSTERESIS_HIGH
    );
}

/// Run the pipeline: synthetic source -> dispatcher -> render loop.
#[allow(clippy::too_many_arguments)] // Direct mapping from CLI args
fn run_pipeline(
    transform: TransformConfig,
    resolution: (u32, u32),
    framerate: u32,
    duration: Option<u64>,
    relay_url: Option<String>,
    relay_every: u64,
    jpeg_quality: u8,
    interval_ms: u64,
) -> Result<(), PipelineError> {
    let slot = Arc::new(FrameSlot::new());
    let transform = Arc::new(Mutex::new(transform));
    let dispatcher = Arc::new(CaptureDispatcher::new(
        Arc::clone(&slot),
        Arc::clone(&transform),
    ));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PipelineError::SinkFailure(format!("failed to create runtime: {}", e)))?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrlc_tx = cancel_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(true);
    }) {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    let render_stats = rt.block_on(async {
        let mut render = RenderLoop::new(Arc::clone(&slot), Box::new(LogSink::new()))
            .with_interval(Duration::from_millis(interval_ms));
        if let Some(url) = relay_url {
            log::info!("relay enabled: every {}th frame to {}", relay_every, url);
            let relay = RelayForwarder::with_cadence(url, relay_every, jpeg_quality)?;
            render = render.with_relay(relay);
        }
        let stats = render.stats();

        let settings = SourceSettings {
            width: resolution.0,
            height: resolution.1,
            fps: framerate,
            switch: None,
        };
        let mut source = TestPatternSource::start(settings, Arc::clone(&dispatcher));

        let render_task = tokio::spawn(render.run(cancel_rx));

        if let Some(secs) = duration {
            let mut cancel = cancel_tx.subscribe();
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    let _ = cancel_tx.send(true);
                }
                _ = cancel.changed() => {}
            }
        }

        // Runs until cancelled (Ctrl+C or elapsed duration)
        let _ = render_task.await;

        let delivered = source.stop();
        dispatcher.close();
        log::info!("source stopped after {} frames", delivered);

        Ok::<_, PipelineError>(stats)
    })?;

    let stats = dispatcher.stats();
    println!();
    println!("Pipeline stopped.");
    println!("  Frames processed:   {}", stats.processed());
    println!("  Dropped (busy):     {}", stats.dropped_busy());
    println!("  Dropped (error):    {}", stats.dropped_error());
    println!("  Frames presented:   {}", render_stats.frames_presented());
    println!("  Sink errors:        {}", render_stats.sink_errors());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Modes) => print_modes(),
        Some(Commands::Run {
            mode,
            threshold,
            low,
            high,
            resolution,
            framerate,
            duration,
            relay_url,
            relay_every,
            config: config_path,
        }) => {
            let cfg = match config::Config::load(config_path.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            // Merge settings: CLI args > config file > built-in defaults
            let transform = match mode {
                Some(m) => m,
                None => match cfg.transform.resolve() {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
            };
            let transform = apply_threshold_overrides(transform, threshold, low, high);

            let resolution =
                resolution.unwrap_or((cfg.source.width, cfg.source.height));
            let framerate = framerate.unwrap_or(cfg.source.fps);
            let relay_url = relay_url.or(cfg.relay.url);
            let relay_every = relay_every.unwrap_or(cfg.relay.every);

            log::info!(
                "starting pipeline: {} at {}x{}@{}fps",
                transform,
                resolution.0,
                resolution.1,
                framerate
            );

            if let Err(e) = run_pipeline(
                transform,
                resolution,
                framerate,
                duration,
                relay_url,
                relay_every,
                cfg.relay.jpeg_quality,
                cfg.render.interval_ms,
            ) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("edgeviewer {}", env!("CARGO_PKG_VERSION"));
            println!("Live edge-detection viewer pipeline\n");
            println!("USAGE:");
            println!("    edgeviewer <COMMAND>\n");
            println!("COMMANDS:");
            println!("    run     Run the pipeline against the synthetic test-pattern source");
            println!("    modes   List available transform modes");
            println!("    help    Print this message or the help of a subcommand\n");
            println!("Run 'edgeviewer --help' for more details and examples.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution_valid() {
        assert_eq!(parse_resolution("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_resolution("640x480").unwrap(), (640, 480));
    }

    #[test]
    fn test_parse_resolution_invalid_format() {
        assert!(parse_resolution("1920").is_err());
        assert!(parse_resolution("1920:1080").is_err());
        assert!(parse_resolution("widthxheight").is_err());
    }

    #[test]
    fn test_parse_resolution_zero_values() {
        assert!(parse_resolution("0x1080").is_err());
        assert!(parse_resolution("1920x0").is_err());
    }

    #[test]
    fn test_parse_resolution_too_large() {
        assert!(parse_resolution("10000x10000").is_err());
    }

    #[test]
    fn test_parse_framerate_valid() {
        assert_eq!(parse_framerate("30").unwrap(), 30);
        assert_eq!(parse_framerate("1").unwrap(), 1);
        assert_eq!(parse_framerate("120").unwrap(), 120);
    }

    #[test]
    fn test_parse_framerate_invalid() {
        assert!(parse_framerate("0").is_err());
        assert!(parse_framerate("121").is_err());
        assert!(parse_framerate("abc").is_err());
    }

    #[test]
    fn test_parse_mode_names() {
        assert_eq!(
            parse_mode("identity").unwrap(),
            TransformConfig::Identity
        );
        assert_eq!(
            parse_mode("grayscale").unwrap(),
            TransformConfig::Grayscale
        );
        assert!(matches!(
            parse_mode("sobel").unwrap(),
            TransformConfig::Sobel { .. }
        ));
        assert!(matches!(
            parse_mode("hysteresis").unwrap(),
            TransformConfig::Hysteresis { .. }
        ));
    }

    #[test]
    fn test_parse_mode_unknown() {
        let err = parse_mode("sepia").unwrap_err();
        assert!(err.contains("Unknown mode"));
    }

    #[test]
    fn test_threshold_overrides_apply_to_matching_mode() {
        assert_eq!(
            apply_threshold_overrides(
                TransformConfig::Sobel { threshold: 40 },
                Some(25),
                None,
                None
            ),
            TransformConfig::Sobel { threshold: 25 }
        );
        assert_eq!(
            apply_threshold_overrides(
                TransformConfig::Hysteresis { low: 50, high: 150 },
                None,
                Some(30),
                Some(90)
            ),
            TransformConfig::Hysteresis { low: 30, high: 90 }
        );
    }

    #[test]
    fn test_threshold_overrides_partial_keeps_defaults() {
        assert_eq!(
            apply_threshold_overrides(
                TransformConfig::Hysteresis { low: 50, high: 150 },
                None,
                None,
                Some(200)
            ),
            TransformConfig::Hysteresis { low: 50, high: 200 }
        );
    }

    #[test]
    fn test_threshold_overrides_ignore_other_modes() {
        assert_eq!(
            apply_threshold_overrides(TransformConfig::Grayscale, Some(25), Some(30), Some(90)),
            TransformConfig::Grayscale
        );
        assert_eq!(
            apply_threshold_overrides(TransformConfig::Identity, None, Some(30), None),
            TransformConfig::Identity
        );
    }
}
