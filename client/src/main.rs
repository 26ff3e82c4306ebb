use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use logging::Logger;
use voice_client::audio::{DiscardPlayback, SilenceSource};
use voice_client::config::AppConfig;
use voice_client::control::RtviClient;
use voice_client::signaling::HttpSignaling;
use voice_client::status::{LoggedReporter, StatusBoard, TranscriptObserver};
use voice_client::transport::{
    EventSink, SimulatedTransport, Transport, TransportConfig, TransportError,
};
use voice_client::{SessionController, SessionHandle, SessionParts, run_main_tick};

fn main() {
    println!("Voice Client - Starting...");

    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> voice_client::Result<()> {
    let explicit = std::env::args().nth(1);
    let (config, source) = AppConfig::load(explicit.as_deref())?;
    match &source {
        Some(path) => println!("Configuration loaded from: {}", path.display()),
        None => println!("No configuration file found, using defaults"),
    }

    let logger = Logger::to_file(&config.log_path, config.log_level, config.console_log)?;
    println!(
        "Logging initialized: {} (level: {})",
        config.log_path.display(),
        config.log_level
    );
    let main_logger = logger.for_component("Main");
    for key in &config.ignored_keys {
        main_logger.warn(&format!("Unknown configuration key ignored: {}", key));
    }

    let board = StatusBoard::new();
    board.system_log("Voice client initialized");

    let signaling = HttpSignaling::new(config.signaling_config(), logger.for_component("Signaling"))?;
    main_logger.info(&format!("Signaling endpoint: {}", signaling.endpoint()));

    let transport_logger = logger.for_component("Transport");
    let transport_factory =
        move |config: &TransportConfig, sink: EventSink| -> Result<Box<dyn Transport>, TransportError> {
            Ok(Box::new(SimulatedTransport::new(
                config,
                sink,
                transport_logger.clone(),
            )))
        };

    let parts = SessionParts {
        transport_factory: Box::new(transport_factory),
        signaling: Box::new(signaling),
        audio_source: Box::new(SilenceSource::default()),
        playback: Arc::new(DiscardPlayback::default()),
        reporter: Arc::new(LoggedReporter::new(
            board.clone(),
            logger.for_component("Status"),
        )),
        control_handler: Box::new(RtviClient::new(
            Box::new(TranscriptObserver::new(board.clone())),
            logger.for_component("ControlChannel"),
        )),
    };

    let mut controller =
        SessionController::new(config.session_config(), parts, logger.for_component("Session"))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_console(controller.handle(), board, shutdown.clone(), main_logger.clone());
    println!("Commands: [enter]/t toggle, c connect, d disconnect, s status, q quit");

    run_main_tick(&mut controller, &shutdown)?;
    main_logger.info("Voice client stopped");
    Ok(())
}

/// Reads button presses and commands from stdin.
fn spawn_console(
    handle: SessionHandle,
    board: StatusBoard,
    shutdown: Arc<AtomicBool>,
    logger: Logger,
) {
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match line.trim() {
                    "" | "t" | "toggle" => {
                        handle.toggle();
                    }
                    "c" | "connect" => {
                        handle.connect();
                    }
                    "d" | "disconnect" => {
                        handle.disconnect();
                    }
                    "s" | "status" => print_status(&handle, &board),
                    "q" | "quit" => break,
                    other => println!("Unknown command: {}", other),
                }
            }
            shutdown.store(true, Ordering::Release);
        });

    if let Err(e) = spawned {
        logger.error(&format!("Failed to start console input: {}", e));
    }
}

fn print_status(handle: &SessionHandle, board: &StatusBoard) {
    let snapshot = board.snapshot();
    println!("Phase:  {}", handle.phase());
    println!("Status: {}", snapshot.status);
    println!("Button: {}", snapshot.button_label);
    for line in snapshot.log {
        println!("  | {}", line.text);
    }
}
