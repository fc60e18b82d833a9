//! Leaf Doctor CLI - potato leaf disease prediction from the terminal
//!
//! Usage:
//!     leafdoc [OPTIONS] [IMAGE]
//!
//! Environment Variables:
//!     LEAF_DOCTOR_URL: Prediction endpoint (default: hosted cloud function)
//!     LEAF_DOCTOR_TIMEOUT_MS: Request timeout in milliseconds (default: 30000)
//!     LEAF_DOCTOR_CONFIDENCE_SCALE: fraction or percent (default: fraction)
//!     LEAF_DOCTOR_LANG: Output language, en or fr (default: en)
//!     LEAF_DOCTOR_DEVICE_ID: ADB device used as the camera

use anyhow::Result;
use clap::Parser;
use leaf_doctor::{
    get_message, AdbConnection, ClientConfig, ConfidenceScale, ControllerConfig, EndpointSource,
    GalleryPrompt, ImageSource, Language, LeafCondition, PickOutcome, PlatformPicker,
    PredictionClient, UiController, UiState, DEFAULT_TIMEOUT_MS,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Leaf Doctor - potato leaf disease prediction
#[derive(Parser, Debug)]
#[command(name = "leafdoc")]
#[command(about = "Leaf Doctor - potato leaf disease prediction")]
#[command(after_help = r#"Examples:
    # Interactive mode (camera / gallery / clear / quit)
    leafdoc

    # Predict a single image
    leafdoc leaf.jpg

    # Use a local inference server
    leafdoc --url http://localhost:8000/predict leaf.jpg

    # Take a photo with the connected phone
    leafdoc --camera --device-id emulator-5554

    # Check that the inference service is up
    leafdoc --ping
"#)]
struct Cli {
    // Service options
    /// Prediction endpoint (falls back to LEAF_DOCTOR_URL, then the hosted service)
    #[arg(long)]
    url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "LEAF_DOCTOR_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// How the service reports confidence (the hosted default endpoint
    /// replies in percent, so pair it with `--confidence-scale percent`)
    #[arg(long, env = "LEAF_DOCTOR_CONFIDENCE_SCALE", default_value = "fraction", value_parser = ["fraction", "percent"])]
    confidence_scale: String,

    /// Check the endpoint and exit
    #[arg(long)]
    ping: bool,

    // Device options
    /// ADB device ID used as the camera
    #[arg(short = 'd', long, env = "LEAF_DOCTOR_DEVICE_ID")]
    device_id: Option<String>,

    /// Capture one photo with the device camera
    #[arg(long, conflicts_with = "image")]
    camera: bool,

    /// List connected devices and exit
    #[arg(long)]
    list_devices: bool,

    // Other options
    /// Output language (en or fr)
    #[arg(long, env = "LEAF_DOCTOR_LANG", default_value = "en", value_parser = ["en", "fr"])]
    lang: String,

    /// Image to diagnose (interactive mode if not provided)
    image: Option<String>,
}

/// Check that adb can be found before using the phone camera
fn check_adb_installed() -> bool {
    if which::which("adb").is_ok() {
        return true;
    }

    println!("\u{274C} ADB is not installed or not in PATH.");
    println!("   Solution: Install ADB:");
    println!("     - macOS: brew install android-platform-tools");
    println!("     - Linux: sudo apt install android-tools-adb");
    println!(
        "     - Windows: Download from https://developer.android.com/studio/releases/platform-tools"
    );
    false
}

/// Check if the prediction service answers
async fn check_service(client: &PredictionClient) -> bool {
    println!("\u{1F50D} Checking prediction service...");
    println!("{}", "-".repeat(50));

    let endpoint = client.config().resolve_endpoint();
    print!("1. Checking service health ({})... ", endpoint.url);
    io::stdout().flush().ok();

    match client.ping().await {
        Ok(true) => {
            println!("\u{2705} OK");
            println!("{}", "-".repeat(50));
            true
        }
        Ok(false) => {
            println!("\u{274C} FAILED");
            println!("   Error: The service answered with an error status");
            println!("{}", "-".repeat(50));
            false
        }
        Err(e) => {
            println!("\u{274C} FAILED");
            let error_msg = e.to_string();

            if error_msg.to_lowercase().contains("timed out") {
                println!("   Error: Connection to {} timed out", endpoint.url);
                println!("   Solution:");
                println!("     1. Check your network connection");
                println!("     2. Raise --timeout-ms");
            } else {
                println!("   Error: {}", error_msg);
                println!("   Solution:");
                println!("     1. Check if the inference server is running");
                println!("     2. Verify the endpoint URL is correct");
            }

            println!("{}", "-".repeat(50));
            false
        }
    }
}

/// Print connected ADB devices
async fn list_devices() -> Result<()> {
    let conn = AdbConnection::new();
    let devices = conn.list_devices().await?;

    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Connected devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let status_icon = if device.is_ready() {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        let model_info = device
            .model
            .map(|m| format!(" ({})", m))
            .unwrap_or_default();
        println!(
            "  {} {:<30} [{:?}]{}",
            status_icon, device.device_id, device.connection_type, model_info
        );
    }
    Ok(())
}

/// Print application header
fn print_header(client: &PredictionClient, lang: Language, device_id: Option<&str>) {
    let endpoint = client.config().resolve_endpoint();
    let source = match endpoint.source {
        EndpointSource::Override => "--url",
        EndpointSource::Environment => "LEAF_DOCTOR_URL",
        EndpointSource::Default => "default",
    };

    println!("{}", "=".repeat(50));
    println!("{}", get_message("title", lang));
    println!("{}", "=".repeat(50));
    println!("Endpoint: {} ({})", endpoint.url, source);
    println!("Timeout: {} ms", client.config().timeout.as_millis());
    println!("Confidence Scale: {}", client.config().confidence_scale.as_str());
    if endpoint.scale_mismatch(client.config().confidence_scale) {
        if let Some(known) = endpoint.known_scale() {
            println!(
                "\u{26A0}  This endpoint replies in {}; use --confidence-scale {}",
                known.as_str(),
                known.as_str()
            );
        }
    }
    println!("Language: {}", lang.as_str());
    if let Some(device_id) = device_id {
        println!("Device: {}", device_id);
    }
    println!("{}", "=".repeat(50));
}

/// Render the controller state the way the screen shows it
fn render_state(state: &UiState, condition: Option<LeafCondition>, lang: Language) {
    if let Some(uri) = &state.selected_image_uri {
        println!("{}: {}", get_message("selected_image", lang), uri);
    }

    match (&state.label, &state.confidence_text) {
        (Some(label), Some(confidence)) => {
            let condition = condition
                .map(|c| {
                    let marker = if c.is_diseased() { "\u{26A0}" } else { "\u{2705}" };
                    format!(" {} {}", marker, c.display_name())
                })
                .unwrap_or_default();
            println!("{}: {}{}", get_message("diagnosis", lang), label, condition);
            println!("{}: {}%", get_message("confidence", lang), confidence);
        }
        (Some(label), None) => println!("{}", label),
        _ => {}
    }

    if let Some(error) = &state.error_message {
        eprintln!("Error: {}", error);
    }
}

/// Print a single action result
fn report(outcome: &PickOutcome, state: &UiState, lang: Language) {
    match outcome {
        PickOutcome::PermissionDenied { notice } => println!("{}", notice),
        PickOutcome::Cancelled => println!("Cancelled."),
        PickOutcome::Busy => println!("{}", get_message("busy", lang)),
        PickOutcome::Predicted(result) => render_state(state, result.condition(), lang),
        _ => render_state(state, None, lang),
    }
}

/// Run one action and report it, printing the spinner text while loading
async fn run_action(
    controller: &UiController<PlatformPicker, PredictionClient>,
    source: ImageSource,
) -> PickOutcome {
    let lang = controller.config().lang;
    let mut rx = controller.subscribe();
    let spinner = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if rx.borrow_and_update().is_loading {
                println!("{}", get_message("analyzing", lang));
            }
        }
    });

    let outcome = controller.on_pick_image(source).await;
    spinner.abort();

    report(&outcome, &controller.state(), lang);
    outcome
}

/// Run interactive mode
async fn run_interactive_mode(
    controller: &UiController<PlatformPicker, PredictionClient>,
) -> Result<()> {
    let lang = controller.config().lang;
    println!("\n{}", get_message("instructions", lang));
    println!("Commands: camera, gallery, clear, quit\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(_) => {
                println!("\n\nInterrupted. Goodbye!");
                break;
            }
        }

        let command = input.trim();

        if command.eq_ignore_ascii_case("quit")
            || command.eq_ignore_ascii_case("exit")
            || command.eq_ignore_ascii_case("q")
        {
            println!("Goodbye!");
            break;
        }

        match command.to_lowercase().as_str() {
            "" => continue,
            "camera" | "c" => {
                if check_adb_installed() {
                    run_action(controller, ImageSource::Camera).await;
                }
            }
            "gallery" | "g" => {
                run_action(controller, ImageSource::Gallery).await;
            }
            "clear" => {
                controller.on_clear();
                println!("{}", get_message("clear", lang));
            }
            other => println!("Unknown command: {}", other),
        }
        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    tracing::debug!("Parsed arguments: {:?}", args);

    // Handle --list-devices (no service needed)
    if args.list_devices {
        if !check_adb_installed() {
            std::process::exit(1);
        }
        return list_devices().await;
    }

    let mut client_config = ClientConfig::new()
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_confidence_scale(ConfidenceScale::from_str(&args.confidence_scale));
    if let Some(url) = &args.url {
        client_config = client_config.with_endpoint(url);
    }
    let client = PredictionClient::new(client_config)?;

    // Handle --ping
    if args.ping {
        if !check_service(&client).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    let lang = Language::from_str(&args.lang);
    print_header(&client, lang, args.device_id.as_deref());

    // A one-shot image answers the gallery prompt with its own path
    let gallery_prompt: Option<GalleryPrompt> = args.image.clone().map(|image| {
        let prompt: GalleryPrompt = Arc::new(move || Some(image.clone()));
        prompt
    });

    let picker = PlatformPicker::new(args.device_id.clone(), gallery_prompt)?;
    let controller = UiController::new(picker, client, ControllerConfig::new().with_lang(lang));

    let source = if args.camera {
        if !check_adb_installed() {
            std::process::exit(1);
        }
        Some(ImageSource::Camera)
    } else if args.image.is_some() {
        Some(ImageSource::Gallery)
    } else {
        None
    };

    match source {
        Some(source) => {
            let outcome = run_action(&controller, source).await;
            if !matches!(outcome, PickOutcome::Predicted(_)) {
                std::process::exit(1);
            }
        }
        None => run_interactive_mode(&controller).await?,
    }

    Ok(())
}
