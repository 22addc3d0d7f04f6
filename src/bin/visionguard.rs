//! visionguard - upload an image to a VisionGuard detection server and
//! review the detections.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use visionguard::report;
use visionguard::shell::Shell;
use visionguard::{
    AnnotatedImage, ApiClient, ApiConfig, AppController, ClientConfig, PageView, PreviewRegistry,
    Ui, UiMode, UploadSurface,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run remote object detection on an image and review the boxes"
)]
struct Args {
    /// Detection server base URL (overrides config).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides config).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Progress output: auto, plain or pretty.
    #[arg(long, global = true)]
    ui: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the detection server is up
    Health,

    /// Detect objects in one image
    Detect {
        /// Image to upload.
        image: PathBuf,
        /// Declared MIME type, as a drag-and-drop would report it.
        #[arg(long)]
        mime: Option<String>,
        /// Save the server's annotated JPEG here.
        #[arg(long)]
        annotated_out: Option<PathBuf>,
        /// Write the result page as standalone HTML here.
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Interactive session reading commands from stdin
    Shell,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ClientConfig::load()?;
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(mode) = &args.ui {
        config.ui_mode = UiMode::parse(mode)?;
    }
    config.validate()?;
    log::debug!(
        "using {} (timeout {}s)",
        config.api_base_url,
        config.timeout.as_secs()
    );

    let ui = Ui::new(config.ui_mode, io::stderr().is_terminal());
    let client = ApiClient::new(ApiConfig::from(&config));

    match args.command {
        Command::Health => cmd_health(&client, &ui),
        Command::Detect {
            image,
            mime,
            annotated_out,
            html,
        } => cmd_detect(
            &client,
            &ui,
            &image,
            mime.as_deref(),
            annotated_out.as_deref(),
            html.as_deref(),
        ),
        Command::Shell => {
            let controller = AppController::new(PreviewRegistry::new());
            let mut shell = Shell::new(controller, Arc::new(client), ui);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            shell.run(io::BufReader::new(io::stdin()), &mut out)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn cmd_health(client: &ApiClient, ui: &Ui) -> Result<()> {
    let health = {
        let mut stage = ui.stage(&format!("Checking {}", client.base_url()));
        let health = client.check_health();
        if let Err(err) = &health {
            stage.fail(format!("{:#}", err));
        }
        health?
    };
    println!("{} ({})", health.message, health.status);
    Ok(())
}

fn cmd_detect(
    client: &ApiClient,
    ui: &Ui,
    image: &Path,
    mime: Option<&str>,
    annotated_out: Option<&Path>,
    html: Option<&Path>,
) -> Result<()> {
    let upload = UploadSurface::new();
    let file = match mime {
        Some(mime) => upload.drop_file(image, Some(mime))?,
        None => upload.choose_file(image)?,
    };

    let mut controller = AppController::new(PreviewRegistry::new());
    controller.select_file(file)?;
    {
        let mut stage = ui.stage("Detecting objects");
        controller.run_detection(client);
        if let Some(error) = controller.error() {
            stage.fail(error);
        }
    }

    println!("{}", PageView::from_controller(&controller));

    if let Some(path) = html {
        report::write_html(&controller, path)?;
        log::info!("wrote {}", path.display());
    }

    if let Some(error) = controller.error() {
        return Err(anyhow!("detection failed: {}", error));
    }

    if let Some(path) = annotated_out {
        let payload = controller
            .result()
            .and_then(|result| result.annotated_image.as_deref());
        match payload {
            Some(payload) => {
                let annotated = AnnotatedImage::decode(payload)?;
                annotated.save(path)?;
                let (width, height) = annotated.dimensions();
                log::info!(
                    "saved annotated image ({}x{}) to {}",
                    width,
                    height,
                    path.display()
                );
            }
            None => log::warn!("server returned no annotated image; nothing written"),
        }
    }
    Ok(())
}
