use clap::Parser;
use client::{Annotator, App, ClientConfig, ClientError, HttpTransport, UploadedImage};
use common::setup_logging;
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

/// Upload an image for object detection and save a copy with the boxes drawn on it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JPEG or PNG image to upload
    image: PathBuf,

    /// Declared media type (guessed from the file extension when omitted)
    #[arg(long)]
    content_type: Option<String>,

    /// Where to write the annotated image [default: <IMAGE stem>_detections.jpg]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    setup_logging(config.environment);

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &ClientConfig) -> Result<(), ClientError> {
    let upload = UploadedImage::from_path(&args.image, args.content_type.as_deref())?;

    println!("File Details:");
    println!("- Name: {}", upload.filename);
    println!("- Type: {}", upload.media_type);
    println!("- Size: {} bytes", upload.bytes.len());

    let transport = HttpTransport::new(config.endpoint.clone(), config.timeout)?;
    let app = App::new(transport, Annotator::load(&config.font_path));

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.image));

    let report = app.handle_upload(&upload, &output)?;

    println!();
    println!("Detection Results:");
    for detection in &report.lines {
        for line in detection {
            println!("{line}");
        }
        println!("---");
    }

    let path = report.annotated?;
    println!("Image with detections saved to {}", path.display());
    Ok(())
}

fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    image.with_file_name(format!("{stem}_detections.jpg"))
}
