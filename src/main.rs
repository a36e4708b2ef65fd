use clap::Parser;
use std::fs;
use std::path::PathBuf;
use texsplice::{
    CommandTypesetter, ExportRequest, ExportResponse, Release, Typesetter, export, generate_export_id, logging,
};

/// Generate derivative LaTeX templates from a shared base template
#[derive(Parser, Debug)]
#[command(name = "texsplice")]
#[command(version = "0.1.0")]
#[command(about = "Slice, edit and flatten LaTeX template releases", long_about = None)]
struct Args {
    /// Release manifest (JSON)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Produce the distributable build
    #[arg(short, long)]
    dist: bool,

    /// Version to stamp and record, e.g. 1.0.1 or 101-b2
    #[arg(short = 'r', long = "release-version")]
    release_version: Option<String>,

    /// Run the manifest's typesetter on the main output
    #[arg(short, long)]
    compile: bool,

    /// Output structured JSON instead of human-readable
    #[arg(short, long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let release = match Release::load(&args.manifest) {
        Ok(release) => release,
        Err(e) => {
            let response = ExportResponse::failure(
                generate_export_id(),
                args.manifest.display().to_string(),
                format!("Failed to load manifest: {}", e),
            );
            output_response(&response, args.json, args.output.as_ref());
            std::process::exit(1);
        }
    };

    let typesetter = if args.compile {
        match &release.typesetter {
            Some(config) => Some(CommandTypesetter::new(config.clone())),
            None => {
                let response = ExportResponse::failure(
                    generate_export_id(),
                    release.name.clone(),
                    "--compile given but the manifest has no typesetter".to_string(),
                );
                output_response(&response, args.json, args.output.as_ref());
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let request = ExportRequest {
        dist: args.dist,
        version: args.release_version.clone(),
    };

    let response = match export(&release, &request, typesetter.as_ref().map(|t| t as &dyn Typesetter)) {
        Ok(report) => report.into_response(),
        Err(e) => ExportResponse::failure(generate_export_id(), release.name.clone(), format!("Export failed: {}", e)),
    };

    output_response(&response, args.json, args.output.as_ref());

    if !response.success {
        std::process::exit(1);
    }
}

/// Format and output the response
fn output_response(response: &ExportResponse, json_mode: bool, output_path: Option<&PathBuf>) {
    let output = if json_mode {
        serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| r#"{"error": "Failed to serialize response"}"#.to_string())
    } else if response.success {
        let mut text = format!(
            "Exported {} ({} file(s), {} line(s))\nBuild hash: {}",
            response.release,
            response.outputs.len(),
            response.lines,
            response.build_hash.as_deref().unwrap_or("-"),
        );
        if let Some(version) = &response.version {
            text.push_str(&format!("\nVersion: {}", version));
        }
        if let Some(seconds) = response.compile_seconds {
            text.push_str(&format!("\nCompiled in {:.2}s", seconds));
        }
        for path in &response.outputs {
            text.push_str(&format!("\n  {}", path.display()));
        }
        text
    } else {
        format!("Error: {}", response.error.as_deref().unwrap_or("Unknown error"))
    };

    if let Some(path) = output_path {
        if let Err(e) = fs::write(path, &output) {
            eprintln!("Failed to write output to '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    } else {
        println!("{}", output);
    }
}
