use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use labreader::{
    config::{AnalysisSettings, Config, PreprocessSettings},
    llm::client::OpenAiClient,
    ocr::{health::OcrHealthChecker, preprocess::ImagePreprocessor, OcrService},
    sink::{run_payload, JsonFileSink, ResultSink},
    AnalysisError, AnalysisService,
};

fn cli() -> Command {
    Command::new("labreader")
        .about("Extract structured parameters from scanned laboratory reports")
        .subcommand_required(true)
        .subcommand(
            Command::new("analyze")
                .about("Run the full pipeline on a PDF or image")
                .arg(path_arg("file", "Report to analyze"))
                .arg(flag("no-generative", "Use only the deterministic parser"))
                .arg(flag("no-fallback", "Do not fall back to the deterministic parser"))
                .arg(
                    Arg::new("model")
                        .help("Language model used for generative extraction")
                        .long("model")
                        .value_name("MODEL"),
                )
                .arg(
                    Arg::new("output")
                        .help("Directory where the run is stored as JSON")
                        .long("output")
                        .short('o')
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(flag("store", "Store the run as JSON under RESULTS_DIR"))
                .arg(flag("save-debug", "Write intermediate preprocessing images")),
        )
        .subcommand(
            Command::new("parse-text")
                .about("Run the deterministic parser over a UTF-8 text file")
                .arg(path_arg("file", "Text file to parse")),
        )
        .subcommand(
            Command::new("preprocess")
                .about("Prepare an image for recognition and write the result")
                .arg(path_arg("image", "Source image"))
                .arg(
                    Arg::new("out")
                        .help("Destination image")
                        .required(true)
                        .index(2)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(flag("save-debug", "Write intermediate preprocessing images"))
                .arg(flag("no-denoise", "Skip adaptive denoising"))
                .arg(flag("no-deskew", "Skip skew correction"))
                .arg(flag("no-binarize", "Skip binarization and morphology")),
        )
        .subcommand(Command::new("health").about("Check the OCR engine environment"))
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .index(1)
        .value_parser(value_parser!(PathBuf))
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).help(help).long(name).action(ArgAction::SetTrue)
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing <{}>", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("labreader=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = Config::from_env()?;

    match matches.subcommand() {
        Some(("analyze", sub)) => analyze(&config, sub).await,
        Some(("parse-text", sub)) => parse_text(&config, sub).await,
        Some(("preprocess", sub)) => preprocess(&config, sub),
        Some(("health", _)) => health(&config),
        _ => unreachable!("a subcommand is required"),
    }
}

fn build_service(config: &Config, preprocess: PreprocessSettings) -> Result<AnalysisService> {
    let ocr = OcrService::from_config(config, preprocess);
    let client = OpenAiClient::from_config(config).context("failed to build language model client")?;
    Ok(AnalysisService::new(ocr, Arc::new(client)))
}

async fn analyze(config: &Config, matches: &ArgMatches) -> Result<()> {
    let file = required_path(matches, "file")?;

    let mut settings = AnalysisSettings::from_env();
    if matches.get_flag("no-generative") {
        settings.generative_enabled = false;
    }
    if matches.get_flag("no-fallback") {
        settings.fallback_enabled = false;
    }
    if let Some(model) = matches.get_one::<String>("model") {
        settings.model = model.clone();
    }

    let mut preprocess = PreprocessSettings::from_config(config);
    if matches.get_flag("save-debug") {
        preprocess.debug_dir = Some(config.debug_image_dir.clone());
    }

    let service = build_service(config, preprocess)?;
    let run = match service.process_document(&file, &settings).await {
        Ok(run) => run,
        Err(e) => exit_on_analysis_error(e),
    };

    let target = match matches.get_one::<PathBuf>("output") {
        Some(dir) => Some(dir.clone()),
        None => matches.get_flag("store").then(|| config.results_dir.clone()),
    };
    if let Some(dir) = target {
        let sink = JsonFileSink::new(dir);
        sink.store(run.id, run_payload(&run)?).await?;
    }

    println!("{}", serde_json::to_string_pretty(&run.result)?);
    Ok(())
}

fn exit_on_analysis_error(e: AnalysisError) -> ! {
    error!("Analysis aborted [{}]: {}", e.error_code(), e);
    eprintln!("Error: {}", e);
    std::process::exit(if e.is_input_error() { 2 } else { 1 });
}

async fn parse_text(config: &Config, matches: &ArgMatches) -> Result<()> {
    let file = required_path(matches, "file")?;
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let settings = AnalysisSettings {
        generative_enabled: false,
        ..AnalysisSettings::default()
    };
    let service = build_service(config, PreprocessSettings::from_config(config))?;
    let result = service.analyze_text(&text, &settings).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn preprocess(config: &Config, matches: &ArgMatches) -> Result<()> {
    let image = required_path(matches, "image")?;
    let out = required_path(matches, "out")?;

    let mut settings = PreprocessSettings::from_config(config);
    if matches.get_flag("save-debug") {
        settings.debug_dir = Some(config.debug_image_dir.clone());
    }
    settings.denoise = !matches.get_flag("no-denoise");
    settings.deskew = !matches.get_flag("no-deskew");
    if matches.get_flag("no-binarize") {
        settings.binarize = false;
        settings.morphology = false;
    }

    let processed = match ImagePreprocessor::new(settings).process_path(&image) {
        Ok(processed) => processed,
        Err(e) => exit_on_analysis_error(e.into()),
    };
    processed
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    info!("Wrote {}x{} image to {}", processed.width(), processed.height(), out.display());
    Ok(())
}

fn health(config: &Config) -> Result<()> {
    let checker = OcrHealthChecker::new(config.ocr_languages.clone());
    match checker.perform_full_health_check() {
        Ok(diagnostics) => {
            println!("{}", diagnostics);
            println!("OCR environment OK");
            Ok(())
        }
        Err(errors) => {
            println!("{}", checker.get_full_diagnostics());
            for e in &errors {
                eprintln!("[{}] {}", e.error_code(), e);
            }
            std::process::exit(1);
        }
    }
}
