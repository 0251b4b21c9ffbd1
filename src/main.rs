use clap::Parser;
use fix_videos::args::Args;
use fix_videos::encoder::FfmpegEncoder;
use fix_videos::processor::Processor;
use fix_videos::report::write_report;
use std::sync::Arc;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.to_config()?;
    log::debug!("Configuration: {:?}", config);

    let encoder = Arc::new(FfmpegEncoder::new(config.ffmpeg.clone()));
    let processor = Processor::new(config, encoder);

    let summary = processor.run()?;

    if let Some(report_path) = &args.report {
        write_report(report_path, &summary)?;
    }

    Ok(summary.exit_code(args.fail_on_error))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
