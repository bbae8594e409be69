//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs fits, batch fits and refinement
//! - prints reports/plots
//! - writes optional exports

use std::io::Write;

use clap::Parser;

use crate::cli::{BatchArgs, Cli, Command, FitArgs, PlotArgs, SimulateArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `wlc` binary.
pub fn run() -> Result<(), AppError> {
    // Lets RUST_LOG live in a per-project .env file.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args, cli.verbose > 0),
        Command::Batch(args) => handle_batch(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Models => handle_models(),
        Command::Plot(args) => handle_plot(args),
    }
}

/// `warn` by default, raised by each `-v`; `RUST_LOG` directives win.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            if record.level() <= log::Level::Warn {
                writeln!(buf, "{}: {}", record.level(), record.args())
            } else {
                writeln!(buf, "{}", record.args())
            }
        })
        .filter_level(level)
        .parse_default_env()
        .try_init();
    if let Err(err) = result {
        eprintln!("logger already initialised: {err}");
    }
}

fn handle_fit(args: FitArgs, progress: bool) -> Result<(), AppError> {
    let run = pipeline::resolve_run(args.model.config.as_deref(), &args.model.cli_overrides())?;
    let out = pipeline::run_fit(&args.data, run, progress)?;
    let data = &out.ingest.measurement;

    println!(
        "Data: {} ({} points used of {} rows, {} skipped{})",
        out.ingest.source,
        out.ingest.rows_used,
        out.ingest.rows_read,
        out.ingest.row_errors.len(),
        if out.ingest.stats.weighted { ", weighted" } else { "" }
    );
    if !out.session.history().is_empty() {
        println!("{}", crate::report::format_refine_history(out.session.history()));
    }
    println!("{}", out.session.stats()?);

    if args.plot {
        println!("{}", out.session.plot(data, args.width, args.height)?);
    }
    if args.residuals {
        println!("{}", out.session.plot_residuals(data, args.width, args.height)?);
    }

    // Optional exports.
    let result = out.session.result()?;
    if let Some(path) = &args.export_curve {
        crate::io::curve::write_curve_json(path, result, data)?;
    }
    if let Some(path) = &args.export_residuals {
        crate::io::export::write_residuals_csv(path, data, result)?;
    }
    if let Some(path) = &args.export_history {
        if out.session.history().is_empty() {
            log::warn!("--export-history given without refinement; nothing written");
        } else {
            crate::io::export::write_history_csv(path, out.session.history())?;
        }
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let run = pipeline::resolve_run(args.model.config.as_deref(), &args.model.cli_overrides())?;
    let rows = pipeline::run_batch(&args.files, &run)?;
    println!("Model: {} ({} files)", run.model, rows.len());
    print!("{}", crate::report::format_batch_table(&rows));

    let failed = rows.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        log::warn!("{failed} of {} batch fits failed", rows.len());
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = args.sample_config();
    let data = crate::data::generate_sample(&config)?;
    crate::data::write_measurement_csv(&args.out, &data)?;
    println!(
        "Wrote {} odijk points to {} (Lc={} nm, Lp={} nm, S={} pN, noise={} um, seed={})",
        data.len(),
        args.out.display(),
        config.lc,
        config.lp,
        config.s,
        config.noise,
        config.seed
    );
    Ok(())
}

fn handle_models() -> Result<(), AppError> {
    print!("{}", crate::report::format_models(&crate::models::registry()));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    println!("Model: {} (created {})", curve.model, curve.created_at.to_rfc3339());
    println!("{}", crate::plot::render_curve_file(&curve, args.width, args.height));
    Ok(())
}
