//! Shared "fit pipeline" logic used by the `fit` and `batch` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! config merge -> CSV ingest -> compile -> fit (or refine)
//!
//! The command handlers can then focus on presentation and exports.

use std::path::{Path, PathBuf};

use crate::config::{CliOverrides, ConfigFile, RunConfig};
use crate::error::{AppError, FitError};
use crate::fit::{FitObserver, FitResult, ProgressLogger, fit_batch};
use crate::io::ingest::{IngestedData, load_measurement};
use crate::models::lookup;
use crate::params::compile;
use crate::session::WormLikeChain;

/// All computed outputs of a single `wlc fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub run: RunConfig,
    pub ingest: IngestedData,
    pub session: WormLikeChain,
}

/// Merge the optional config file with CLI values.
pub fn resolve_run(config: Option<&Path>, cli: &CliOverrides) -> Result<RunConfig, AppError> {
    let file = config.map(ConfigFile::load).transpose()?;
    let run = RunConfig::resolve(file.as_ref(), cli);
    log::debug!("resolved run config: {run:?}");
    Ok(run)
}

/// Ingest one CSV and fit (or refine) it.
pub fn run_fit(data: &Path, run: RunConfig, progress: bool) -> Result<FitRun, AppError> {
    let ingest = load_measurement(data)?;

    let mut session = WormLikeChain::new(&run.model)?;
    session.compile(&run.overrides)?;

    match &run.refine {
        Some(refine) => {
            session.refine(&ingest.measurement, refine, progress)?;
        }
        None => {
            let logger = progress.then(|| ProgressLogger::new(session.name()));
            session.fit_with(
                &ingest.measurement,
                &run.solver,
                logger.as_ref().map(|l| l as &dyn FitObserver),
            )?;
        }
    }

    Ok(FitRun {
        run,
        ingest,
        session,
    })
}

/// Ingest every file, then fit them in parallel. Results follow `files` order.
///
/// Unreadable files abort the batch before any fit runs; fit failures are
/// reported per file.
pub fn run_batch(
    files: &[PathBuf],
    run: &RunConfig,
) -> Result<Vec<(String, Result<FitResult, FitError>)>, AppError> {
    if run.refine.is_some() {
        log::warn!("refinement settings are ignored by batch fits");
    }
    let compiled = compile(lookup(&run.model)?, &run.overrides)?;

    let ingested = files
        .iter()
        .map(|path| load_measurement(path))
        .collect::<Result<Vec<_>, _>>()?;
    let datasets: Vec<_> = ingested.iter().map(|i| i.measurement.clone()).collect();

    let results = fit_batch(&compiled, &datasets, &run.solver);
    Ok(ingested
        .into_iter()
        .map(|i| i.source)
        .zip(results)
        .collect())
}
