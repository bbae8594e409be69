//! Export refinement history and fit residuals to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::io::Write;
use std::path::Path;

use crate::domain::Measurement;
use crate::error::AppError;
use crate::fit::{FitResult, RefineRound};

/// Write one row per refinement round.
///
/// Columns: `round,lc,lp,s,chisqr,delta_lp,converged,accepted`; `s` and
/// `delta_lp` are empty when not applicable.
pub fn write_history_csv(path: &Path, rounds: &[RefineRound]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::csv(format!("failed to create history CSV '{}'", path.display()), e))?;
    write_history(&mut writer, rounds)?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("failed to flush history CSV '{}'", path.display()), e))?;
    log::info!("wrote {} refinement rounds to {}", rounds.len(), path.display());
    Ok(())
}

fn write_history<W: Write>(writer: &mut csv::Writer<W>, rounds: &[RefineRound]) -> Result<(), AppError> {
    for round in rounds {
        writer
            .serialize(round)
            .map_err(|e| AppError::csv("failed to write history CSV row", e))?;
    }
    Ok(())
}

/// Write the measured points next to the best fit and weighted residuals.
pub fn write_residuals_csv(path: &Path, data: &Measurement, result: &FitResult) -> Result<(), AppError> {
    check_lengths(data, result)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::csv(format!("failed to create residual CSV '{}'", path.display()), e))?;
    write_residuals(&mut writer, data, result)?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("failed to flush residual CSV '{}'", path.display()), e))?;
    Ok(())
}

/// `data` must be the measurement `result` was fitted to.
fn check_lengths(data: &Measurement, result: &FitResult) -> Result<(), AppError> {
    let n = result.residual.len();
    if data.force.len() != n || data.distance.len() != n {
        return Err(AppError::Input(format!(
            "measurement has {} points but the fit used {n}",
            data.len()
        )));
    }
    Ok(())
}

fn write_residuals<W: Write>(
    writer: &mut csv::Writer<W>,
    data: &Measurement,
    result: &FitResult,
) -> Result<(), AppError> {
    check_lengths(data, result)?;
    let fit_column = format!("{}_fit", result.response().label());
    writer
        .write_record(["distance", "force", "sigma", fit_column.as_str(), "residual"])
        .map_err(|e| AppError::csv("failed to write residual CSV header", e))?;
    for i in 0..data.len() {
        writer
            .write_record([
                format!("{}", data.distance[i]),
                format!("{}", data.force[i]),
                format!("{}", data.sigma_at(i)),
                format!("{}", result.best_fit[i]),
                format!("{}", result.residual[i]),
            ])
            .map_err(|e| AppError::csv("failed to write residual CSV row", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{SolverConfig, fit};
    use crate::models::lookup;
    use crate::params::{Overrides, compile};

    fn odijk_fit() -> (Measurement, FitResult) {
        let model = lookup("odijk").unwrap();
        let force: Vec<f64> = (1..=20).map(|i| i as f64 * 2.0).collect();
        let distance = model.evaluate(&force, &[4.1, 5000.0, 50.0, 1000.0]).unwrap();
        let data = Measurement::new(force, distance);
        let compiled = compile(model, &Overrides::new()).unwrap();
        let result = fit(&compiled, &data, &SolverConfig::default(), None).unwrap();
        (data, result)
    }

    #[test]
    fn residual_rows_follow_the_measurement() {
        let (data, result) = odijk_fit();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_residuals(&mut writer, &data, &result).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "distance,force,sigma,distance_fit,residual");
        assert_eq!(lines.len(), 21);
        assert!(lines[1].starts_with(&format!("{},2,1,", data.distance[0])));
    }

    #[test]
    fn residuals_reject_a_different_measurement() {
        let (_, result) = odijk_fit();
        let short = Measurement::new(vec![1.0, 2.0], vec![4.0, 4.2]);
        let mut writer = csv::Writer::from_writer(Vec::new());
        let err = write_residuals(&mut writer, &short, &result).unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(writer.into_inner().unwrap().is_empty());
    }

    #[test]
    fn history_columns_and_empty_optionals() {
        let rounds = vec![
            RefineRound {
                round: 1,
                lc: 5000.0,
                lp: 50.0,
                s: None,
                chisqr: 0.5,
                delta_lp: None,
                converged: true,
                accepted: true,
            },
            RefineRound {
                round: 2,
                lc: 5001.0,
                lp: 50.5,
                s: Some(1000.0),
                chisqr: 0.25,
                delta_lp: Some(0.5),
                converged: true,
                accepted: false,
            },
        ];
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_history(&mut writer, &rounds).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "round,lc,lp,s,chisqr,delta_lp,converged,accepted");
        assert_eq!(lines[1], "1,5000.0,50.0,,0.5,,true,true");
        assert_eq!(lines[2], "2,5001.0,50.5,1000.0,0.25,0.5,true,false");
    }
}
