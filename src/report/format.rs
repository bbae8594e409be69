//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::error::FitError;
use crate::fit::{FitResult, RefineRound};
use crate::models::ForceExtensionModel;

/// Correlations with `|c|` below this are left out of the report.
pub const MIN_CORREL: f64 = 0.1;

impl FitResult {
    /// The lmfit-style text report.
    pub fn report(&self) -> String {
        fit_report(self, MIN_CORREL)
    }
}

/// Render `result` with sections `[[Model]]`, `[[Fit Statistics]]`,
/// `[[Variables]]` and `[[Correlations]]`.
pub fn fit_report(result: &FitResult, min_correl: f64) -> String {
    let mut out = String::new();
    let stats = &result.stats;

    out.push_str("[[Model]]\n");
    out.push_str(&format!("    Model({})\n", result.model_name()));

    out.push_str("[[Fit Statistics]]\n");
    out.push_str(&format!("    # fitting method   = {}\n", result.method.name()));
    if !result.converged {
        out.push_str(&format!(
            "    ## Warning: fit did not converge: {}\n",
            result.message
        ));
    }
    out.push_str(&format!("    # function evals   = {}\n", result.nfev));
    out.push_str(&format!("    # data points      = {}\n", stats.ndata));
    out.push_str(&format!("    # variables        = {}\n", stats.nvarys));
    out.push_str(&format!("    chi-square         = {}\n", fmt_g(stats.chisqr)));
    out.push_str(&format!("    reduced chi-square = {}\n", fmt_g(stats.redchi)));
    out.push_str(&format!("    Akaike info crit   = {}\n", fmt_g(stats.aic)));
    out.push_str(&format!("    Bayesian info crit = {}\n", fmt_g(stats.bic)));
    out.push_str(&format!("    R-squared          = {}\n", fmt_g(stats.rsquared)));

    out.push_str("[[Variables]]\n");
    let width = result.params.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for p in &result.params {
        let pad = " ".repeat(width - p.name.len());
        let line = if !p.vary {
            format!("    {}: {pad}{} (fixed)", p.name, fmt_g(p.value))
        } else if let Some(stderr) = p.stderr {
            format!(
                "    {}: {pad}{} +/- {} ({}) (init = {})",
                p.name,
                fmt_g(p.value),
                fmt_g(stderr),
                fmt_pct(stderr, p.value),
                fmt_g(p.init)
            )
        } else {
            format!("    {}: {pad}{} (init = {})", p.name, fmt_g(p.value), fmt_g(p.init))
        };
        out.push_str(&line);
        out.push('\n');
    }

    let pairs = sorted_correlations(result, min_correl);
    if !pairs.is_empty() {
        out.push_str(&format!(
            "[[Correlations]] (unreported correlations are < {min_correl:.3})\n"
        ));
        let labels: Vec<String> = pairs.iter().map(|(a, b, _)| format!("C({a}, {b})")).collect();
        let width = labels.iter().map(String::len).max().unwrap_or(0);
        for (label, (_, _, c)) in labels.iter().zip(&pairs) {
            out.push_str(&format!("    {label:<width$} = {c:+.4}\n"));
        }
    }

    out
}

/// Free-parameter pairs with `|c| >= min_correl`, strongest first.
fn sorted_correlations(result: &FitResult, min_correl: f64) -> Vec<(&str, &str, f64)> {
    let Some(corr) = &result.correlation else {
        return Vec::new();
    };
    let names = &result.var_names;
    let mut pairs = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let c = corr[(i, j)];
            if c.is_finite() && c.abs() >= min_correl {
                pairs.push((names[i].as_str(), names[j].as_str(), c));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
    pairs
}

fn fmt_pct(stderr: f64, value: f64) -> String {
    if value == 0.0 {
        return "inf%".to_string();
    }
    format!("{:.2}%", (stderr / value).abs() * 100.0)
}

/// Seven significant digits, switching to exponent notation for very
/// large or small magnitudes (like C's `%.7g`).
pub fn fmt_g(v: f64) -> String {
    const DIGITS: i32 = 7;
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }
    // Round first so 9999999.6 picks the exponent of 1.000000e7.
    let sci = format!("{:.*e}", (DIGITS - 1) as usize, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= DIGITS {
        let mantissa = trim_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (DIGITS - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// One line per registered model with its default parameters.
pub fn format_models(models: &[std::sync::Arc<dyn ForceExtensionModel>]) -> String {
    let mut out = String::new();
    for model in models {
        out.push_str(&format!(
            "{} ({} -> {})\n",
            model.name(),
            model.independent().label(),
            model.response().label()
        ));
        out.push_str(&format!("    {}\n", model.description()));
        for p in model.parameters().iter() {
            let state = if p.vary {
                format!("[{}, {}]", fmt_g(p.min), fmt_g(p.max))
            } else {
                "fixed".to_string()
            };
            out.push_str(&format!(
                "    {:<4} = {:>10} {:<6} {state}\n",
                p.name,
                fmt_g(p.value),
                p.units
            ));
        }
    }
    out
}

/// Refinement history table.
pub fn format_refine_history(rounds: &[RefineRound]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>5} {:>12} {:>10} {:>10} {:>14} {:>12} {:<8}\n",
            "round", "Lc[nm]", "Lp[nm]", "S[pN]", "chi-square", "dLp[nm]", "status"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<5} {:-<12} {:-<10} {:-<10} {:-<14} {:-<12} {:-<8}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rounds {
        let status = match (r.accepted, r.converged) {
            (false, _) => "rejected",
            (true, false) => "no-conv",
            (true, true) => "ok",
        };
        out.push_str(
            format!(
                "{:>5} {:>12.3} {:>10.4} {:>10} {:>14} {:>12} {:<8}\n",
                r.round,
                r.lc,
                r.lp,
                r.s.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string()),
                fmt_g(r.chisqr),
                r.delta_lp.map(fmt_g).unwrap_or_else(|| "-".to_string()),
                status,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// One summary row per batch entry.
pub fn format_batch_table(rows: &[(String, Result<FitResult, FitError>)]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<28} {:>12} {:>10} {:>10} {:>12} {:>10} {:<5}\n",
            "file", "Lc[nm]", "Lp[nm]", "S[pN]", "redchi", "R2", "conv"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<28} {:-<12} {:-<10} {:-<10} {:-<12} {:-<10} {:-<5}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (label, result) in rows {
        let line = match result {
            Ok(r) => format!(
                "{:<28} {:>12.3} {:>10.4} {:>10} {:>12} {:>10.6} {:<5}",
                truncate(label, 28),
                r.value("Lc").unwrap_or(f64::NAN),
                r.value("Lp").unwrap_or(f64::NAN),
                r.value("S").map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string()),
                fmt_g(r.stats.redchi),
                r.stats.rsquared,
                if r.converged { "yes" } else { "no" },
            ),
            Err(e) => format!("{:<28} error: {e}", truncate(label, 28)),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
