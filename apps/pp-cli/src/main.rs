use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use pp_app::{
    AppError, AppResult, DesignProject, DesignReport, PlantDef, SimulationDef, SpecDef,
    project_service, report_to_json, run_design, run_design_file, save_report_json,
    trajectory_to_csv,
};
use pp_controls::{InputClass, RouthArray};
use pp_core::Polynomial;

#[derive(Parser)]
#[command(name = "pp-cli")]
#[command(about = "poleplace CLI - pole-placement controller design for SISO plants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Design a controller for a plant given inline
    Design {
        /// Plant numerator, ascending powers of s ("10" or "1, 2")
        #[arg(long, allow_hyphen_values = true)]
        num: String,
        /// Plant denominator, ascending powers of s ("0 1 1" for s + s^2)
        #[arg(long, allow_hyphen_values = true)]
        den: String,
        /// Maximum percent overshoot
        #[arg(long, default_value_t = 10.0)]
        overshoot: f64,
        /// 2% settling time in seconds
        #[arg(long, default_value_t = 2.0)]
        settling_time: f64,
        /// Reference class: step or ramp
        #[arg(long, default_value = "step")]
        input: InputClass,
        /// Symmetric actuator limit (unconstrained if omitted)
        #[arg(long)]
        limit: Option<f64>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a design project file
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Write the JSON report here
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Routh stability test of a polynomial
    Routh {
        /// Coefficients, ascending powers of s
        #[arg(allow_hyphen_values = true)]
        coeffs: String,
    },
    /// Export the closed-loop time series of a project as CSV
    ExportSeries {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a template project file
    Init {
        /// Where to write the project YAML
        project_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Design {
            num,
            den,
            overshoot,
            settling_time,
            input,
            limit,
            json,
        } => cmd_design(&num, &den, overshoot, settling_time, input, limit, json),
        Commands::Run {
            project_path,
            report,
        } => cmd_run(&project_path, report.as_deref()),
        Commands::Routh { coeffs } => cmd_routh(&coeffs),
        Commands::ExportSeries {
            project_path,
            output,
        } => cmd_export_series(&project_path, output.as_deref()),
        Commands::Init { project_path } => cmd_init(&project_path),
    }
}

/// Parse a whitespace and/or comma separated list of numbers.
fn parse_coeffs(text: &str) -> AppResult<Vec<f64>> {
    let coeffs = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| AppError::InvalidInput(format!("'{}' is not a number", s)))
        })
        .collect::<AppResult<Vec<f64>>>()?;
    if coeffs.is_empty() {
        return Err(AppError::InvalidInput(
            "coefficient list is empty".to_string(),
        ));
    }
    Ok(coeffs)
}

fn cmd_design(
    num: &str,
    den: &str,
    overshoot: f64,
    settling_time: f64,
    input: InputClass,
    limit: Option<f64>,
    json: bool,
) -> AppResult<()> {
    let project = DesignProject {
        version: pp_app::LATEST_VERSION,
        name: "inline".to_string(),
        plant: PlantDef {
            num: parse_coeffs(num)?,
            den: parse_coeffs(den)?,
        },
        spec: SpecDef {
            overshoot_pct: overshoot,
            settling_time_s: settling_time,
            input,
        },
        simulation: SimulationDef {
            actuator_limit: limit,
            ..SimulationDef::default()
        },
    };
    let report = run_design(&project)?;
    if json {
        println!("{}", report_to_json(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn cmd_run(project_path: &Path, report_path: Option<&Path>) -> AppResult<()> {
    println!("Running design project: {}", project_path.display());
    let report = run_design_file(project_path)?;
    print_report(&report);
    if let Some(path) = report_path {
        save_report_json(path, &report)?;
        println!("✓ Report written to {}", path.display());
    }
    Ok(())
}

fn cmd_routh(coeffs: &str) -> AppResult<()> {
    let poly = Polynomial::new(parse_coeffs(coeffs)?);
    let routh = RouthArray::build(&poly);
    println!("p(s) = {}", poly);
    for (i, row) in routh.rows().iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>12.6}", v)).collect();
        println!("  s^{:<3} {}", routh.rows().len() - 1 - i, cells.join(" "));
    }
    println!(
        "Verdict: {:?} ({} right half-plane roots)",
        routh.verdict(),
        routh.sign_changes()
    );
    if routh.zero_rows() > 0 || routh.zero_pivots() > 0 {
        println!(
            "  note: {} zero row(s), {} zero pivot(s) substituted; verdict is approximate",
            routh.zero_rows(),
            routh.zero_pivots()
        );
    }
    Ok(())
}

fn cmd_export_series(project_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let report = run_design_file(project_path)?;
    let csv = trajectory_to_csv(&report.trajectory);

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            report.trajectory.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}

fn cmd_init(project_path: &Path) -> AppResult<()> {
    if project_path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            project_path.display()
        )));
    }
    project_service::save_project(project_path, &DesignProject::template())?;
    println!("✓ Template project written to {}", project_path.display());
    Ok(())
}

fn print_report(report: &DesignReport) {
    println!("Plant      G(s) = ({}) / ({})", report.plant.num, report.plant.den);
    println!(
        "Controller C(s) = ({}) / ({})",
        report.controller.num, report.controller.den
    );
    println!(
        "  zeta = {:.4}, wn = {:.4} rad/s, dominant pole {:.4}{:+.4}j",
        report.zeta, report.omega_n, report.dominant_pole.re, report.dominant_pole.im
    );
    println!(
        "  integrators: {} in plant, {} added; far poles {:?}",
        report.existing_integrators, report.integrators_added, report.far_poles
    );
    println!("  A_cl(s) = {}", report.desired_char_poly);
    println!(
        "  residual {:.2e}, rcond {:.2e}",
        report.residual, report.rcond
    );
    println!(
        "Stability: {:?} ({} right half-plane roots)",
        report.stability, report.rhp_roots
    );
    println!(
        "Simulation: dt = {:.5} s, t_end = {:.2} s, saturated {:.1}% of samples",
        report.dt_s,
        report.t_end_s,
        100.0 * report.saturated_fraction
    );
    if let Some(m) = &report.metrics {
        println!(
            "  overshoot {:.2}%, settling {:.3} s, peak {:.3} s, rise {:.3} s, ss error {:.2e}",
            m.overshoot_pct, m.settling_time, m.peak_time, m.rise_time, m.error
        );
    }
    if let Some(m) = &report.linear_metrics {
        println!(
            "  linear loop: overshoot {:.2}%, settling {:.3} s",
            m.overshoot_pct, m.settling_time
        );
    }
    if let Some(e) = report.tracking_error {
        println!("  final tracking error {:.2e}", e);
    }
    println!("Total time: {:.3} ms", 1e3 * report.timings.total_s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_lists_accept_commas_and_spaces() {
        assert_eq!(parse_coeffs("0 1 1").unwrap(), vec![0.0, 1.0, 1.0]);
        assert_eq!(parse_coeffs("1,2, 3").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_coeffs("-2.5e1").unwrap(), vec![-25.0]);
        assert!(parse_coeffs("").is_err());
        assert!(parse_coeffs("1 x").is_err());
    }
}
