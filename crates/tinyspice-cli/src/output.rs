//! Tabular result printing and matrix dumps.

use std::f64::consts::PI;

use anyhow::Result;
use tinyspice_core::{Circuit, Excitation, dump, mna};
use tinyspice_solver::{AcResult, AnalysisConfig, DcResult, DcSolution, Probe, TranResult};

use crate::deck::Analysis;

const COLUMN: usize = 14;

fn print_banner(title: &str) {
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!();
}

/// Print one row per x value with a column per probe.
fn print_table(x_label: &str, probes: &[Probe], x: &[f64], columns: &[Vec<f64>]) {
    print!("{x_label:>COLUMN$}");
    for probe in probes {
        print!("{:>COLUMN$}", probe.to_string());
    }
    println!();
    println!("{}", "-".repeat(COLUMN * (1 + probes.len())));

    for (row, &xv) in x.iter().enumerate() {
        print!("{xv:>COLUMN$.6e}");
        for column in columns {
            print!("{:>COLUMN$.6e}", column[row]);
        }
        println!();
    }
    println!();
}

/// Split `(x, y)` traces into a shared x axis and one y column per probe.
fn columns<F>(probes: &[Probe], mut trace: F) -> Result<Vec<Vec<f64>>>
where
    F: FnMut(&Probe) -> tinyspice_solver::Result<Vec<(f64, f64)>>,
{
    probes
        .iter()
        .map(|probe| -> Result<Vec<f64>> {
            Ok(trace(probe)?.into_iter().map(|(_, y)| y).collect())
        })
        .collect()
}

pub fn print_operating_point(solution: &DcSolution, probes: &[Probe]) -> Result<()> {
    print_banner("DC Operating Point Analysis");

    if solution.iterations > 0 {
        println!("Converged in {} iterations.", solution.iterations);
        println!();
    }
    for probe in probes {
        println!("  {:<16} = {:.6e}", probe.to_string(), solution.value(probe)?);
    }
    println!();
    Ok(())
}

pub fn print_dc_sweep(result: &DcResult, probes: &[Probe]) -> Result<()> {
    print_banner(&format!("DC Sweep Analysis ({})", result.source));

    let columns = columns(probes, |p| result.trace(p))?;
    print_table(&result.source, probes, &result.values, &columns);
    println!("Sweep complete ({} points).", result.len());
    Ok(())
}

pub fn print_ac(result: &AcResult, probes: &[Probe]) -> Result<()> {
    print_banner("AC Analysis");

    let columns = columns(probes, |p| result.trace(p))?;
    print_table("Freq", probes, &result.frequencies, &columns);
    println!("AC analysis complete ({} frequency points).", result.len());
    Ok(())
}

pub fn print_transient(result: &TranResult, probes: &[Probe]) -> Result<()> {
    print_banner("Transient Analysis");

    let columns = columns(probes, |p| result.trace(p))?;
    print_table("Time", probes, &result.times(), &columns);
    println!("Transient analysis complete ({} points).", result.len());
    Ok(())
}

/// Print the reduced system the analysis will solve.
///
/// AC shows the system at the start frequency; transient shows both the
/// step matrix and the history matrix.
pub fn print_dump(circuit: &Circuit, analysis: &Analysis, config: &AnalysisConfig) -> Result<()> {
    match analysis {
        Analysis::Op | Analysis::Dc(_) => {
            let system = mna::assemble_with(circuit, 0.0, Excitation::Nominal, &config.stamp)?;
            let (matrix, rhs) = system.reduce_real();
            let names = system.index.reduced_names();
            println!("MNA matrix (DC):");
            print!("{}", dump::format_matrix(&matrix, &names));
            println!("RHS:");
            print!("{}", dump::format_rhs(&rhs, &names));
            if !system.nonlinear.is_empty() {
                println!("{} nonlinear terms", system.nonlinear.len());
            }
        }
        Analysis::Ac(params) => {
            let omega = 2.0 * PI * params.fstart;
            let system = mna::assemble_with(circuit, omega, Excitation::Ac, &config.stamp)?;
            let (matrix, rhs) = system.reduce();
            let names = system.index.reduced_names();
            println!("MNA matrix (AC, f = {:e} Hz):", params.fstart);
            print!("{}", dump::format_matrix(&matrix, &names));
            println!("RHS:");
            print!("{}", dump::format_rhs(&rhs, &names));
        }
        Analysis::Tran(params) => {
            let system = mna::assemble_transient_with(circuit, params.tstep, &config.stamp)?;
            let (matrix, rhs_gen) = system.reduce();
            let names = system.index.reduced_names();
            println!("MNA matrix (transient, h = {:e} s):", params.tstep);
            print!("{}", dump::format_matrix(&matrix, &names));
            println!("RHS generator:");
            print!("{}", dump::format_matrix(&rhs_gen, &names));
            if !system.nonlinear.is_empty() {
                println!("{} nonlinear terms", system.nonlinear.len());
            }
        }
    }
    println!();
    Ok(())
}
