//! Benchmarks for assembly and the analysis drivers.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tinyspice_core::{Circuit, Stimulus, Waveform, assemble};
use tinyspice_solver::{
    AcParams, AcSweepType, AnalysisConfig, DcSweepParams, TranParams, solve_ac, solve_dc_sweep,
    solve_transient,
};

/// RC ladder: `stages` series resistors, each followed by a shunt capacitor.
fn rc_ladder(stages: usize) -> Circuit {
    let mut circuit = Circuit::new();
    let source = Stimulus::dc(1.0)
        .with_ac(1.0)
        .with_waveform(Waveform::pulse(0.0, 1.0, 0.0, 1e-6, 1e-6, 5e-4, 1e-3));
    circuit.add_voltage_source("V1", "n0", "0", source);

    for i in 0..stages {
        let a = format!("n{i}");
        let b = format!("n{}", i + 1);
        circuit
            .add_resistor(format!("R{i}"), a, b.clone(), 1e3)
            .add_capacitor(format!("C{i}"), b, "0", 1e-9);
    }
    circuit
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for stages in [10, 50, 100] {
        let circuit = rc_ladder(stages);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &circuit, |bencher, circuit| {
            bencher.iter(|| assemble(black_box(circuit), black_box(1e3)).unwrap());
        });
    }

    group.finish();
}

fn bench_dc_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("dc_sweep");
    let params = DcSweepParams::new("V1", 0.0, 5.0, 0.1);
    let config = AnalysisConfig::default();

    for stages in [10, 50] {
        let circuit = rc_ladder(stages);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &circuit, |bencher, circuit| {
            bencher.iter(|| solve_dc_sweep(black_box(circuit), &params, &config).unwrap());
        });
    }

    group.finish();
}

fn bench_ac_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("ac_sweep");
    let params = AcParams::new(AcSweepType::Decade, 20, 1.0, 1e6);
    let config = AnalysisConfig::default();

    for stages in [10, 50] {
        let circuit = rc_ladder(stages);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &circuit, |bencher, circuit| {
            bencher.iter(|| solve_ac(black_box(circuit), &params, &config).unwrap());
        });
    }

    group.finish();
}

fn bench_transient(c: &mut Criterion) {
    let mut group = c.benchmark_group("transient");
    let config = AnalysisConfig::default();

    for stages in [10, 50] {
        let circuit = rc_ladder(stages);
        let params = TranParams::new(1e-6, 1e-3);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &circuit, |bencher, circuit| {
            bencher.iter(|| solve_transient(black_box(circuit), &params, &config).unwrap());
        });
    }

    // Same run with a diode at the end, forcing the nonlinear path every step.
    let mut circuit = rc_ladder(10);
    circuit.add_diode("D1", "n10", "0");
    let params = TranParams::new(1e-6, 1e-4);
    group.bench_function("diode_10", |bencher| {
        bencher.iter(|| solve_transient(black_box(&circuit), &params, &config).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_assemble,
    bench_dc_sweep,
    bench_ac_sweep,
    bench_transient
);
criterion_main!(benches);
