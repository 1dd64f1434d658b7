use bnmr_asym::{asym, AsymRequest};
use bnmr_core::{AcquisitionMode, Area, Histogram, InstrumentVar, RunHeader, RunRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BINS: usize = 4096;

fn noisy(rng: &mut StdRng, mean: f64) -> Vec<f64> {
    (0..BINS)
        .map(|_| (mean + rng.gen_range(-3.0..3.0) * mean.sqrt()).max(0.0).round())
        .collect()
}

fn synthetic_slr(seed: u64) -> RunRecord {
    let mut rng = StdRng::seed_from_u64(seed);
    let histograms = [("F+", 900.0), ("F-", 500.0), ("B+", 500.0), ("B-", 900.0)]
        .into_iter()
        .map(|(title, mean)| Histogram::new(title, noisy(&mut rng, mean)))
        .collect();
    let variables = vec![
        InstrumentVar::new("/PPG/PPG20/Dwell time (ms)", 10.0, 0.0),
        InstrumentVar::new("/PPG/PPG20/e20 prebeam dwelltimes", 20.0, 0.0),
        InstrumentVar::new("/PPG/PPG20/e20 beam on dwelltimes", 2000.0, 0.0),
        InstrumentVar::new("/PPG/PPG20/e20 beam off dwelltimes", 2076.0, 0.0),
    ];
    let header =
        RunHeader::new(40000, 2021, AcquisitionMode::Slr, Area::Bnmr).with_duration(1800.0);
    RunRecord::new(header, histograms, variables)
}

fn synthetic_frequency_scan(seed: u64) -> RunRecord {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f64> = (0..BINS).map(|i| 41_000_000.0 + (i % 256) as f64 * 100.0).collect();
    let mut histograms = vec![Histogram::new("Frequency", x)];
    histograms.extend(
        [("F+", 700.0), ("F-", 650.0), ("B+", 650.0), ("B-", 700.0)]
            .into_iter()
            .map(|(title, mean)| Histogram::new(title, noisy(&mut rng, mean))),
    );
    let header = RunHeader::new(40001, 2021, AcquisitionMode::Frequency, Area::Bnmr);
    RunRecord::new(header, histograms, Vec::new())
}

fn bench_time_resolved(c: &mut Criterion) {
    let run = synthetic_slr(7);
    let request = AsymRequest::default().with_rebin(4).with_deadtime(1e-8);
    c.bench_function("asym_slr_all", |b| {
        b.iter(|| asym(black_box(&run), black_box(&request)).expect("slr asymmetry"));
    });
}

fn bench_frequency_scan(c: &mut Criterion) {
    let run = synthetic_frequency_scan(11);
    let request = AsymRequest::new("all 0-3");
    c.bench_function("asym_1f_all", |b| {
        b.iter(|| asym(black_box(&run), black_box(&request)).expect("scan asymmetry"));
    });
}

criterion_group!(benches, bench_time_resolved, bench_frequency_scan);
criterion_main!(benches);
