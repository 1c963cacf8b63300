use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use metar_cleaner::models::{CloudLayer, FeatureFrame, MetarObservation};
use metar_cleaner::processors::{taxonomy, MetarCleaner};

const STATIONS: [&str; 5] = ["KJFK", "KBOS", "EGLL", "KSFO", "KORD"];
const PHENOMENA: [&str; 6] = ["Light Rain", "Mist", "Haze", "Heavy Snow", "Thunderstorm", "Fog"];
const RULES: [&str; 4] = ["VFR", "MVFR", "IFR", "LIFR"];

// Create test data for benchmarking
fn create_test_observations(count: usize) -> Vec<MetarObservation> {
    let base_time = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

    (0..count)
        .map(|i| {
            let station = STATIONS[i % STATIONS.len()];
            let mut obs = MetarObservation::new(&format!("{} {:06}Z", station, i), station);
            obs.time = Some(base_time + Duration::minutes(i as i64 * 20));
            obs.temperature = Some(-10.0 + (i % 40) as f64);
            obs.altimeter = Some(if i % 2 == 0 { 29.92 } else { 1013.0 });
            obs.visibility = if i % 7 == 0 { None } else { Some((i % 12) as f64) };
            obs.wind_speed = if i % 3 == 0 { None } else { Some((i % 25) as f64) };
            obs.sea_level_pressure = if i % 5 == 0 { None } else { Some(1000.0 + (i % 30) as f64) };
            obs.flight_rules = Some(RULES[i % RULES.len()].to_string());
            obs.wx_codes = vec![PHENOMENA[i % PHENOMENA.len()].to_string()];
            obs.clouds = (0..(i % 4))
                .map(|layer| CloudLayer::new("BKN", Some(20.0 + layer as f64 * 80.0), None))
                .collect();
            obs.pressure_tendency = Some("Steady".to_string());
            obs.density_altitude = Some(500.0);
            obs.pressure_altitude = Some(100.0);
            obs
        })
        .collect()
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for count in [1_000, 10_000] {
        let observations = create_test_observations(count);
        let frame = FeatureFrame::from_observations(&observations);
        let cleaner = MetarCleaner::new();

        group.bench_with_input(BenchmarkId::new("clean_frame", count), &frame, |b, frame| {
            b.iter(|| cleaner.clean_frame(black_box(frame.clone()), None).unwrap())
        });
    }

    group.finish();
}

fn benchmark_taxonomy(c: &mut Criterion) {
    let phenomena: Vec<String> = PHENOMENA.iter().map(|p| p.to_string()).collect();

    c.bench_function("map_phenomena", |b| {
        b.iter(|| taxonomy::map_phenomena(black_box(&phenomena)))
    });
}

criterion_group!(benches, benchmark_pipeline, benchmark_taxonomy);
criterion_main!(benches);
