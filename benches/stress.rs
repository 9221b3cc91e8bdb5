use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use ulid::Ulid;

use stashfind::engine;
use stashfind::model::{GeoPoint, Reservation, SearchRequest, Span, Stashpoint};
use stashfind::store::InMemoryStore;

const HOUR: i64 = 3_600_000;
const CENTER: GeoPoint = GeoPoint { lat: 51.5074, lng: -0.1278 };

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

/// Deterministic scatter so runs are comparable.
fn scatter(i: u64) -> f64 {
    let x = i.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (x >> 11) as f64 / (1u64 << 53) as f64
}

fn base_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn at(ms: i64) -> DateTime<Utc> {
    base_day() + chrono::Duration::milliseconds(ms)
}

async fn setup(stashpoints: usize, reservations_each: usize) -> (Arc<InMemoryStore>, Vec<Ulid>) {
    let store = InMemoryStore::new();
    let mut ids = Vec::with_capacity(stashpoints);
    for i in 0..stashpoints {
        let sp = Stashpoint {
            id: Ulid::new(),
            name: format!("stashpoint-{i}"),
            address: String::new(),
            latitude: CENTER.lat + (scatter(i as u64) - 0.5) * 0.4,
            longitude: CENTER.lng + (scatter(i as u64 + 7919) - 0.5) * 0.6,
            capacity: 10 + (i % 40) as u32,
            open_from: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            open_until: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        };
        ids.push(sp.id);
        store.insert_stashpoint(sp).unwrap();
    }

    let start = Instant::now();
    let mut n = 0u64;
    for id in &ids {
        for _ in 0..reservations_each {
            let offset = (scatter(n) * 7.0 * 24.0) as i64 * HOUR;
            let length = 1 + (scatter(n + 1) * 10.0) as i64;
            store
                .insert_reservation(Reservation {
                    id: Ulid::new(),
                    stashpoint_id: *id,
                    dropoff_time: at(offset),
                    pickup_time: at(offset + length * HOUR),
                    bag_count: 1 + (n % 3) as u32,
                    is_cancelled: n % 17 == 0,
                })
                .await
                .unwrap();
            n += 1;
        }
    }
    println!(
        "  {} stashpoints, {} reservations loaded in {:.2}s",
        store.stashpoint_count(),
        store.reservation_count(),
        start.elapsed().as_secs_f64()
    );
    (Arc::new(store), ids)
}

fn request(day: i64, radius_km: Option<f64>, bag_count: u32) -> SearchRequest {
    SearchRequest {
        point: CENTER,
        radius_km,
        dropoff: at(day * 24 * HOUR + 9 * HOUR).fixed_offset(),
        pickup: at(day * 24 * HOUR + 18 * HOUR).fixed_offset(),
        bag_count,
    }
}

async fn phase1_sequential(store: &InMemoryStore) {
    let n = 200;
    let mut latencies = Vec::with_capacity(n);
    let mut matched = 0usize;
    for i in 0..n {
        let req = request((i % 7) as i64, None, 1 + (i % 5) as u32);
        let t = Instant::now();
        let results = engine::search(&req, store, store).await.unwrap();
        latencies.push(t.elapsed());
        matched += results.len();
    }
    print_latency("unbounded radius", &mut latencies);
    println!("    avg results per search: {}", matched / n);

    let mut latencies = Vec::with_capacity(n);
    for i in 0..n {
        let req = request((i % 7) as i64, Some(3.0), 2);
        let t = Instant::now();
        engine::search(&req, store, store).await.unwrap();
        latencies.push(t.elapsed());
    }
    print_latency("3 km radius", &mut latencies);
}

async fn phase2_concurrent(store: Arc<InMemoryStore>) {
    let n_tasks = 16;
    let n_per_task = 50;

    let start = Instant::now();
    let mut handles = Vec::new();
    for task in 0..n_tasks {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for j in 0..n_per_task {
                let req = request(((task + j) % 7) as i64, Some(10.0), 2);
                engine::search(&req, store.as_ref(), store.as_ref()).await.unwrap();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} tasks x {n_per_task} searches = {total} total in {:.2}s = {ops:.0} searches/sec",
        elapsed.as_secs_f64()
    );
}

async fn phase3_search_under_write_load(store: Arc<InMemoryStore>, ids: Vec<Ulid>) {
    let writer_store = store.clone();
    let writer = tokio::spawn(async move {
        let mut written = 0u64;
        for (i, id) in ids.iter().cycle().take(20_000).enumerate() {
            let offset = (i as i64 % (7 * 24)) * HOUR;
            if writer_store
                .insert_reservation(Reservation {
                    id: Ulid::new(),
                    stashpoint_id: *id,
                    dropoff_time: at(offset),
                    pickup_time: at(offset + 2 * HOUR),
                    bag_count: 1,
                    is_cancelled: false,
                })
                .await
                .is_ok()
            {
                written += 1;
            }
            if i % 100 == 0 {
                tokio::task::yield_now().await;
            }
        }
        written
    });

    let mut latencies = Vec::new();
    for i in 0..200 {
        let req = request((i % 7) as i64, Some(10.0), 1);
        let t = Instant::now();
        engine::search(&req, store.as_ref(), store.as_ref()).await.unwrap();
        latencies.push(t.elapsed());
    }
    let written = writer.await.unwrap();
    print_latency("search latency while writing", &mut latencies);
    println!("    {written} reservations written concurrently");
}

fn phase4_sweep() {
    for n in [100usize, 1_000, 10_000, 100_000] {
        let stashpoint_id = Ulid::new();
        let reservations: Vec<_> = (0..n as u64)
            .map(|k| {
                let offset = (scatter(k) * 30.0 * 24.0 * HOUR as f64) as i64;
                Reservation {
                    id: Ulid::new(),
                    stashpoint_id,
                    dropoff_time: at(offset),
                    pickup_time: at(offset + HOUR + (scatter(k + 3) * 6.0 * HOUR as f64) as i64),
                    bag_count: 1,
                    is_cancelled: false,
                }
            })
            .collect();
        let window = Span::new(0, 30 * 24 * HOUR);

        let t = Instant::now();
        let peak = engine::peak_demand(&window, &reservations);
        println!(
            "  {n:>7} reservations: peak={peak}, {:.2}ms",
            t.elapsed().as_secs_f64() * 1000.0
        );
    }
}

#[tokio::main]
async fn main() {
    let stashpoints: usize = std::env::var("STASHFIND_BENCH_STASHPOINTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2_000);
    let per_stashpoint: usize = std::env::var("STASHFIND_BENCH_RESERVATIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);

    println!("=== stashfind stress benchmark ===\n");

    println!("[setup]");
    let (store, ids) = setup(stashpoints, per_stashpoint).await;

    println!("\n[phase 1] sequential search latency");
    phase1_sequential(&store).await;

    println!("\n[phase 2] concurrent search throughput");
    phase2_concurrent(store.clone()).await;

    println!("\n[phase 3] search latency under write load");
    phase3_search_under_write_load(store, ids).await;

    println!("\n[phase 4] peak demand sweep");
    phase4_sweep();

    println!("\n=== benchmark complete ===");
}
