use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use treepatch_core::{Backend, MemoryDocument, MemoryNodeId, MutationStats, Patcher, Root, VNode};

const CI_CONFIG: &[(u64, u64)] = &[(100, 5), (1_000, 1), (10_000, 1)];

const LOCAL_CONFIG: &[(u64, u64)] = &[(10, 1), (100, 1), (1_000, 1), (10_000, 1)];

#[derive(Clone, Copy)]
enum Workload {
    Append,
    Reverse,
    Interleave,
}

impl Workload {
    const ALL: [Workload; 3] = [Workload::Append, Workload::Reverse, Workload::Interleave];

    fn name(self) -> &'static str {
        match self {
            Workload::Append => "append",
            Workload::Reverse => "reverse",
            Workload::Interleave => "interleave",
        }
    }

    /// Starting and target key orders for a list of `count` items.
    fn sequences(self, count: u64) -> (Vec<u64>, Vec<u64>) {
        let from: Vec<u64> = (0..count).collect();
        let to = match self {
            Workload::Append => (0..count * 2).collect(),
            Workload::Reverse => from.iter().rev().copied().collect(),
            Workload::Interleave => {
                let (even, odd): (Vec<u64>, Vec<u64>) = from.iter().partition(|k| *k % 2 == 0);
                odd.into_iter().chain(even).collect()
            }
        };
        (from, to)
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    implementation: &'static str,
    backend: &'static str,
    workload: String,
    timestamp: String,
    name: String,
    items: u64,
    duration_ms: f64,
    items_per_sec: f64,
    mutations: MutationStats,
    extra: Extra,
    source_file: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Extra {
    count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    iterations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avg_duration_ms: Option<f64>,
}

fn list(keys: &[u64]) -> VNode<MemoryNodeId> {
    VNode::element("ul")
        .children(
            keys.iter()
                .map(|k| VNode::element("li").key(*k as i64).text(k.to_string()).build()),
        )
        .build()
}

fn is_ci() -> bool {
    env::var("CI").map(|v| v == "true").unwrap_or(false)
}

/// Time a single reconciliation from `from` to `to`; the initial mount is not measured.
fn run_benchmark(workload: Workload, count: u64) -> (f64, MutationStats) {
    let (from, to) = workload.sequences(count);
    let doc = Rc::new(MemoryDocument::new());
    let patcher = Patcher::init(Rc::clone(&doc), Vec::new());
    let root = doc.create_element("ul");
    let prev = patcher.patch(Root::Native(root), list(&from)).unwrap();
    let next = list(&to);
    doc.reset_stats();

    let start = Instant::now();
    patcher.patch(prev, next).unwrap();
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    (elapsed, doc.stats())
}

fn main() {
    let config: &[(u64, u64)] = if is_ci() { CI_CONFIG } else { LOCAL_CONFIG };

    let mut out_dir: Option<PathBuf> = None;
    let mut custom_config: Option<Vec<(u64, u64)>> = None;
    for arg in env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--count=") {
            let count = val.parse().unwrap_or(500);
            custom_config = Some(vec![(count, 1)]);
        } else if let Some(val) = arg.strip_prefix("--counts=") {
            let parsed: Vec<(u64, u64)> = val
                .split(',')
                .filter_map(|s| s.trim().parse::<u64>().ok())
                .map(|c| (c, 1))
                .collect();
            if !parsed.is_empty() {
                custom_config = Some(parsed);
            }
        } else if let Some(val) = arg.strip_prefix("--out-dir=") {
            out_dir = Some(PathBuf::from(val));
        }
    }

    let config = custom_config.as_deref().unwrap_or(config);
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("benchmarks/core"));
    fs::create_dir_all(&out_dir).expect("mkdirs");

    for workload in Workload::ALL {
        for &(count, iterations) in config {
            let runs: Vec<(f64, MutationStats)> =
                (0..iterations.max(1)).map(|_| run_benchmark(workload, count)).collect();
            let avg = runs.iter().map(|(d, _)| d).sum::<f64>() / runs.len() as f64;
            let (iterations_opt, avg_duration_ms) = if iterations > 1 {
                (Some(iterations), Some(avg))
            } else {
                (None, None)
            };
            let mutations = runs.last().map(|(_, s)| s.clone()).unwrap_or_default();

            let workload_name = format!("{}-{}", workload.name(), count);
            let out_path = out_dir.join(format!("memory-{}.json", workload_name));

            let output = Output {
                implementation: "treepatch-core",
                backend: "memory",
                workload: workload_name.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                name: workload_name,
                items: count,
                duration_ms: avg,
                items_per_sec: if avg > 0.0 {
                    count as f64 / avg * 1000.0
                } else {
                    f64::INFINITY
                },
                mutations,
                extra: Extra {
                    count,
                    iterations: iterations_opt,
                    avg_duration_ms,
                },
                source_file: Some(out_path.display().to_string()),
            };

            let json = serde_json::to_string_pretty(&output).expect("serialize");
            fs::write(&out_path, &json).expect("write output");
            println!("{}", json);
        }
    }
}
