use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

#[derive(Default)]
struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 链发现
    discovery_ok: u64,
    discovery_err: u64,
    // 健康探测
    probe_synced: u64,
    probe_offline: u64,
    // 跨链查询（按单链计）
    dispatch_ok: u64,
    dispatch_err: u64,
    dispatch_latency_sum_ms: u128,
    // 简易直方图分桶（毫秒）：<50, <100, <250, <500, <1000, >=1000
    dispatch_hist_buckets: [u64; 6],
}

fn state() -> MutexGuard<'static, MetricsState> {
    match METRICS.get_or_init(|| Mutex::new(MetricsState::default())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = state();
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = state();
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn inc_discovery(ok: bool) {
    let mut s = state();
    if ok {
        s.discovery_ok += 1;
    } else {
        s.discovery_err += 1;
    }
}

pub fn inc_probe(online: bool) {
    let mut s = state();
    if online {
        s.probe_synced += 1;
    } else {
        s.probe_offline += 1;
    }
}

pub fn observe_dispatch_latency_ms(latency_ms: u128, ok: bool) {
    let mut s = state();
    if ok {
        s.dispatch_ok += 1;
    } else {
        s.dispatch_err += 1;
    }
    s.dispatch_latency_sum_ms += latency_ms;
    let b = match latency_ms {
        0..=49 => 0,
        50..=99 => 1,
        100..=249 => 2,
        250..=499 => 3,
        500..=999 => 4,
        _ => 5,
    };
    s.dispatch_hist_buckets[b] += 1;
}

fn push_counter(out: &mut String, name: &str, help: &str) {
    out.push_str(&format!("# HELP chainscope_{name} {help}\n"));
    out.push_str(&format!("# TYPE chainscope_{name} counter\n"));
}

pub fn render_prometheus() -> String {
    let s = state();
    let mut out = String::new();

    push_counter(&mut out, "requests_total", "Total requests");
    out.push_str(&format!("chainscope_requests_total {}\n", s.total));

    push_counter(&mut out, "errors_total", "Total error responses");
    out.push_str(&format!("chainscope_errors_total {}\n", s.errors));

    push_counter(&mut out, "endpoint_requests_total", "Requests per endpoint");
    let mut endpoints: Vec<_> = s.per_endpoint.iter().collect();
    endpoints.sort();
    for (k, v) in endpoints {
        out.push_str(&format!(
            "chainscope_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    push_counter(&mut out, "endpoint_errors_total", "Errors per endpoint");
    let mut endpoints: Vec<_> = s.per_endpoint_err.iter().collect();
    endpoints.sort();
    for (k, v) in endpoints {
        out.push_str(&format!(
            "chainscope_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    push_counter(&mut out, "discovery_total", "Chain discovery attempts");
    out.push_str(&format!(
        "chainscope_discovery_total{{result=\"ok\"}} {}\n",
        s.discovery_ok
    ));
    out.push_str(&format!(
        "chainscope_discovery_total{{result=\"err\"}} {}\n",
        s.discovery_err
    ));

    push_counter(&mut out, "health_probes_total", "Chain health probes");
    out.push_str(&format!(
        "chainscope_health_probes_total{{status=\"synced\"}} {}\n",
        s.probe_synced
    ));
    out.push_str(&format!(
        "chainscope_health_probes_total{{status=\"offline\"}} {}\n",
        s.probe_offline
    ));

    push_counter(&mut out, "dispatch_requests_total", "Per-chain query requests");
    out.push_str(&format!(
        "chainscope_dispatch_requests_total{{result=\"ok\"}} {}\n",
        s.dispatch_ok
    ));
    out.push_str(&format!(
        "chainscope_dispatch_requests_total{{result=\"err\"}} {}\n",
        s.dispatch_err
    ));

    push_counter(
        &mut out,
        "dispatch_latency_ms_sum",
        "Sum of per-chain query latency in ms",
    );
    out.push_str(&format!(
        "chainscope_dispatch_latency_ms_sum {}\n",
        s.dispatch_latency_sum_ms
    ));

    out.push_str("# HELP chainscope_dispatch_latency_ms_bucket Per-chain query latency buckets\n");
    out.push_str("# TYPE chainscope_dispatch_latency_ms_bucket histogram\n");
    let bounds = [50, 100, 250, 500, 1000];
    let mut cumulative = 0;
    for (i, bound) in bounds.iter().enumerate() {
        cumulative += s.dispatch_hist_buckets[i];
        out.push_str(&format!(
            "chainscope_dispatch_latency_ms_bucket{{le=\"{}\"}} {}\n",
            bound, cumulative
        ));
    }
    // +Inf 桶
    out.push_str(&format!(
        "chainscope_dispatch_latency_ms_bucket{{le=\"+Inf\"}} {}\n",
        s.dispatch_hist_buckets.iter().sum::<u64>()
    ));

    out
}
