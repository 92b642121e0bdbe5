//! 性能基准测试 - 链发现
//!
//! 测试场景:
//! 1. 大型发现源页面的链 ID 扫描
//! 2. 含大量重复与活动链的 discover 归并

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chainscope::{domain::discover, infrastructure::discovery_source::extract_chain_ids};

fn chain_id(n: usize) -> String {
    format!("{:064x}", n)
}

/// 模拟目录页面：每条链出现多次，夹杂无关标记
fn listing(chains: usize, repeats: usize) -> String {
    let mut out = String::from("<html><body><ul>");
    for r in 0..repeats {
        for i in 0..chains {
            out.push_str(&format!(
                "<li><a href=\"/chains/{}/applications\">chain {} ({})</a></li>",
                chain_id(i),
                i,
                r
            ));
        }
    }
    out.push_str("</ul></body></html>");
    out
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_chain_ids");
    for chains in [10usize, 100, 1000] {
        let text = listing(chains, 3);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chains), &text, |b, text| {
            b.iter(|| extract_chain_ids(black_box(text)))
        });
    }
    group.finish();
}

fn bench_discover(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover");
    for chains in [10usize, 100, 1000] {
        let candidates: Vec<String> = (0..chains * 3).map(|i| chain_id(i % chains)).collect();
        let missing_active = chain_id(chains + 1);
        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(chains),
            &candidates,
            |b, candidates| {
                b.iter(|| {
                    discover(
                        black_box(candidates),
                        Some(missing_active.as_str()),
                        Some("0xowner"),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_discover);
criterion_main!(benches);
