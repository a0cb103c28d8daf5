use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use exprclust::{gaussian_blobs, kmeans, select_best_partition, KMeansConfig, SelectionConfig};

fn centers(k: usize, dims: usize) -> Vec<Vec<f64>> {
    (0..k)
        .map(|c| (0..dims).map(|d| ((c * 7 + d * 3) % 11) as f64).collect())
        .collect()
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    for &n in &[100, 1000] {
        let data = gaussian_blobs(&centers(4, 20), n / 4, 1.0, 1).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            let config = KMeansConfig::new(4).with_restarts(10);
            b.iter(|| kmeans(black_box(data), &config).unwrap())
        });
    }
    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let data = gaussian_blobs(&centers(3, 50), 40, 1.0, 2).unwrap();
    let config = SelectionConfig::new(vec![2, 4, 7]).with_restarts(10);
    c.bench_function("select_best_partition", |b| {
        b.iter(|| select_best_partition(black_box(&data), &config).unwrap())
    });
}

criterion_group!(benches, bench_kmeans, bench_selection);
criterion_main!(benches);
