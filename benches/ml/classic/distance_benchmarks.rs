use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use exprclust::{build_dendrogram, compute_distances, gaussian_blobs, Linkage, Metric};

fn bench_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_distances");
    for &n in &[50, 200] {
        let data = gaussian_blobs(&[vec![0.0; 100], vec![3.0; 100]], n / 2, 1.0, 1).unwrap();
        for metric in [Metric::Euclidean, Metric::Correlation] {
            group.bench_with_input(
                BenchmarkId::new(format!("{metric:?}"), n),
                &data,
                |b, data| b.iter(|| compute_distances(black_box(data), metric).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_dendrogram(c: &mut Criterion) {
    let data = gaussian_blobs(&[vec![0.0; 20], vec![3.0; 20]], 50, 1.0, 1).unwrap();
    let distances = compute_distances(&data, Metric::Euclidean).unwrap();
    c.bench_function("build_dendrogram_average_100", |b| {
        b.iter(|| build_dendrogram(black_box(&distances), Linkage::Average).unwrap())
    });
}

criterion_group!(benches, bench_distances, bench_dendrogram);
criterion_main!(benches);
