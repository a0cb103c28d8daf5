use exprclust::{
    build_dendrogram, compute_distances, gaussian_blobs, select_best_partition, silhouette,
    Linkage, Metric, SelectionConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Three groups of 20 "patients" over 5 "genes".
    let centers = vec![
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
        vec![4.0, 4.0, 0.0, 0.0, 2.0],
        vec![0.0, 4.0, 4.0, 4.0, 0.0],
    ];
    let labels: Vec<String> = (0..60).map(|i| format!("patient-{i:02}")).collect();
    let data = gaussian_blobs(&centers, 20, 1.0, 2024)?.with_labels(labels)?;
    println!(
        "{} observations x {} features",
        data.n_observations(),
        data.n_features()
    );

    let distances = compute_distances(&data, Metric::Euclidean)?;
    println!("max pairwise distance: {:.3}", distances.max());

    let tree = build_dendrogram(&distances, Linkage::Complete)?;
    let heights = tree.heights();
    let top: Vec<String> = heights.iter().rev().take(5).map(|h| format!("{h:.3}")).collect();
    println!("top merge heights: {}", top.join(", "));

    let config = SelectionConfig::new(vec![2, 4, 7]).with_restarts(25).with_seed(1);
    let chosen = select_best_partition(&data, &config)?;
    for candidate in chosen.report().candidates() {
        println!(
            "k={} wcss={:.3} {}={:.3}",
            candidate.k,
            candidate.total_within_ss,
            chosen.report().criterion(),
            candidate.score
        );
    }
    println!("selected k={} sizes={:?}", chosen.k(), chosen.cluster_sizes());

    let widths = silhouette(&distances, chosen.labels())?;
    println!("mean silhouette width: {:.3}", widths.mean());

    if let Some(pairs) = chosen.labelled() {
        for (id, cluster) in pairs.iter().take(5) {
            println!("{id}\t{cluster}");
        }
    }
    Ok(())
}
