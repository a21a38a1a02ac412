//! K-Means clustering model implementation

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::ExplorerError;

/// Parameters of a k-means fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansSettings {
    /// Seed for centroid initialization
    pub seed: u64,
    /// Number of independent initializations; the best inertia wins
    pub n_runs: usize,
    /// Maximum iterations per run
    pub max_iters: u64,
    /// Convergence tolerance
    pub tolerance: f64,
}

impl Default for KMeansSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            n_runs: 10,
            max_iters: 300,
            tolerance: 1e-4,
        }
    }
}

/// K-Means fit result
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignment per input row, in input order
    pub labels: Array1<usize>,
    /// Cluster centroids
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl KMeansModel {
    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Fit K-Means on a dense feature matrix
///
/// # Arguments
/// * `records` - One row per observation, no missing values
/// * `n_clusters` - Number of clusters
/// * `settings` - Seed, restart count and convergence criteria
///
/// # Errors
/// Zero clusters, or fewer rows than clusters.
pub fn fit_kmeans(
    records: &Array2<f64>,
    n_clusters: usize,
    settings: &KMeansSettings,
) -> crate::Result<KMeansModel> {
    if n_clusters == 0 {
        return Err(ExplorerError::InvalidClusterCount { n_clusters });
    }

    if records.nrows() < n_clusters {
        return Err(ExplorerError::TooFewRows {
            rows: records.nrows(),
            n_clusters,
        });
    }

    // Create dataset for linfa
    let n_samples = records.nrows();
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(records.clone(), targets);

    let rng = StdRng::seed_from_u64(settings.seed);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(settings.n_runs)
        .max_n_iterations(settings.max_iters)
        .tolerance(settings.tolerance)
        .fit(&dataset)?;

    let labels = model.predict(&dataset);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(records, &labels, &centroids);

    debug!(n_clusters, n_samples, inertia, "k-means fitted");

    Ok(KMeansModel {
        n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            inertia += point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }

    inertia
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Array2<f64> {
        Array2::from_shape_vec(
            (6, 2),
            vec![
                0.0, 0.0, //
                0.1, 0.0, //
                0.0, 0.1, //
                10.0, 10.0, //
                10.1, 10.0, //
                10.0, 10.1,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_kmeans() {
        let model = fit_kmeans(&two_blobs(), 2, &KMeansSettings::default()).unwrap();

        assert_eq!(model.n_clusters, 2);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.shape(), &[2, 2]);
        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[0], model.labels[2]);
        assert_eq!(model.labels[3], model.labels[4]);
        assert_ne!(model.labels[0], model.labels[3]);
    }

    #[test]
    fn test_cluster_sizes() {
        let model = fit_kmeans(&two_blobs(), 2, &KMeansSettings::default()).unwrap();

        let sizes = model.cluster_sizes();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes.iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_model_inertia() {
        let model = fit_kmeans(&two_blobs(), 2, &KMeansSettings::default()).unwrap();
        assert!(model.inertia >= 0.0);
        assert!(model.inertia.is_finite());
        assert!(model.inertia < 1.0);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let settings = KMeansSettings::default();
        let a = fit_kmeans(&two_blobs(), 3, &settings).unwrap();
        let b = fit_kmeans(&two_blobs(), 3, &settings).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let settings = KMeansSettings::default();

        let result = fit_kmeans(&two_blobs(), 0, &settings);
        assert!(matches!(result, Err(ExplorerError::InvalidClusterCount { .. })));

        let result = fit_kmeans(&two_blobs(), 7, &settings);
        assert!(matches!(
            result,
            Err(ExplorerError::TooFewRows { rows: 6, n_clusters: 7 })
        ));
    }
}
