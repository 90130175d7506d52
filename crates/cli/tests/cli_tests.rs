use caviar_cli::commands::clusters::{expected_clusters, mass};
use caviar_cli::commands::sample::{execute, SampleOptions};
use caviar_cli::read_similarity;
use caviar_core::{Error, SamplerConfig};
use caviar_cli::Commands;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn write_similarity(dir: &TempDir, rows: &str) -> std::path::PathBuf {
    let path = dir.path().join("similarity.json");
    fs::write(&path, rows).unwrap();
    path
}

fn options(randomize_permutation: bool) -> SampleOptions {
    SampleOptions {
        n_samples: 12,
        mass: 1.0,
        discount: 0.0,
        n_cores: 2,
        seed: 99,
        randomize_permutation,
    }
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_sample_output_shape_and_labels(#[case] randomize: bool) {
    let dir = TempDir::new().unwrap();
    let path = write_similarity(&dir, "[[1, 0.5, 0.1], [0.5, 1, 0.2], [0.1, 0.2, 1]]");
    let similarity = read_similarity(&path).unwrap();
    let output = execute(&similarity, &options(randomize)).unwrap();

    assert_eq!(output.n_items, 3);
    assert_eq!(output.labels.len(), 12);
    for (row, k) in output.labels.iter().zip(&output.n_clusters) {
        assert_eq!(row.len(), 3);
        assert_eq!(row[0], 1, "labels are one-based in first-appearance order");
        assert!(row.iter().all(|&l| l >= 1 && l <= *k));
    }
}

#[test]
fn test_sample_is_reproducible_for_a_seed() {
    let dir = TempDir::new().unwrap();
    let path = write_similarity(&dir, "[[1, 2], [2, 1]]");
    let similarity = read_similarity(&path).unwrap();
    let first = execute(&similarity, &options(true)).unwrap();
    let second = execute(&similarity, &options(true)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_non_square_similarity_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_similarity(&dir, "[[1, 2, 3], [2, 1, 0]]");
    assert!(matches!(
        read_similarity(&path),
        Err(Error::Dimension { .. })
    ));
}

#[test]
fn test_malformed_json_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_similarity(&dir, "not json");
    assert!(matches!(read_similarity(&path), Err(Error::Json { .. })));
}

#[test]
fn test_mass_calibration_round_trip() {
    let calibrated = mass(4.0, 0.1, 50).unwrap();
    assert!((calibrated.expected_clusters - 4.0).abs() < 1e-6);
    let forward = expected_clusters(calibrated.mass, 0.1, 50).unwrap();
    assert!((forward.expected_clusters - 4.0).abs() < 1e-6);
}

#[test]
fn test_commands_emit_json() {
    let config = SamplerConfig::default();
    let value = Commands::ExpectedClusters {
        mass: 1.0,
        items: 1,
        discount: 0.0,
    }
    .execute(&config)
    .unwrap();
    assert_eq!(value["expected_clusters"], serde_json::json!(1.0));
    assert_eq!(value["n_items"], serde_json::json!(1));
}
