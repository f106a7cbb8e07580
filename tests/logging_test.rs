//! Logger setup test
//!
//! Kept in its own test binary because the logger is process-wide.

use std::thread;

use reprod_diff::logging::init_logger;
use reprod_diff::Error;

#[test]
fn test_init_logger_writes_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..8)
        .map(|i| dir.path().join(format!("run{i}")).join("nested").join("diff.log"))
        .collect();

    // Racing initializers: exactly one wins and only its file is created.
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = paths
            .iter()
            .map(|p| s.spawn(move || init_logger(Some(p.as_path()))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<usize> = (0..results.len()).filter(|&i| results[i].is_ok()).collect();
    assert_eq!(winners.len(), 1);
    for (i, (result, path)) in results.iter().zip(&paths).enumerate() {
        if i == winners[0] {
            assert!(path.exists());
        } else {
            assert!(matches!(result, Err(Error::LoggerAlreadyInitialized)));
            assert!(!path.exists(), "{} was created by a losing call", path.display());
        }
    }

    let path = &paths[winners[0]];
    tracing::info!("layer1:\t0.005");
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("Init logger done!"));
    assert!(content.contains("layer1:"));

    let other = dir.path().join("second.log");
    let again = init_logger(Some(other.as_path()));
    assert!(matches!(again, Err(Error::LoggerAlreadyInitialized)));
    assert!(!other.exists());
}
