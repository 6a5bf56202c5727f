use gwn_core::setup_logger;
use tempfile::tempdir;

#[test]
fn setup_logger_creates_log_file_and_is_repeatable() {
    let dir = tempdir().unwrap();
    let outdir = dir.path().join("outdir");
    setup_logger(Some(&outdir), "GW150914", "info").unwrap();
    setup_logger(Some(&outdir), "GW150914", "debug").unwrap();
    assert!(outdir.join("GW150914.log").exists());
}
