use lbsim::config::SimConfig;
use lbsim::worker::OccupancyPolicy;
use std::io::Write;

// All environment manipulation lives in this one test so parallel tests in
// this binary never observe each other's variables.
#[test]
fn config_env_overrides_and_errors() {
    unsafe {
        std::env::set_var("LBSIM_WORKERS", "6");
        std::env::set_var("LBSIM_RUNTIME", "250");
        std::env::set_var("LBSIM_POLICY", "busy-until-finish");
        std::env::set_var("LBSIM_SEED", "17");
    }

    let config = SimConfig::from_env().unwrap();
    assert_eq!(config.workers, 6);
    assert_eq!(config.runtime, 250);
    assert_eq!(config.policy, OccupancyPolicy::BusyUntilFinish);
    assert_eq!(config.seed, Some(17));
    assert!(!config.log_level.is_empty());

    unsafe {
        std::env::set_var("LBSIM_WORKERS", "many");
    }
    assert!(SimConfig::from_env().is_err());

    // Clean up
    unsafe {
        std::env::remove_var("LBSIM_WORKERS");
        std::env::remove_var("LBSIM_RUNTIME");
        std::env::remove_var("LBSIM_POLICY");
        std::env::remove_var("LBSIM_SEED");
    }
}

#[test]
fn config_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
workers = 4
runtime = 1200
min_duration = 5
max_duration = 9
arrival_probability = 0.25
log_file = "out/sim.log"
"#
    )
    .unwrap();

    let config = SimConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.workers, 4);
    assert_eq!(config.runtime, 1200);
    assert_eq!(config.min_duration, 5);
    assert_eq!(config.max_duration, 9);
    assert_eq!(config.arrival_probability, 0.25);
    assert_eq!(config.log_file, std::path::PathBuf::from("out/sim.log"));
    config.validate().unwrap();
}

#[test]
fn config_from_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = SimConfig::from_toml_file(&dir.path().join("absent.toml"));
    assert!(result.is_err());
}
