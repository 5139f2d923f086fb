use std::{fs, path::PathBuf};
use tempfile::TempDir;
use vaporview_common::VaporConfigLoader;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
fn loads_file_with_env_expansion() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "1"
server:
  listen: "127.0.0.1:8080"
browser:
  webdriver_url: "${VV_TEST_WEBDRIVER}"
  headless: false
scrape:
  review_limit: 12
"#;
    let p = write_yaml(&tmp, "vaporview.yaml", file_yaml);

    temp_env::with_var("VV_TEST_WEBDRIVER", Some("http://driver-host:9515"), || {
        let config = VaporConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load service config");

        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.browser.webdriver_url, "http://driver-host:9515");
        assert!(!config.browser.headless);
        assert_eq!(config.scrape.review_limit, 12);
        // Untouched sections keep their defaults.
        assert_eq!(config.scrape.scroll_pause_secs, 3);
        assert_eq!(config.store.data_dir, PathBuf::from("./data"));
    });
}

#[test]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = VaporConfigLoader::new()
        .with_optional_file(tmp.path().join("nope.yaml"))
        .load()
        .expect("defaults without file");
    assert_eq!(config.server.listen, "0.0.0.0:10000");
    assert_eq!(config.scrape.review_limit, 5);
}
