//! Loading, configuration, preview and shared use of a built engine

use std::io::Write;
use std::sync::Arc;

use channel_finder::preview::parse_sections;
use channel_finder::{
    ChannelFinder, ChannelFinderConfig, EngineError, PreviewOptions, SchemaError, Selections,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/optional_levels.json");

fn finder() -> ChannelFinder {
    ChannelFinder::from_path(FIXTURE).expect("fixture loads")
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn loads_definition_named_by_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(FIXTURE, dir.path().join("db.json")).unwrap();

    let config_path = dir.path().join("channel_finder.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "database:\n  path: db.json\nfilters:\n  device_level: device").unwrap();

    let config = ChannelFinderConfig::from_file(&config_path).unwrap();
    let finder = ChannelFinder::from_config(&config).unwrap();
    assert!(finder.validate("CTRL:MAIN:MC-02:Heartbeat"));

    let sel = Selections::from([
        ("system", "CTRL"),
        ("subsystem", "MAIN"),
        ("device", "*"),
        ("signal", "Heartbeat"),
    ]);
    assert_eq!(
        finder.build_addresses(&sel, None, Some(&[2, 3])).unwrap(),
        vec!["CTRL:MAIN:MC-02:Heartbeat", "CTRL:MAIN:MC-03:Heartbeat"]
    );
}

#[test]
fn config_without_database_path_fails() {
    let config = ChannelFinderConfig::from_yaml("preview:\n  depth: 2\n").unwrap();
    assert!(matches!(
        ChannelFinder::from_config(&config),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn malformed_definition_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{
            "hierarchy": {"levels": [{"name": "system"}, {"name": "signal"}]},
            "tree": {"SYS": {"children": {"A": 42}}}
        }"#,
    )
    .unwrap();

    assert!(matches!(
        ChannelFinder::from_path(&path),
        Err(SchemaError::MalformedEntry { path, .. }) if path == "SYS/A"
    ));
}

#[test]
fn terminal_level_must_be_required() {
    let json = r#"{
        "hierarchy": {"levels": [{"name": "system"}, {"name": "signal", "optional": true}]},
        "tree": {}
    }"#;
    assert!(matches!(
        ChannelFinder::from_json_str(json),
        Err(SchemaError::OptionalTerminalLevel(level)) if level == "signal"
    ));
}

// =============================================================================
// PREVIEW
// =============================================================================

#[test]
fn preview_tree_respects_depth_and_items() {
    let finder = finder();
    let options = PreviewOptions {
        depth: 3,
        max_items: 2,
        ..PreviewOptions::default()
    };
    let text = finder.preview(&options);

    assert!(text.contains("Hierarchy Tree: (root)"));
    assert!(text.contains("━━ CTRL (1)"));
    assert!(text.contains("━━ MC-01"));
    assert!(text.contains("... 1 more"));
    assert!(!text.contains("Heartbeat"));
    assert!(text.contains("--depth -1"));
    assert!(!text.contains("Hierarchy Level Statistics"));
}

#[test]
fn preview_full_shows_everything() {
    let finder = finder();
    let options = PreviewOptions::default().full();
    let text = finder.preview(&options);

    assert!(text.contains("━━ Mode [RB, SP]"));
    assert!(text.contains("━━ Temperature"));
    assert!(!text.contains("more"));
    assert!(!text.contains("--depth -1"));
}

#[test]
fn preview_focus_and_sections() {
    let finder = finder();
    let options = PreviewOptions {
        focus: Some("CTRL:MAIN:MC-02".to_string()),
        sections: parse_sections("all").unwrap(),
        ..PreviewOptions::default().full()
    };
    let text = finder.preview(&options);

    assert!(text.contains("Focus Path   CTRL:MAIN:MC-02"));
    assert!(text.contains("Hierarchy Tree: CTRL:MAIN:MC-02"));
    assert!(text.contains("Hierarchy Level Statistics"));
    assert!(text.contains("Channel Count Breakdown"));
    assert!(text.contains("Sample Channels"));
    assert!(text.contains("CTRL:MAIN:MC-02:PSU:Voltage"));
    assert!(!text.contains("CTRL:MAIN:MC-01:"));
}

#[test]
fn preview_unknown_focus_is_reported() {
    let finder = finder();
    let options = PreviewOptions {
        focus: Some("NOPE".to_string()),
        ..PreviewOptions::default()
    };
    assert!(finder
        .preview(&options)
        .contains("Focus path 'NOPE' not found"));
}

// =============================================================================
// SHARED READERS
// =============================================================================

#[test]
fn concurrent_readers_share_one_engine() {
    let finder = Arc::new(finder());
    let devices = ["MC-01", "MC-02", "MC-03"];

    std::thread::scope(|scope| {
        for device in devices {
            let finder = Arc::clone(&finder);
            scope.spawn(move || {
                for _ in 0..50 {
                    let sel = Selections::from([
                        ("system", "CTRL"),
                        ("subsystem", "MAIN"),
                        ("device", device),
                    ]);
                    let options = finder.list_children("subdevice", &sel).unwrap();
                    assert_eq!(options.len(), 4);

                    let built = finder
                        .build_addresses(&sel.with("signal", "Mode"), None, None)
                        .unwrap();
                    assert_eq!(built.len(), 3);
                    assert!(built.iter().all(|a| finder.validate(a)));
                }
            });
        }
    });
}
