//! Loading configuration and scripts from disk.

use std::io::Write;

use tempfile::NamedTempFile;
use timeline_trials::{Script, ScriptAction, TrialsConfig};
use trials_core::{Difficulty, PointKind, Timeline};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_config_file_round_trip_through_loader() {
    let file = write_temp(
        r#"
        [session]
        game_id = "morse"
        timeline = "past"
        duration = 45

        [clock]
        effects_period_ms = 33

        [rewards.past]
        score = 50
        "#,
    );

    let config = TrialsConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.session().game_id(), "morse");
    assert_eq!(*config.session().timeline(), Timeline::Past);
    assert_eq!(config.session().effective_duration().secs(), 45);
    assert_eq!(*config.clock().effects_period_ms(), 33);
    assert_eq!(*config.clock().countdown_period_ms(), 1000);
    assert_eq!(config.rewards().past().score, 50);

    let session = config.session_config(None);
    assert_eq!(session.game_id(), "morse");
    assert_eq!(session.duration().secs(), 45);
    assert_eq!(config.session_config(Some("forge")).game_id(), "forge");
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = TrialsConfig::load(Some(&missing)).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_malformed_config_is_an_error() {
    let file = write_temp("[session\ngame_id = 3\n");
    assert!(TrialsConfig::from_file(file.path()).is_err());
}

#[test]
fn test_empty_game_id_rejected() {
    let file = write_temp("[session]\ngame_id = \"  \"\n");
    let err = TrialsConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("game_id"));
}

#[test]
fn test_script_file_loads_in_order() {
    let file = write_temp(
        r#"
        difficulty = "hard"
        speed = 4.0

        [[events]]
        at_ms = 900
        kind = "miss"
        base_points = -5

        [[events]]
        at_ms = 100
        kind = "good"
        base_points = 10
        y = 2.0
        "#,
    );

    let script = Script::from_file(file.path()).unwrap();
    assert_eq!(*script.difficulty(), Some(Difficulty::Hard));
    assert_eq!(script.effective_speed(), 4.0);
    assert_eq!(
        script.events()[0].action().unwrap(),
        ScriptAction::Points {
            base_points: 10,
            x: 0.0,
            y: 2.0,
            kind: PointKind::Good,
        }
    );
    assert_eq!(*script.events()[1].at_ms(), 900);

    let session = script.session_config(&TrialsConfig::default());
    assert_eq!(session.duration().secs(), 20);
    assert_eq!(*session.difficulty(), Difficulty::Hard);
}
