//! Scripted play through the headless host under paused tokio time.

use timeline_trials::{Script, ScriptEvent, TrialsConfig, play_script};
use trials_core::{PointKind, Status, Timeline};

fn nine_goods() -> Script {
    let events = (0..9)
        .map(|i| ScriptEvent::points(500 + i * 1000, PointKind::Good, 10))
        .collect();
    Script::with_events(events).with_duration(10.0)
}

#[tokio::test(start_paused = true)]
async fn test_nine_goods_survive_the_clock() {
    let config = TrialsConfig::default();
    let report = play_script(&config, &nine_goods()).await.unwrap();

    let outcome = report.outcome().as_ref().expect("finished");
    assert_eq!(outcome.status(), Status::Won);
    let completion = outcome.completion().expect("won");
    assert_eq!(completion.tally().time_left, 0);
    assert_eq!(*completion.rewards().life_bonus(), 150);
    assert!(!*completion.forced());
    assert_eq!(*report.final_snapshot().score(), *completion.score());

    assert_eq!(*report.ledger().completions(), 1);
    assert_eq!(report.submissions().len(), 1);
    assert_eq!(report.submissions()[0].score, *completion.score());
    assert_eq!(report.submissions()[0].duration, 10);
    assert_eq!(*report.final_snapshot().status(), Status::Won);
}

#[tokio::test(start_paused = true)]
async fn test_acceleration_keeps_the_outcome() {
    let config = TrialsConfig::default();
    let report = play_script(&config, &nine_goods().with_speed(20.0))
        .await
        .unwrap();

    let outcome = report.outcome().as_ref().expect("finished");
    let completion = outcome.completion().expect("won");
    assert_eq!(completion.tally().stats.total_actions(), &9);
    assert_eq!(completion.tally().lives, 3);
    assert_eq!(completion.tally().time_left, 0);
}

#[tokio::test(start_paused = true)]
async fn test_forced_win_reports_time_left() {
    let config = TrialsConfig::default();
    let script = Script::with_events(vec![
        ScriptEvent::points(200, PointKind::Perfect, 100),
        ScriptEvent::end_game_at(2500),
        ScriptEvent::points(2600, PointKind::Perfect, 100),
    ])
    .with_duration(20.0);

    let report = play_script(&config, &script).await.unwrap();
    let completion = report
        .outcome()
        .as_ref()
        .and_then(|o| o.completion())
        .expect("won");
    assert!(*completion.forced());
    assert_eq!(*completion.score(), 200);
    assert_eq!(completion.tally().time_left, 18);
    assert_eq!(*report.final_snapshot().score(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_three_criticals_lose_without_rewards() {
    let config = TrialsConfig::default();
    let script = Script::from_toml(
        r#"
        timeline = "future"
        duration = 30

        [[events]]
        at_ms = 100
        kind = "critical"

        [[events]]
        at_ms = 300
        kind = "critical"

        [[events]]
        at_ms = 200
        kind = "critical"

        [[events]]
        at_ms = 400
        kind = "perfect"
        base_points = 100
        "#,
    )
    .unwrap();

    let report = play_script(&config, &script).await.unwrap();
    let outcome = report.outcome().as_ref().expect("finished");
    assert_eq!(outcome.status(), Status::GameOver);
    assert!(outcome.completion().is_none());
    assert_eq!(outcome.score(), 0);
    assert!(report.submissions().is_empty());
    assert_eq!(*report.ledger().completions(), 0);
    assert_eq!(report.ledger().best_score(Timeline::Future, "trial"), None);
    assert_eq!(*report.final_snapshot().lives(), 0);
}
