//! End-to-end demo runs with the causal-tree engine.

use tandem_collab::{
    lock_editor, CausalTreeFactory, EditorGroup, IdAllocator, PlayerConfig, ScenarioPlayer,
    DEMO_SCENARIO,
};
use tandem_core::{Editor, Moment};
use tokio::time::{timeout, Duration};

fn demo_group() -> EditorGroup<Editor> {
    EditorGroup::spawn(&CausalTreeFactory, &IdAllocator::new(), 3).unwrap()
}

#[tokio::test]
async fn test_phases_step_by_step() {
    let group = demo_group();
    let player = ScenarioPlayer::new(PlayerConfig::instant());

    player.play_phases(group.editors(), &DEMO_SCENARIO[0..1]).await.unwrap();
    assert_eq!(group.contents().unwrap(), vec!["Rust"; 3]);

    player.play_phases(group.editors(), &DEMO_SCENARIO[1..2]).await.unwrap();
    assert_eq!(group.contents().unwrap(), vec!["Rust wasm Js"; 3]);

    player.play_phases(group.editors(), &DEMO_SCENARIO[2..3]).await.unwrap();
    assert_eq!(group.contents().unwrap(), vec!["Rust Wasm\nJS"; 3]);
    assert!(group.is_converged().unwrap());
}

#[tokio::test]
async fn test_cursors_after_demo() {
    let group = demo_group();
    let player = ScenarioPlayer::new(PlayerConfig::instant());
    player.play_scenario(group.editors()).await.unwrap();

    let positions: Vec<usize> = group
        .editors()
        .iter()
        .map(|editor| lock_editor(editor).unwrap().cursor_position())
        .collect();
    assert_eq!(positions, vec![6, 12, 10]);

    // Editor 0 typed the 'W' last and sits right after it.
    let first = lock_editor(&group.editors()[0]).unwrap();
    assert_eq!(first.cursor_moment().editor_id, 0);
}

#[tokio::test]
async fn test_untouched_editors_keep_cursor_at_origin() {
    let group = demo_group();
    let player = ScenarioPlayer::new(PlayerConfig::instant());
    player.play_phases(group.editors(), &DEMO_SCENARIO[0..1]).await.unwrap();

    let second = lock_editor(&group.editors()[1]).unwrap();
    assert_eq!(second.cursor_position(), 0);
    let origin = Moment {
        editor_id: -1,
        timestamp: 0,
    };
    assert_eq!(second.cursor_moment(), origin);
}

#[tokio::test]
async fn test_clear_then_replay() {
    let group = demo_group();
    let player = ScenarioPlayer::new(PlayerConfig::instant());
    player.play_scenario(group.editors()).await.unwrap();

    group.clear_contents().unwrap();
    assert_eq!(group.contents().unwrap(), vec![""; 3]);

    player.play_phases(group.editors(), &DEMO_SCENARIO[0..1]).await.unwrap();
    assert_eq!(group.contents().unwrap(), vec!["Rust"; 3]);
}

#[tokio::test]
async fn test_paced_playback_finishes() {
    let group = demo_group();
    let player = ScenarioPlayer::new(PlayerConfig {
        replay_step: Duration::from_millis(1),
    });
    let result = timeout(
        Duration::from_secs(5),
        player.play_keyboard_sequence(&group.editors()[2], "Js"),
    )
    .await;
    assert_eq!(result.unwrap().unwrap(), 2);
    assert_eq!(lock_editor(&group.editors()[2]).unwrap().content(), "Js");
}
