//! Tandem demo: three simulated users typing into one shared document.
//!
//! Runs the scripted scenario against the causal-tree engine and prints what
//! every editor ends up showing. Pace is set with `TANDEM_REPLAY_SPEED`
//! (keystrokes per second), verbosity with `RUST_LOG`.

use log::info;

use tandem_collab::{
    lock_editor, CausalTreeFactory, CollabError, EditorGroup, IdAllocator, PlayerConfig,
    ScenarioPlayer,
};
use tandem_core::Editor;

const EDITOR_COUNT: usize = 3;

async fn run() -> Result<(), CollabError> {
    let config = PlayerConfig::from_env();
    info!("Replaying at one keystroke every {:?}", config.replay_step);

    let ids = IdAllocator::new();
    let group: EditorGroup<Editor> = EditorGroup::spawn(&CausalTreeFactory, &ids, EDITOR_COUNT)?;

    let player = ScenarioPlayer::new(config);
    let report = player.play_scenario(group.editors()).await?;
    info!(
        "Scenario finished: {} phases, {} keystrokes, {} sends",
        report.phases, report.keystrokes, report.sends
    );

    for editor in group.editors() {
        let proxy = lock_editor(editor)?;
        let state = proxy.state();
        println!(
            "editor {:>2} | cursor {:>2} | {:?}",
            proxy.editor_id().unwrap_or(-1),
            state.cursor_position,
            state.content
        );
        log::debug!("{}", proxy.to_json()?);
    }

    if group.is_converged()? {
        info!("All {EDITOR_COUNT} editors converged");
    } else {
        log::warn!("Editors diverged after the final broadcast");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Tandem demo...");

    if let Err(e) = run().await {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
