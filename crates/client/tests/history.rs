//! History browsing over records produced by real pipeline runs.

mod common;

use dungeon_client::GamePhase;
use game_core::Direction;

use common::TestWorld;

/// Drive a fresh game to its death, producing one history record.
async fn play_one_game_to_death(world: &TestWorld) {
    let mut pipeline = world.pipeline();
    pipeline.initialize().await.unwrap();
    world.survival.set_hp(world.player, 3);
    pipeline.move_to(Direction::Forward).await.unwrap();
    assert_eq!(pipeline.phase(), GamePhase::GameOver);
    pipeline.reset().await.unwrap();
}

#[tokio::test]
async fn empty_history_lists_nothing() {
    let world = TestWorld::new();
    let browser = world.browser();

    assert_eq!(browser.game_count().await.unwrap(), 0);
    assert!(browser.load_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn records_list_newest_first() {
    let world = TestWorld::new();
    play_one_game_to_death(&world).await;
    play_one_game_to_death(&world).await;

    let browser = world.browser();
    assert_eq!(browser.game_count().await.unwrap(), 2);

    let entries = browser.load_records().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].game_index, 1);
    assert_eq!(entries[1].game_index, 0);
    assert!(entries[0].record.timestamp >= entries[1].record.timestamp);
}

#[tokio::test]
async fn decrypt_entry_unlocks_confidential_fields() {
    let world = TestWorld::new();
    play_one_game_to_death(&world).await;

    let browser = world.browser();
    let mut entries = browser.load_records().await.unwrap();
    let entry = &mut entries[0];

    // Loading alone leaves the confidential fields locked.
    assert_eq!(entry.final_hp, None);
    assert_eq!(entry.final_potion_count, None);

    browser.decrypt_entry(entry).await.unwrap();

    // Died with all three starting potions unspent.
    assert_eq!(entry.final_hp, Some(0));
    assert_eq!(entry.final_potion_count, Some(3));
    assert_eq!(entry.record.rooms_explored, 2);
}

#[tokio::test]
async fn history_decrypts_use_their_own_signature_scope() {
    let world = TestWorld::new();
    play_one_game_to_death(&world).await;
    play_one_game_to_death(&world).await;
    let gameplay_prompts = world.signer.prompt_count();

    let browser = world.browser();
    let mut entries = browser.load_records().await.unwrap();
    for entry in &mut entries {
        browser.decrypt_entry(entry).await.unwrap();
    }

    // One extra prompt for the history scope, reused across every record.
    assert_eq!(world.signer.prompt_count(), gameplay_prompts + 1);
    assert!(entries.iter().all(|e| e.final_hp == Some(0)));
}

#[tokio::test]
async fn rejected_signature_leaves_entry_locked() {
    let world = TestWorld::new();
    play_one_game_to_death(&world).await;
    world.signer.set_reject(true);

    let browser = world.browser();
    let mut entries = browser.load_records().await.unwrap();

    // Rejection degrades, it does not fail the call.
    browser.decrypt_entry(&mut entries[0]).await.unwrap();
    assert_eq!(entries[0].final_hp, None);
    assert_eq!(entries[0].final_potion_count, None);
}
