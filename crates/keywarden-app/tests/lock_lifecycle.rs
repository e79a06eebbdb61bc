//! End-to-end lock lifecycle across the wired stores.
//!
//! Exercises the composition root the way a frontend would: unlock, load
//! state, then lock while calls are still in flight and verify the
//! caches wipe synchronously and the stragglers resolve into the void.

use keywarden_app::testing::{detail, overview, ScriptedVault};
use keywarden_app::{ItemId, TagId, VaultCore};
use keywarden_app::views::Tag;
use std::sync::Arc;
use std::time::Duration;

fn page(ids: &[i64]) -> Vec<keywarden_app::VaultItemOverview> {
    ids.iter().map(|id| overview(*id, &format!("item-{id}"))).collect()
}

#[tokio::test(start_paused = true)]
async fn lock_wipes_caches_and_strands_inflight_load() {
    let vault = Arc::new(ScriptedVault::new());
    vault.set_tags(vec![Tag {
        id: TagId(1),
        name: "work".into(),
        color: None,
    }]);
    vault.push_search(0, Ok(page(&[1, 2, 3])));
    vault.set_counts(3, 1);
    vault.add_detail(detail(2, "item-2"));

    let core = Arc::new(VaultCore::new(vault.clone()));
    core.init().await;
    core.mark_unlocked().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Steady state: items, counts, tags, detail cache, armed ticker.
    assert_eq!(core.items().state().items.len(), 3);
    assert_eq!(core.items().state().total_count, 3);
    assert_eq!(core.tags().tag_id_by_name("work"), Some(TagId(1)));
    core.items().item_details(ItemId(2)).await.unwrap();
    core.ticker().arm("JBSWY3DPEHPK3PXP", 30, 6);
    assert!(core.ticker().is_armed());

    // A reload goes out and is still in flight when the lock lands.
    vault.push_search(500, Ok(page(&[4, 5, 6])));
    let straggler = tokio::spawn({
        let core = core.clone();
        async move { core.items().load_items().await }
    });
    tokio::task::yield_now().await;
    assert!(core.items().state().is_loading);

    core.lock().await.unwrap();

    // The wipe is synchronous: nothing waited for the in-flight call.
    let state = core.items().state();
    assert!(core.gate().is_locked());
    assert!(state.items.is_empty());
    assert!(!state.is_loading);
    assert_eq!(state.total_count, 0);
    assert_eq!(core.tags().tag_id_by_name("work"), None);
    assert!(!core.ticker().is_armed());

    // The straggler resolves after the lock and is discarded.
    tokio::time::sleep(Duration::from_millis(600)).await;
    straggler.await.unwrap();
    let state = core.items().state();
    assert!(state.items.is_empty());
    assert!(!state.is_loading);

    // Cached details died with the lock: reading them again while
    // locked is refused rather than served stale.
    assert!(core.items().item_details(ItemId(2)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn failed_lock_command_leaves_state_intact() {
    let vault = Arc::new(ScriptedVault::new());
    vault.push_search(0, Ok(page(&[1, 2])));

    let core = VaultCore::new(vault.clone());
    core.mark_unlocked().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(core.items().state().items.len(), 2);

    vault.fail_next_lock("backend busy");
    assert!(core.lock().await.is_err());

    // No optimistic clearing: the UI retries the lock instead.
    assert!(!core.gate().is_locked());
    assert_eq!(core.items().state().items.len(), 2);

    // The retry succeeds and wipes.
    core.lock().await.unwrap();
    assert!(core.gate().is_locked());
    assert!(core.items().state().items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn settings_survive_lock_and_pending_save_flushes() {
    let vault = Arc::new(ScriptedVault::new());
    let core = VaultCore::new(vault.clone());
    core.init().await;
    core.mark_unlocked().await;

    // First-run init persisted the defaults once.
    assert_eq!(vault.saved_settings().len(), 1);

    core.settings().update(|s| s.general.language = "de".into());
    core.lock().await.unwrap();

    // Settings are not gated state; memory keeps the mutation and the
    // debounced save still lands.
    assert_eq!(core.settings().settings().general.language, "de");
    tokio::time::sleep(Duration::from_millis(600)).await;
    let saved = vault.saved_settings();
    assert_eq!(saved.len(), 2);
    assert!(saved[1].contains("\"de\""));
}

#[tokio::test(start_paused = true)]
async fn relock_after_unlock_reload_cycle() {
    let vault = Arc::new(ScriptedVault::new());
    vault.push_search(0, Ok(page(&[1])));

    let core = VaultCore::new(vault.clone());
    core.mark_unlocked().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(core.items().state().items.len(), 1);

    core.lock().await.unwrap();
    assert!(core.items().state().items.is_empty());

    // Second session: unlock warms the index again.
    vault.push_search(0, Ok(page(&[1, 2])));
    core.mark_unlocked().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(core.items().state().items.len(), 2);
}
