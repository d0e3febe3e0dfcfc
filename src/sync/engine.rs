//! Orchestration of mutating operations against the remote store.
//!
//! Every operation follows the same protocol: issue the remote request from
//! a spawned task, deliver the outcome back to the event loop as a
//! [`SyncEvent`], and fold it into the cache and overlay there via
//! [`SyncEngine::apply`]. State is only ever touched on the event loop, so
//! the engine needs no locks, and overlapping operations interleave only at
//! network and timer boundaries.
//!
//! Operations on the same key are not serialized against each other. Two
//! overlapping mutations each trigger their own reload, and whichever
//! reload resolves last determines the final cache. That race is accepted:
//! every reload is a full snapshot of the remote truth, so the cache can
//! lag but never drift.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::store::{Item, ItemPatch, NewItem, RemoteStore, StoreError};

use super::cache::ItemCache;
use super::overlay::{OverlayState, Phase};

/// How long a freshly created item keeps its creation flash.
pub const CREATED_FLASH: Duration = Duration::from_millis(2000);

/// How long a delete is announced in the list before the request is sent.
pub const DELETE_DELAY: Duration = Duration::from_millis(1200);

/// A failed operation, as surfaced to the user.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("failed to load items: {0}")]
  Load(#[source] StoreError),
  #[error("failed to save change: {0}")]
  Mutation(#[source] StoreError),
}

/// Outcome of a spawned task, delivered back to the event loop.
#[derive(Debug)]
pub enum SyncEvent {
  ReloadFinished(Result<Vec<Item>, StoreError>),
  CreateFinished(Result<Option<String>, StoreError>),
  UpdateFinished(Result<(), StoreError>),
  DeleteFinished {
    key: String,
    result: Result<(), StoreError>,
  },
  /// A visual-phase timer ran out. Honored only while the phase still
  /// matches what the timer was scheduled for.
  OverlayExpired { key: String, phase: Phase },
}

/// Drives create/edit/toggle/delete against the store and keeps the cache
/// and overlay in step with the outcomes.
pub struct SyncEngine<S> {
  store: Arc<S>,
  tx: mpsc::UnboundedSender<SyncEvent>,
  /// Operations whose outcome has not been applied yet.
  in_flight: usize,
  /// Single message slot; each new operation clears it, each failure
  /// replaces it.
  last_error: Option<SyncError>,
}

impl<S: RemoteStore> SyncEngine<S> {
  pub fn new(store: S, tx: mpsc::UnboundedSender<SyncEvent>) -> Self {
    Self {
      store: Arc::new(store),
      tx,
      in_flight: 0,
      last_error: None,
    }
  }

  /// Whether any operation is still waiting on the store or a timer.
  pub fn is_loading(&self) -> bool {
    self.in_flight > 0
  }

  /// The last error, until the next operation starts.
  pub fn last_error(&self) -> Option<&SyncError> {
    self.last_error.as_ref()
  }

  /// Replace the cache with a fresh read of the whole collection.
  pub fn reload(&mut self) {
    self.begin();
    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = store.fetch_all().await;
      let _ = tx.send(SyncEvent::ReloadFinished(result));
    });
  }

  /// Create a new unchecked item. Empty input is a no-op.
  pub fn create_item(&mut self, text: &str) {
    if text.trim().is_empty() {
      return;
    }
    self.begin();
    let item = NewItem::new(text);
    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = store.create(&item).await;
      let _ = tx.send(SyncEvent::CreateFinished(result));
    });
  }

  /// Change an item's text. Absent items, empty input, and unchanged text
  /// are no-ops; nothing is shown optimistically, the new text appears
  /// with the reload that follows a successful update.
  pub fn edit_item(&mut self, cache: &ItemCache, key: &str, new_text: &str) {
    let Some(item) = cache.find(key) else {
      return;
    };
    if new_text.trim().is_empty() || new_text == item.text {
      return;
    }
    self.begin();
    self.spawn_update(key, ItemPatch::text(new_text));
  }

  /// Flip an item's checked flag. Absent items are no-ops.
  pub fn toggle_item(&mut self, cache: &ItemCache, key: &str) {
    let Some(item) = cache.find(key) else {
      return;
    };
    self.begin();
    self.spawn_update(key, ItemPatch::checked(!item.checked));
  }

  /// Flag an item as deleting, then delete it after [`DELETE_DELAY`].
  ///
  /// The flag is visible before any network traffic. The delay is not
  /// cancellable: later actions on the key do not stop the delete.
  pub fn delete_item(&mut self, overlay: &mut OverlayState, key: &str) {
    overlay.set(key, Phase::Deleting);
    self.begin();
    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    let key = key.to_string();
    tokio::spawn(async move {
      sleep(DELETE_DELAY).await;
      let result = store.delete(&key).await;
      let _ = tx.send(SyncEvent::DeleteFinished { key, result });
    });
  }

  /// Fold a finished task back into the shared state.
  pub fn apply(&mut self, event: SyncEvent, cache: &mut ItemCache, overlay: &mut OverlayState) {
    match event {
      SyncEvent::ReloadFinished(Ok(items)) => {
        self.finish();
        debug!(count = items.len(), "reloaded");
        cache.replace(items);
      }
      SyncEvent::ReloadFinished(Err(e)) => {
        // Stale data beats no data: the previous snapshot stays up.
        self.fail(SyncError::Load(e));
      }
      SyncEvent::CreateFinished(Ok(Some(key))) => {
        self.finish();
        overlay.set(key.clone(), Phase::Created);
        self.schedule_expiry(key, Phase::Created, CREATED_FLASH);
        self.reload();
      }
      SyncEvent::CreateFinished(Ok(None)) => {
        // Store accepted the item but returned no key; skip the flash.
        self.finish();
        self.reload();
      }
      SyncEvent::CreateFinished(Err(e)) => self.fail(SyncError::Mutation(e)),
      SyncEvent::UpdateFinished(Ok(())) => {
        self.finish();
        self.reload();
      }
      SyncEvent::UpdateFinished(Err(e)) => self.fail(SyncError::Mutation(e)),
      SyncEvent::DeleteFinished {
        key,
        result: Ok(()),
      } => {
        self.finish();
        overlay.clear(&key);
        self.reload();
      }
      SyncEvent::DeleteFinished {
        key,
        result: Err(e),
      } => {
        // The item stays in the cache and drops back to its normal look.
        overlay.clear(&key);
        self.fail(SyncError::Mutation(e));
      }
      SyncEvent::OverlayExpired { key, phase } => {
        overlay.clear_if(&key, phase);
      }
    }
  }

  fn spawn_update(&self, key: &str, patch: ItemPatch) {
    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    let key = key.to_string();
    tokio::spawn(async move {
      let result = store.update(&key, &patch).await;
      let _ = tx.send(SyncEvent::UpdateFinished(result));
    });
  }

  fn schedule_expiry(&self, key: String, phase: Phase, after: Duration) {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      sleep(after).await;
      let _ = tx.send(SyncEvent::OverlayExpired { key, phase });
    });
  }

  fn begin(&mut self) {
    self.in_flight += 1;
    self.last_error = None;
  }

  fn finish(&mut self) {
    self.in_flight = self.in_flight.saturating_sub(1);
  }

  fn fail(&mut self, error: SyncError) {
    self.finish();
    warn!(%error, "sync operation failed");
    self.last_error = Some(error);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sync::present;
  use async_trait::async_trait;
  use reqwest::{Method, StatusCode};
  use std::collections::BTreeMap;
  use std::sync::Mutex;
  use tokio::time::{advance, timeout};

  #[derive(Default)]
  struct StoreState {
    items: BTreeMap<String, (String, bool)>,
    next_key: u32,
    fail_fetch: bool,
    fail_create: bool,
    fail_update: bool,
    fail_delete: bool,
    /// Create succeeds but the response carries no generated key.
    withhold_key: bool,
    calls: Vec<String>,
  }

  /// In-memory stand-in for the HTTP store, with scriptable failures.
  #[derive(Clone, Default)]
  struct ScriptedStore {
    state: Arc<Mutex<StoreState>>,
  }

  impl ScriptedStore {
    fn seed(&self, key: &str, text: &str, checked: bool) {
      self
        .state
        .lock()
        .unwrap()
        .items
        .insert(key.to_string(), (text.to_string(), checked));
    }

    fn items(&self) -> Vec<Item> {
      self
        .state
        .lock()
        .unwrap()
        .items
        .iter()
        .map(|(key, (text, checked))| Item {
          key: key.clone(),
          text: text.clone(),
          checked: *checked,
        })
        .collect()
    }

    fn calls(&self) -> Vec<String> {
      self.state.lock().unwrap().calls.clone()
    }

    fn set(&self, f: impl FnOnce(&mut StoreState)) {
      f(&mut self.state.lock().unwrap());
    }
  }

  fn rejected(method: Method) -> StoreError {
    StoreError::Status {
      method,
      path: "/todos.json".to_string(),
      status: StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  #[async_trait]
  impl RemoteStore for ScriptedStore {
    async fn fetch_all(&self) -> Result<Vec<Item>, StoreError> {
      let failed = {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_all".to_string());
        state.fail_fetch
      };
      if failed {
        return Err(rejected(Method::GET));
      }
      Ok(self.items())
    }

    async fn create(&self, item: &NewItem) -> Result<Option<String>, StoreError> {
      let mut state = self.state.lock().unwrap();
      state.calls.push(format!("create {}", item.text));
      if state.fail_create {
        return Err(rejected(Method::POST));
      }
      state.next_key += 1;
      let key = format!("x{}", state.next_key);
      state
        .items
        .insert(key.clone(), (item.text.clone(), item.checked));
      if state.withhold_key {
        return Ok(None);
      }
      Ok(Some(key))
    }

    async fn update(&self, key: &str, patch: &ItemPatch) -> Result<(), StoreError> {
      let mut state = self.state.lock().unwrap();
      state.calls.push(format!(
        "update {key} {}",
        serde_json::to_string(patch).unwrap()
      ));
      if state.fail_update {
        return Err(rejected(Method::PATCH));
      }
      if let Some(entry) = state.items.get_mut(key) {
        if let Some(text) = &patch.text {
          entry.0 = text.clone();
        }
        if let Some(checked) = patch.checked {
          entry.1 = checked;
        }
      }
      Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
      let mut state = self.state.lock().unwrap();
      state.calls.push(format!("delete {key}"));
      if state.fail_delete {
        return Err(rejected(Method::DELETE));
      }
      state.items.remove(key);
      Ok(())
    }
  }

  struct Rig {
    engine: SyncEngine<ScriptedStore>,
    rx: mpsc::UnboundedReceiver<SyncEvent>,
    cache: ItemCache,
    overlay: OverlayState,
    store: ScriptedStore,
  }

  impl Rig {
    fn new() -> Self {
      let store = ScriptedStore::default();
      let (tx, rx) = mpsc::unbounded_channel();
      Self {
        engine: SyncEngine::new(store.clone(), tx),
        rx,
        cache: ItemCache::new(),
        overlay: OverlayState::new(),
        store,
      }
    }

    /// Apply events until the queue stays quiet. Pending timers further out
    /// than the quiet window are left for the test to advance into.
    async fn settle(&mut self) {
      while let Ok(Some(event)) = timeout(Duration::from_millis(50), self.rx.recv()).await {
        self
          .engine
          .apply(event, &mut self.cache, &mut self.overlay);
      }
    }

    async fn load(&mut self) {
      self.engine.reload();
      self.settle().await;
    }

    fn error_message(&self) -> Option<String> {
      self.engine.last_error().map(|e| e.to_string())
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_reload_replaces_cache() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.store.seed("b", "wash car", true);

    rig.load().await;

    assert_eq!(rig.cache.all(), rig.store.items().as_slice());
    assert!(!rig.engine.is_loading());
    assert!(rig.error_message().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_reload_keeps_previous_cache() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;

    rig.store.set(|s| s.fail_fetch = true);
    rig.engine.reload();
    rig.settle().await;

    assert_eq!(rig.cache.all().len(), 1);
    assert!(rig.cache.find("a").is_some());
    let message = rig.error_message().expect("load error surfaced");
    assert!(message.contains("load"));
    assert!(!rig.engine.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_empty_create_is_a_noop() {
    let mut rig = Rig::new();

    rig.engine.create_item("");
    rig.engine.create_item("   ");
    rig.settle().await;

    assert!(rig.store.calls().is_empty());
    assert!(rig.cache.all().is_empty());
    assert!(!rig.engine.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_create_flashes_then_settles() {
    let mut rig = Rig::new();

    rig.engine.create_item("wash car");
    rig.settle().await;

    // Flash is up immediately after the create resolves, and the reload
    // has already brought the item into the cache.
    assert_eq!(rig.overlay.get("x1"), Some(Phase::Created));
    assert_eq!(rig.cache.find("x1").map(|i| i.text.as_str()), Some("wash car"));

    advance(CREATED_FLASH).await;
    rig.settle().await;

    assert_eq!(rig.overlay.get("x1"), None);
    assert_eq!(rig.cache.all(), rig.store.items().as_slice());
  }

  #[tokio::test(start_paused = true)]
  async fn test_create_without_key_skips_flash() {
    let mut rig = Rig::new();
    rig.store.set(|s| s.withhold_key = true);

    rig.engine.create_item("wash car");
    rig.settle().await;

    assert_eq!(rig.overlay.get("x1"), None);
    assert_eq!(rig.cache.all().len(), 1);
    assert!(rig.error_message().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_create_leaves_cache_untouched() {
    let mut rig = Rig::new();
    rig.store.set(|s| s.fail_create = true);

    rig.engine.create_item("wash car");
    rig.settle().await;

    assert!(rig.cache.all().is_empty());
    assert_eq!(rig.overlay.get("x1"), None);
    assert!(rig.error_message().is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_edit_noops_issue_no_request() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;
    let loads_so_far = rig.store.calls().len();

    rig.engine.edit_item(&rig.cache, "missing", "whatever");
    rig.engine.edit_item(&rig.cache, "a", "");
    rig.engine.edit_item(&rig.cache, "a", "buy milk");
    rig.settle().await;

    assert_eq!(rig.store.calls().len(), loads_so_far);
    assert!(!rig.engine.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_edit_appears_after_reload() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;

    rig.engine.edit_item(&rig.cache, "a", "buy bread");
    rig.settle().await;

    assert_eq!(rig.cache.find("a").map(|i| i.text.as_str()), Some("buy bread"));
    assert_eq!(rig.cache.all(), rig.store.items().as_slice());
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_edit_changes_nothing() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;

    rig.store.set(|s| s.fail_update = true);
    rig.engine.edit_item(&rig.cache, "a", "buy bread");
    rig.settle().await;

    let item = rig.cache.find("a").unwrap();
    assert_eq!(item.text, "buy milk");
    assert!(!item.checked);
    assert!(rig.error_message().is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_toggle_patches_and_recounts() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;
    assert_eq!(present(&rig.cache, &rig.overlay).unchecked, 1);

    rig.engine.toggle_item(&rig.cache, "a");
    rig.settle().await;

    assert!(rig
      .store
      .calls()
      .contains(&r#"update a {"checked":true}"#.to_string()));
    assert_eq!(rig.cache.find("a").map(|i| i.checked), Some(true));
    assert_eq!(present(&rig.cache, &rig.overlay).unchecked, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_toggle_absent_is_a_noop() {
    let mut rig = Rig::new();
    rig.load().await;
    let calls = rig.store.calls().len();

    rig.engine.toggle_item(&rig.cache, "ghost");
    rig.settle().await;

    assert_eq!(rig.store.calls().len(), calls);
  }

  #[tokio::test(start_paused = true)]
  async fn test_delete_waits_out_the_delay() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;

    rig.engine.delete_item(&mut rig.overlay, "a");
    rig.settle().await;

    // Flagged right away, but nothing has gone over the wire yet.
    assert_eq!(rig.overlay.get("a"), Some(Phase::Deleting));
    assert!(!rig.store.calls().iter().any(|c| c.starts_with("delete")));
    assert!(rig.engine.is_loading());

    advance(DELETE_DELAY).await;
    rig.settle().await;

    assert!(rig.store.calls().contains(&"delete a".to_string()));
    assert!(rig.cache.find("a").is_none());
    assert_eq!(rig.overlay.get("a"), None);
    assert!(!rig.engine.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_delete_restores_the_item() {
    let mut rig = Rig::new();
    rig.store.seed("a", "buy milk", false);
    rig.load().await;

    rig.store.set(|s| s.fail_delete = true);
    rig.engine.delete_item(&mut rig.overlay, "a");
    advance(DELETE_DELAY).await;
    rig.settle().await;

    assert_eq!(rig.overlay.get("a"), None);
    assert!(rig.cache.find("a").is_some());
    let message = rig.error_message().expect("delete failure surfaced");
    assert!(!message.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_flash_timer_spares_newer_phase() {
    let mut rig = Rig::new();

    rig.engine.create_item("wash car");
    rig.settle().await;
    assert_eq!(rig.overlay.get("x1"), Some(Phase::Created));

    // The key enters the deleting phase before the creation flash expires.
    rig.overlay.set("x1", Phase::Deleting);
    advance(CREATED_FLASH).await;
    rig.settle().await;

    assert_eq!(rig.overlay.get("x1"), Some(Phase::Deleting));
  }

  #[tokio::test(start_paused = true)]
  async fn test_new_operation_clears_the_error_slot() {
    let mut rig = Rig::new();
    rig.store.set(|s| s.fail_fetch = true);
    rig.load().await;
    assert!(rig.error_message().is_some());

    rig.store.set(|s| s.fail_fetch = false);
    rig.engine.reload();
    assert!(rig.error_message().is_none());
    rig.settle().await;
    assert!(rig.error_message().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_overlapping_mutations_converge_on_store_truth() {
    let mut rig = Rig::new();
    rig.store.seed("a", "one", false);
    rig.store.seed("b", "two", false);
    rig.load().await;

    // No per-key coordination: both updates fly at once, each reloads.
    rig.engine.toggle_item(&rig.cache, "a");
    rig.engine.toggle_item(&rig.cache, "b");
    rig.settle().await;

    assert_eq!(rig.cache.all(), rig.store.items().as_slice());
    assert_eq!(present(&rig.cache, &rig.overlay).unchecked, 0);
  }
}
