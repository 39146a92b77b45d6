//! Process-wide transport patch registry.
//!
//! The global client transports are process-wide resources. Saved-original
//! static fields make double-patch and double-restore bugs invisible, so the
//! registry keys each transport slot by the owning interceptor instead: a
//! takeover is logged and a stale restore is a detectable no-op rather than a
//! silent clobber of someone else's hook.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Patchable transport slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportSlot {
    /// Async client transport, consumed by `TaggedClient`.
    AsyncClient,
    /// Blocking client transport, consumed by `TaggedBlockingClient`.
    BlockingClient,
}

/// Per-request decoration hook installed by an adapter.
pub trait RequestDecorator: Send + Sync {
    /// Decorated headers for the request, or `None` when it is out of scope
    /// and must pass through untouched.
    fn decorate(
        &self,
        url: &str,
        initial: &HashMap<String, String>,
    ) -> Option<HashMap<String, String>>;
}

struct ActivePatch {
    owner: Uuid,
    decorator: Arc<dyn RequestDecorator>,
}

lazy_static! {
    static ref PATCHES: Mutex<HashMap<TransportSlot, ActivePatch>> = Mutex::new(HashMap::new());
}

fn patches() -> MutexGuard<'static, HashMap<TransportSlot, ActivePatch>> {
    PATCHES.lock().unwrap_or_else(|e| e.into_inner())
}

/// Install a decorator into a slot.
///
/// Only one interceptor decorates a slot at a time system-wide; a second
/// owner silently becomes the sole active decorator, with the takeover logged
/// so tests can surface it.
pub fn install(slot: TransportSlot, owner: Uuid, decorator: Arc<dyn RequestDecorator>) {
    let mut patches = patches();
    if let Some(previous) = patches.get(&slot) {
        if previous.owner != owner {
            warn!(?slot, "transport already decorated; replacing active decorator");
        }
    }
    patches.insert(slot, ActivePatch { owner, decorator });
}

/// Remove a slot's decorator if this owner still holds it.
///
/// Restoring a slot another owner has since taken over leaves it in place.
pub fn uninstall(slot: TransportSlot, owner: Uuid) {
    let mut patches = patches();
    match patches.get(&slot) {
        Some(patch) if patch.owner == owner => {
            patches.remove(&slot);
        }
        Some(_) => {
            debug!(?slot, "slot taken over by another interceptor; leaving it installed");
        }
        None => {}
    }
}

/// Run the slot's active decorator, if any, against a request.
pub fn decorate(
    slot: TransportSlot,
    url: &str,
    initial: &HashMap<String, String>,
) -> Option<HashMap<String, String>> {
    // Decorators may log or lock engine state; run them outside the registry
    // lock.
    let decorator = patches().get(&slot).map(|patch| Arc::clone(&patch.decorator));
    decorator.and_then(|decorator| decorator.decorate(url, initial))
}

/// Owner currently decorating the slot, if any.
pub fn active_owner(slot: TransportSlot) -> Option<Uuid> {
    patches().get(&slot).map(|patch| patch.owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::registry_lock;

    struct StaticDecorator(&'static str);

    impl RequestDecorator for StaticDecorator {
        fn decorate(
            &self,
            _url: &str,
            initial: &HashMap<String, String>,
        ) -> Option<HashMap<String, String>> {
            let mut headers = initial.clone();
            headers.insert("x-decorated-by".to_string(), self.0.to_string());
            Some(headers)
        }
    }

    #[test]
    fn test_install_then_uninstall_round_trips() {
        let _guard = registry_lock();
        let owner = Uuid::new_v4();

        install(TransportSlot::AsyncClient, owner, Arc::new(StaticDecorator("a")));
        assert_eq!(active_owner(TransportSlot::AsyncClient), Some(owner));

        let decorated =
            decorate(TransportSlot::AsyncClient, "https://x/a", &HashMap::new()).unwrap();
        assert_eq!(decorated.get("x-decorated-by").map(String::as_str), Some("a"));

        uninstall(TransportSlot::AsyncClient, owner);
        assert_eq!(active_owner(TransportSlot::AsyncClient), None);
        assert!(decorate(TransportSlot::AsyncClient, "https://x/a", &HashMap::new()).is_none());
    }

    #[test]
    fn test_second_owner_takes_over_and_stale_restore_is_a_no_op() {
        let _guard = registry_lock();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        install(TransportSlot::AsyncClient, first, Arc::new(StaticDecorator("first")));
        install(TransportSlot::AsyncClient, second, Arc::new(StaticDecorator("second")));
        assert_eq!(active_owner(TransportSlot::AsyncClient), Some(second));

        // The first interceptor's restore must not tear down the takeover.
        uninstall(TransportSlot::AsyncClient, first);
        assert_eq!(active_owner(TransportSlot::AsyncClient), Some(second));

        uninstall(TransportSlot::AsyncClient, second);
        assert_eq!(active_owner(TransportSlot::AsyncClient), None);
    }

    #[test]
    fn test_double_uninstall_is_idempotent() {
        let _guard = registry_lock();
        let owner = Uuid::new_v4();

        install(TransportSlot::BlockingClient, owner, Arc::new(StaticDecorator("b")));
        uninstall(TransportSlot::BlockingClient, owner);
        uninstall(TransportSlot::BlockingClient, owner);
        assert_eq!(active_owner(TransportSlot::BlockingClient), None);
    }
}
