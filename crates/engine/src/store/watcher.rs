//! Filesystem event handler for the notify watcher (hot reload).

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{StoreInner, RELOAD_DEBOUNCE};

/// Handle a single filesystem event from the notify watcher.
///
/// Only events touching the store's backing file count. The debounce is
/// trailing-edge: the first event of a burst reloads immediately, later
/// events inside the window schedule one reload for when the window elapses.
/// Dropping in-window events outright would lose the final write of a
/// multi-step editor save and leave the store serving stale rules. A failed
/// reload keeps the previous registry current.
pub(super) fn handle_fs_event(event: &Event, inner: &Arc<StoreInner>) {
    let touches_file = event.paths.iter().any(|p| {
        p == &inner.path || p.file_name() == inner.path.file_name()
    });
    if !touches_file {
        return;
    }

    match &event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Name(_)) => {}
        _ => return,
    }

    {
        let mut debounce = inner.debounce.lock().expect("debounce lock poisoned");
        if let Some(last) = debounce.last_reload {
            let elapsed = last.elapsed();
            if elapsed < RELOAD_DEBOUNCE {
                if !debounce.reload_queued {
                    debounce.reload_queued = true;
                    let inner = Arc::clone(inner);
                    let wait = RELOAD_DEBOUNCE - elapsed;
                    thread::spawn(move || {
                        thread::sleep(wait);
                        {
                            let mut debounce =
                                inner.debounce.lock().expect("debounce lock poisoned");
                            debounce.reload_queued = false;
                            debounce.last_reload = Some(Instant::now());
                        }
                        reload(&inner);
                    });
                }
                return;
            }
        }
        debounce.last_reload = Some(Instant::now());
    }

    reload(inner);
}

fn reload(inner: &Arc<StoreInner>) {
    match inner.load() {
        Ok(count) => {
            info!(path = %inner.path.display(), actions = count, "hot-reloaded actions file");
        }
        Err(e) => {
            warn!(
                path = %inner.path.display(),
                error = %e,
                "failed to reload actions file, keeping previous registry"
            );
        }
    }
}
