#![allow(dead_code)]

use luasense_api::models::Notification;
use luasense_api::{Catalog, ConstantInfo, MemoryCatalog, MethodInfo};
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn game_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_singleton("AppStateManager")
        .with_method(
            "AppStateManager",
            "getGameObjectController",
            "()",
            "GameObjectController",
        )
        .with_documented_method(
            "GameObjectController",
            "getFromId",
            "(string id)",
            "(GameObject)",
            "Looks up a game object by its id.",
        )
        .with_method("GameObject", "getName", "()", "string")
        .with_method("GameObject", "setPosition", "(number x, number y)", "void")
        .with_constant("Vector3", "UNIT_X")
}

/// Catalog whose first class-name lookup blocks until released, so a run
/// can be held inside its variable table rebuild.
pub struct BlockingCatalog {
    inner: MemoryCatalog,
    hold: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

pub struct Hold {
    pub entered: mpsc::Receiver<()>,
    pub release: mpsc::Sender<()>,
}

impl BlockingCatalog {
    pub fn new(inner: MemoryCatalog) -> (Self, Hold) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let catalog = Self {
            inner,
            hold: Mutex::new(Some((entered_tx, release_rx))),
        };
        (
            catalog,
            Hold {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl Catalog for BlockingCatalog {
    fn methods_for_class(&self, class_name: &str) -> Vec<MethodInfo> {
        self.inner.methods_for_class(class_name)
    }

    fn constants_for_class(&self, class_name: &str) -> Vec<ConstantInfo> {
        self.inner.constants_for_class(class_name)
    }

    fn is_valid_class_name(&self, name: &str) -> bool {
        let hold = self.hold.lock().unwrap().take();
        if let Some((entered, release)) = hold {
            entered.send(()).unwrap();
            release.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        self.inner.is_valid_class_name(name)
    }

    fn singletons(&self) -> Vec<String> {
        self.inner.singletons()
    }
}

/// Receives notifications until one from `generation` arrives, returning
/// everything seen on the way.
pub async fn drain_until(
    rx: &mut UnboundedReceiver<Notification>,
    generation: u64,
) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for notifications")
            .expect("notification channel closed");
        let done = next.generation == generation;
        seen.push(next);
        if done {
            // Runs emit their events back to back.
            while let Ok(Some(more)) =
                tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                seen.push(more);
            }
            return seen;
        }
    }
}
