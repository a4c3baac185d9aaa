//! Per-invocation cache over the window manager's client list.

use crate::traits::WindowManager;
use crate::window::Client;
use log::debug;

/// Lazily fetches the client list once and serves it from memory after that.
///
/// The cache is never refreshed: moves and spawns issued during a run are
/// not reflected in it.
pub struct ClientCache<'w, W: WindowManager> {
    wm: &'w W,
    clients: Option<Vec<Client>>,
}

impl<'w, W: WindowManager> ClientCache<'w, W> {
    pub fn new(wm: &'w W) -> Self {
        Self { wm, clients: None }
    }

    /// The client list, querying the window manager on first use.
    pub fn clients(&mut self) -> Result<&[Client], W::Error> {
        let clients = match self.clients.take() {
            Some(cached) => cached,
            None => {
                let fetched = self.wm.clients()?;
                debug!("fetched {} client(s)", fetched.len());
                fetched
            }
        };
        Ok(self.clients.insert(clients).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Monitor, Workspace};
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct CountingWm {
        queries: Cell<usize>,
        fail: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("socket gone")]
    struct Gone;

    impl WindowManager for CountingWm {
        type Error = Gone;

        fn clients(&self) -> Result<Vec<Client>, Gone> {
            self.queries.set(self.queries.get() + 1);
            if self.fail {
                return Err(Gone);
            }
            Ok(vec![Client::from_value(json!({ "class": "foot" })).unwrap()])
        }

        fn workspaces(&self) -> Result<Vec<Workspace>, Gone> {
            Ok(Vec::new())
        }

        fn active_window(&self) -> Result<Option<Client>, Gone> {
            Ok(None)
        }

        fn monitors(&self) -> Result<Vec<Monitor>, Gone> {
            Ok(Vec::new())
        }

        fn dispatch(&self, _: &str, _: &str) -> Result<(), Gone> {
            Ok(())
        }
    }

    #[test]
    fn queries_lazily_and_once() {
        let wm = CountingWm::default();
        let mut cache = ClientCache::new(&wm);
        assert_eq!(wm.queries.get(), 0);
        assert_eq!(cache.clients().unwrap().len(), 1);
        assert_eq!(cache.clients().unwrap().len(), 1);
        assert_eq!(wm.queries.get(), 1);
    }

    #[test]
    fn query_failure_is_returned() {
        let wm = CountingWm {
            fail: true,
            ..Default::default()
        };
        let mut cache = ClientCache::new(&wm);
        assert!(cache.clients().is_err());
    }
}
