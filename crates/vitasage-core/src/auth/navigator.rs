use std::sync::Mutex;

use tracing::debug;

/// Hook the client uses to send the host application to another route.
///
/// The client only ever asks for the current path (to honour the login-page
/// guard) and requests a navigation after an authentication failure. What a
/// navigation means is up to the host.
pub trait Navigator: Send + Sync {
    /// Current route of the host, if it has one.
    fn current_path(&self) -> Option<String>;

    fn navigate(&self, path: &str);
}

/// Navigator for hosts without routes. Navigation requests are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn navigate(&self, path: &str) {
        debug!(path, "Ignoring navigation request");
    }
}

/// In-memory route tracker.
///
/// Holds the current path and records every navigation it performed, so a
/// host can poll it after a request completes.
#[derive(Debug, Default)]
pub struct Location {
    state: Mutex<LocationState>,
}

#[derive(Debug, Default)]
struct LocationState {
    path: String,
    history: Vec<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(LocationState {
                path: path.into(),
                history: Vec::new(),
            }),
        }
    }

    pub fn path(&self) -> String {
        self.state
            .lock()
            .map(|state| state.path.clone())
            .unwrap_or_default()
    }

    /// Move to a path without recording it as a client navigation.
    pub fn set_path(&self, path: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.path = path.into();
        }
    }

    /// Paths navigated to via [`Navigator::navigate`], oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }
}

impl Navigator for Location {
    fn current_path(&self) -> Option<String> {
        Some(self.path())
    }

    fn navigate(&self, path: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.path = path.to_string();
            state.history.push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_records_navigations() {
        let location = Location::new("/dashboard");
        assert_eq!(location.current_path().as_deref(), Some("/dashboard"));

        location.navigate("/login");
        assert_eq!(location.path(), "/login");
        assert_eq!(location.navigations(), vec!["/login".to_string()]);

        location.set_path("/patients");
        assert_eq!(location.path(), "/patients");
        assert_eq!(location.navigations().len(), 1);
    }

    #[test]
    fn test_noop_navigator_has_no_path() {
        let nav = NoopNavigator;
        nav.navigate("/login");
        assert!(nav.current_path().is_none());
    }
}
