//! Registries - 名前から Notification / Backend を引く
//!
//! Design:
//! - 起動時に AppBuilder で組み立てる（mutable）
//! - 実行時は Arc で共有し、読むだけ（immutable）
//! - 同じ名前の二重登録はエラー

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{AhemError, Notification};
use crate::ports::Backend;

#[derive(Default)]
pub struct NotificationRegistry {
    notifications: HashMap<String, Arc<Notification>>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, notification: Notification) -> Result<(), AhemError> {
        let name = notification.name().to_string();
        if self.notifications.contains_key(&name) {
            return Err(AhemError::DuplicateNotification(name));
        }
        self.notifications.insert(name, Arc::new(notification));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Notification>, AhemError> {
        self.notifications
            .get(name)
            .cloned()
            .ok_or_else(|| AhemError::NotificationNotFound(name.to_string()))
    }

    /// 登録済みの名前（ソート済み）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.notifications.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn Backend>) -> Result<(), AhemError> {
        let name = backend.name().to_string();
        if self.backends.contains_key(&name) {
            return Err(AhemError::DuplicateBackend(name));
        }
        self.backends.insert(name, backend);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Backend>, AhemError> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| AhemError::BackendNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuerySetScope;
    use crate::impls::LogBackend;

    #[test]
    fn test_register_and_get() {
        let mut registry = NotificationRegistry::new();
        registry
            .register(Notification::new("welcome", QuerySetScope::all()))
            .unwrap();

        let retrieved = registry.get("welcome").unwrap();
        assert_eq!(retrieved.name(), "welcome");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_double_registration() {
        let mut registry = NotificationRegistry::new();
        registry
            .register(Notification::new("welcome", QuerySetScope::all()))
            .unwrap();
        let result = registry.register(Notification::new("welcome", QuerySetScope::all()));

        assert!(matches!(result, Err(AhemError::DuplicateNotification(name)) if name == "welcome"));
    }

    #[test]
    fn test_unknown_name() {
        let registry = NotificationRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, AhemError::NotificationNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = NotificationRegistry::new();
        for name in ["b", "c", "a"] {
            registry
                .register(Notification::new(name, QuerySetScope::all()))
                .unwrap();
        }
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_backend_registry() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(LogBackend::new("email"))).unwrap();

        assert_eq!(registry.get("email").unwrap().name(), "email");
        assert!(matches!(
            registry.register(Arc::new(LogBackend::new("email"))),
            Err(AhemError::DuplicateBackend(_))
        ));
        assert!(matches!(
            registry.get("sms"),
            Err(AhemError::BackendNotFound(name)) if name == "sms"
        ));
    }
}
