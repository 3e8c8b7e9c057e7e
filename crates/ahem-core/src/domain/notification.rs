//! Notification - 名前付きの通知定義
//!
//! 振る舞いは持たず、Scope・backend 一覧・テンプレート参照を束ねるだけです。
//! 実行時は `NotificationRegistry` から名前で引かれます。

use std::collections::BTreeMap;

use super::context::Context;
use super::errors::AhemError;
use super::scope::Scope;
use super::user::UserFilter;

/// テンプレート key が見つからないときに使う key
pub const DEFAULT_TEMPLATE: &str = "default";

/// Notification は通知の宣言
///
/// # 使用例
/// ```ignore
/// let n = Notification::new("order_shipped", ContextFilterScope::new().field("id", "user_id"))
///     .with_backends(["email", "sms"])
///     .with_template("default", "orders/shipped.txt");
/// ```
///
/// `backends` は登録順を保ち、重複は最初の 1 つだけ残します。
/// backend が実在するかは定義時には確認しません（send 時に解決）。
#[derive(Debug, Clone)]
pub struct Notification {
    name: String,
    scope: Scope,
    backends: Vec<String>,
    templates: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(name: impl Into<String>, scope: impl Into<Scope>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            backends: Vec::new(),
            templates: BTreeMap::new(),
        }
    }

    pub fn with_backends<I, S>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for backend in backends {
            let backend = backend.into();
            if !self.backends.contains(&backend) {
                self.backends.push(backend);
            }
        }
        self
    }

    pub fn with_template(mut self, key: impl Into<String>, reference: impl Into<String>) -> Self {
        self.templates.insert(key.into(), reference.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn backends(&self) -> &[String] {
        &self.backends
    }

    pub fn supports_backend(&self, backend: &str) -> bool {
        self.backends.iter().any(|b| b == backend)
    }

    pub fn templates(&self) -> &BTreeMap<String, String> {
        &self.templates
    }

    /// `key` のテンプレート参照。なければ `"default"` を返す
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates
            .get(key)
            .or_else(|| self.templates.get(DEFAULT_TEMPLATE))
            .map(String::as_str)
    }

    /// Scope に委譲して受信者の条件を組み立てる
    pub fn user_filter(&self, context: &Context) -> Result<UserFilter, AhemError> {
        self.scope.filter(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuerySetScope;

    #[test]
    fn backends_keep_order_and_drop_duplicates() {
        let n = Notification::new("n", QuerySetScope::all())
            .with_backends(["sms", "email", "sms"]);

        assert_eq!(n.backends(), ["sms".to_string(), "email".to_string()]);
        assert!(n.supports_backend("email"));
        assert!(!n.supports_backend("push"));
    }

    #[test]
    fn template_falls_back_to_default() {
        let n = Notification::new("n", QuerySetScope::all())
            .with_template("default", "base.html")
            .with_template("sms", "short.txt");

        assert_eq!(n.template("sms"), Some("short.txt"));
        assert_eq!(n.template("email"), Some("base.html"));
    }

    #[test]
    fn template_without_default_is_none() {
        let n = Notification::new("n", QuerySetScope::all()).with_template("sms", "short.txt");
        assert_eq!(n.template("email"), None);
    }
}
