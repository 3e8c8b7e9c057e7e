//! Scope - 「誰がこの通知を受け取るか」の解決
//!
//! Scope は context から `UserFilter` を組み立てるだけで、ユーザー集合の
//! 読み出しは UserDirectory を持つ app 層が行います。
//!
//! # 種類
//! - **QuerySet**: 事前に組んだ UserFilter（なければ全ユーザー）。context は無視
//! - **ContextFilter**: context の値から UserFilter を組み立てる
//! - **Custom**: 任意の `ScopeResolver` 実装（dispatch 側は変更不要）

use std::fmt;
use std::sync::Arc;

use super::context::Context;
use super::errors::AhemError;
use super::user::UserFilter;

/// ScopeResolver は context から受信者の条件を組み立てる
pub trait ScopeResolver: Send + Sync {
    fn filter(&self, context: &Context) -> Result<UserFilter, AhemError>;
}

/// QuerySetScope は context を見ずに固定の条件を返す
///
/// filter は dispatch のたびにディレクトリへ投げるので、その時点のユーザー集合になります。
#[derive(Debug, Clone, Default)]
pub struct QuerySetScope {
    filter: Option<UserFilter>,
}

impl QuerySetScope {
    /// 全ユーザー
    pub fn all() -> Self {
        Self { filter: None }
    }

    /// 事前に絞り込んだユーザー
    pub fn filtered(filter: UserFilter) -> Self {
        Self {
            filter: Some(filter),
        }
    }
}

impl ScopeResolver for QuerySetScope {
    fn filter(&self, _context: &Context) -> Result<UserFilter, AhemError> {
        Ok(self.filter.clone().unwrap_or_default())
    }
}

/// ContextFilterScope は `user field <- context key` の対応から filter を作る
///
/// - 対応する key が context にない場合は `MissingContextKey`（空集合にはしない）
/// - context の値が配列なら「いずれかに一致」、それ以外は等値比較
#[derive(Debug, Clone, Default)]
pub struct ContextFilterScope {
    base: UserFilter,
    mappings: Vec<(String, String)>,
}

impl ContextFilterScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// user の `field` を context の `context_key` の値で絞る
    pub fn field(mut self, field: impl Into<String>, context_key: impl Into<String>) -> Self {
        self.mappings.push((field.into(), context_key.into()));
        self
    }

    /// context に依存しない固定条件を追加する
    pub fn with_base(mut self, base: UserFilter) -> Self {
        self.base = base;
        self
    }
}

impl ScopeResolver for ContextFilterScope {
    fn filter(&self, context: &Context) -> Result<UserFilter, AhemError> {
        if self.mappings.is_empty() {
            return Err(AhemError::Scope(
                "context filter scope has no field mappings".to_string(),
            ));
        }

        let mut filter = self.base.clone();
        for (field, key) in &self.mappings {
            let value = context
                .get(key)
                .ok_or_else(|| AhemError::MissingContextKey(key.clone()))?;
            filter = match value {
                serde_json::Value::Array(values) => filter.any_of(field.clone(), values.clone()),
                other => filter.eq(field.clone(), other.clone()),
            };
        }
        Ok(filter)
    }
}

/// Scope は Notification が持つ解決戦略
#[derive(Clone)]
pub enum Scope {
    QuerySet(QuerySetScope),
    ContextFilter(ContextFilterScope),
    Custom(Arc<dyn ScopeResolver>),
}

impl Scope {
    pub fn all_users() -> Self {
        Scope::QuerySet(QuerySetScope::all())
    }

    pub fn custom(resolver: impl ScopeResolver + 'static) -> Self {
        Scope::Custom(Arc::new(resolver))
    }

    /// dispatch 時の context から受信者の条件を組み立てる
    pub fn filter(&self, context: &Context) -> Result<UserFilter, AhemError> {
        match self {
            Scope::QuerySet(scope) => scope.filter(context),
            Scope::ContextFilter(scope) => scope.filter(context),
            Scope::Custom(resolver) => resolver.filter(context),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::all_users()
    }
}

impl From<QuerySetScope> for Scope {
    fn from(scope: QuerySetScope) -> Self {
        Scope::QuerySet(scope)
    }
}

impl From<ContextFilterScope> for Scope {
    fn from(scope: ContextFilterScope) -> Self {
        Scope::ContextFilter(scope)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::QuerySet(scope) => f.debug_tuple("QuerySet").field(scope).finish(),
            Scope::ContextFilter(scope) => f.debug_tuple("ContextFilter").field(scope).finish(),
            Scope::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserId};
    use serde_json::json;
    use ulid::Ulid;

    fn user(name: &str, staff: bool, team: &str) -> User {
        User::new(UserId::from_ulid(Ulid::new()), name)
            .with_staff(staff)
            .with_attribute("team", team)
    }

    fn ctx(value: serde_json::Value) -> Context {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn queryset_scope_without_filter_matches_everyone() {
        let filter = Scope::all_users().filter(&Context::new()).unwrap();

        assert!(filter.is_empty());
        assert!(filter.matches(&user("alice", false, "core")));
    }

    #[test]
    fn queryset_scope_ignores_context() {
        let scope = QuerySetScope::filtered(UserFilter::new().eq("is_staff", true));
        let filter = scope.filter(&ctx(json!({"is_staff": false}))).unwrap();

        assert!(filter.matches(&user("staff", true, "core")));
        assert!(!filter.matches(&user("plain", false, "core")));
    }

    #[test]
    fn context_filter_scope_uses_context_values() {
        let alice = user("alice", false, "core");
        let bob = user("bob", false, "sales");

        let scope = ContextFilterScope::new().field("id", "user_id");
        let filter = scope
            .filter(&ctx(json!({"user_id": alice.id.as_ulid().to_string()})))
            .unwrap();
        assert!(filter.matches(&alice));
        assert!(!filter.matches(&bob));
    }

    #[test]
    fn context_filter_scope_array_value_matches_any() {
        let scope = ContextFilterScope::new().field("team", "teams");
        let filter = scope.filter(&ctx(json!({"teams": ["core", "infra"]}))).unwrap();

        assert!(filter.matches(&user("alice", false, "core")));
        assert!(!filter.matches(&user("bob", false, "sales")));
        assert!(filter.matches(&user("carol", false, "infra")));
    }

    #[test]
    fn context_filter_scope_fails_on_missing_key() {
        let scope = ContextFilterScope::new().field("team", "team");
        let err = scope.filter(&Context::new()).unwrap_err();
        assert!(matches!(err, AhemError::MissingContextKey(key) if key == "team"));
    }

    #[test]
    fn context_filter_scope_combines_base_filter() {
        let scope = ContextFilterScope::new()
            .with_base(UserFilter::new().eq("is_staff", true))
            .field("team", "team");
        let filter = scope.filter(&ctx(json!({"team": "core"}))).unwrap();

        assert!(filter.matches(&user("lead", true, "core")));
        assert!(!filter.matches(&user("dev", false, "core")));
    }

    #[test]
    fn context_filter_scope_without_mappings_is_rejected() {
        let err = ContextFilterScope::new().filter(&Context::new()).unwrap_err();
        assert!(matches!(err, AhemError::Scope(_)));
    }

    struct TeamOf;

    impl ScopeResolver for TeamOf {
        fn filter(&self, context: &Context) -> Result<UserFilter, AhemError> {
            let team = context
                .get("team")
                .cloned()
                .ok_or_else(|| AhemError::MissingContextKey("team".to_string()))?;
            Ok(UserFilter::new().eq("team", team).eq("is_active", true))
        }
    }

    #[test]
    fn custom_scope_delegates_to_resolver() {
        let scope = Scope::custom(TeamOf);
        let filter = scope.filter(&ctx(json!({"team": "infra"}))).unwrap();

        assert!(filter.matches(&user("carol", false, "infra")));
        assert!(!filter.matches(&user("carol", false, "infra").with_active(false)));
        assert!(matches!(
            scope.filter(&Context::new()),
            Err(AhemError::MissingContextKey(_))
        ));
        assert_eq!(format!("{scope:?}"), "Custom(..)");
    }
}
