//! User - 通知の受信者と、その絞り込み条件

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::UserId;

/// User は通知の受信者
///
/// 固定フィールド（username, email, is_staff, is_active）に加えて、
/// 任意の属性を `attributes` に持てます。Scope の絞り込みはどちらも
/// 同じ名前空間（`field()`）で参照します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            is_staff: false,
            is_active: true,
            attributes: Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// フィールド名で値を取得する（固定フィールドが属性より優先）
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.as_ulid().to_string())),
            "username" => Some(Value::String(self.username.clone())),
            "email" => self.email.clone().map(Value::String),
            "is_staff" => Some(Value::Bool(self.is_staff)),
            "is_active" => Some(Value::Bool(self.is_active)),
            other => self.attributes.get(other).cloned(),
        }
    }
}

/// 1 フィールドに対する条件（いずれかの値に一致）
#[derive(Debug, Clone, PartialEq)]
struct FieldMatch {
    field: String,
    values: Vec<Value>,
}

/// UserFilter は AND で結合された FieldMatch の集合
///
/// 空の filter は全ユーザーに一致します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    conditions: Vec<FieldMatch>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field == value`
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.any_of(field, vec![value.into()])
    }

    /// `field IN values`
    pub fn any_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(FieldMatch {
            field: field.into(),
            values,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, user: &User) -> bool {
        self.conditions.iter().all(|cond| match user.field(&cond.field) {
            Some(value) => cond.values.contains(&value),
            None => false,
        })
    }
}
