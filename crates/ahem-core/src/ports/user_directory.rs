//! UserDirectory port - ユーザー集合への問い合わせ
//!
//! host アプリケーションの user テーブルに相当します。

use async_trait::async_trait;

use crate::domain::{AhemError, User, UserFilter, UserId};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// filter に一致するユーザー（空の filter なら全員）
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>, AhemError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, AhemError>;
}
