/*
 * Responsibility
 * - 永続化層の公開インターフェース
 * - handler / guard は store trait だけを見る (PgStore は app.rs でのみ生成)
 */
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pg;
mod project_repo;
mod role_repo;
pub mod store;
mod task_repo;
mod user_repo;

pub use pg::PgStore;
pub use store::CredentialStore;
