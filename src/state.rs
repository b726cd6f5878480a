/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - tokens: 署名鍵を抱えた TokenService (起動時に 1 度だけ生成、以後不変)
 *   - store: Credential Store (本番は PgStore、テストは MemoryStore)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::CredentialStore;
use crate::services::auth::{PasswordService, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn CredentialStore>,
    pub passwords: PasswordService,
}

impl AppState {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            tokens,
            store,
            passwords: PasswordService::new(),
        }
    }
}
