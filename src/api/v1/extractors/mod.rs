/*
 * Responsibility
 * - handler 引数として使う独自 extractor
 */
pub mod auth_ctx;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
