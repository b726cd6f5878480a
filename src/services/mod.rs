/*
 * Responsibility
 * - ドメインサービス (token / password / 起動時 seed)
 */
pub mod auth;
pub mod seed;
