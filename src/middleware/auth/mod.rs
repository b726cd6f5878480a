/*
 * Responsibility
 * - 認証/認可 middleware
 *   - access: token 検証 + role check (外側)
 *   - owner: resource 所有者 check (内側、access の後に走る)
 */
pub mod access;
pub mod owner;
