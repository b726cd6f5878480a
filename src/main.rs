/*
 * Responsibility
 * - tokio runtime 起動
 * - app::run() の呼び出し（ロジックは置かない）
 */
mod api;
mod app;
mod config;
mod error;
mod middleware;
mod repos;
mod services;
mod state;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
