/*
 * Responsibility
 * - crate root: アクセスゲートを公開し、バイナリ / logout 側 /
 *   結合テストが同じ実装を使えるようにする
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
