/*
 * Responsibility
 * - Router に bind する共有コンテキスト (AppState)
 * - 中身は Arc なので Clone は安い
 */
use std::sync::Arc;

use crate::services::auth::AccessGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self { gate }
    }
}
