/*
 * Responsibility
 * - tokio runtime を起動
 * - app::run() を呼ぶだけ (ロジックは置かない)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    note_gate::app::run().await
}
