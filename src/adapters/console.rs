use crate::domain::ports::Notifier;
use crate::utils::error::Result;

/// Telegram 未設定時，直接把訊息印到標準輸出
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{}", text);
        Ok(())
    }
}
