use crate::domain::model::{CircuitRecord, Notification};
use crate::utils::error::RepositoryError;
use async_trait::async_trait;

/// 電路紀錄的儲存後端。
///
/// - `find` 不得改變狀態，查詢鍵不分大小寫；找不到回傳 `Ok(None)`。
/// - `save` 回傳以提交時間更新 `last_updated` 的紀錄；`service_number` 為空時
///   代表新註冊，由後端指派新的服務編號。
/// - 成功的 `save` 之後，對同一識別碼的 `find` 必須看得到新內容。
#[async_trait]
pub trait CircuitRepository: Send + Sync {
    async fn find(&self, service_identifier: &str) -> Result<Option<CircuitRecord>, RepositoryError>;
    async fn save(&self, record: CircuitRecord) -> Result<CircuitRecord, RepositoryError>;
}

/// 接收工作流程發出的通知 (查無資料、驗證失敗、提交成功等)
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[async_trait]
impl<T: CircuitRepository + ?Sized> CircuitRepository for std::sync::Arc<T> {
    async fn find(&self, service_identifier: &str) -> Result<Option<CircuitRecord>, RepositoryError> {
        (**self).find(service_identifier).await
    }

    async fn save(&self, record: CircuitRecord) -> Result<CircuitRecord, RepositoryError> {
        (**self).save(record).await
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}
