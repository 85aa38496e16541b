use super::{
    client::{ApiClient, ApiRequest},
    types::{MarkReadRequest, MessageResponse, Notification, NotificationsEnvelope},
};
use crate::error::ApiError;

impl ApiClient {
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let url = self.endpoint("/notifications/").await;
        let envelope: NotificationsEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.notifications)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: i64,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/notifications/mark-read/").await;
        let body = MarkReadRequest { notification_id };
        self.send_json(ApiRequest::post(url).json(&body)?).await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/notifications/mark-all-read/").await;
        self.send_json(ApiRequest::post(url)).await
    }
}
