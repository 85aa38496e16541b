use super::{
    client::{ApiClient, ApiRequest},
    types::{
        AdminReplyRequest, CreateTicketRequest, CreateTicketResponse, MessageResponse,
        SupportTicket, TicketsEnvelope,
    },
};
use crate::error::ApiError;

impl ApiClient {
    pub async fn create_ticket(
        &self,
        request: &CreateTicketRequest,
    ) -> Result<CreateTicketResponse, ApiError> {
        let url = self.endpoint("/support/create/").await;
        self.send_json(ApiRequest::post(url).json(request)?).await
    }

    pub async fn list_my_tickets(&self) -> Result<Vec<SupportTicket>, ApiError> {
        let url = self.endpoint("/support/tickets/").await;
        let envelope: TicketsEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.tickets)
    }

    /// Every ticket, with internal replies. Staff only.
    pub async fn list_all_tickets(&self) -> Result<Vec<SupportTicket>, ApiError> {
        let url = self.endpoint("/support/admin/tickets/").await;
        let envelope: TicketsEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.tickets)
    }

    pub async fn reply_to_ticket(
        &self,
        request: &AdminReplyRequest,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/support/admin/reply/").await;
        self.send_json(ApiRequest::post(url).json(request)?).await
    }
}
