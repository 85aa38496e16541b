use super::{
    client::{ApiClient, ApiRequest, MultipartForm},
    types::{
        KycDocument, KycReviewRequest, KycStatusResponse, KycSubmission, KycSubmissionsEnvelope,
        MessageResponse, ReviewAction,
    },
};
use crate::error::ApiError;

impl ApiClient {
    /// Uploads an identity document as `multipart/form-data`.
    pub async fn submit_kyc(&self, document: KycDocument) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/kyc/submit/").await;
        let form = MultipartForm::new()
            .text("document_type", document.document_type.as_str())
            .file(
                "document_file",
                document.file_name,
                document.mime_type,
                document.bytes,
            );
        self.send_json(ApiRequest::post(url).multipart(form)).await
    }

    pub async fn get_kyc_status(&self) -> Result<KycStatusResponse, ApiError> {
        let url = self.endpoint("/kyc/status/").await;
        self.send_json(ApiRequest::get(url)).await
    }

    pub async fn list_kyc_submissions(&self) -> Result<Vec<KycSubmission>, ApiError> {
        let url = self.endpoint("/admin/kyc/").await;
        let envelope: KycSubmissionsEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.submissions)
    }

    pub async fn review_kyc(
        &self,
        kyc_id: i64,
        action: ReviewAction,
        notes: &str,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&format!("/admin/kyc/{}/review/", kyc_id)).await;
        let body = KycReviewRequest {
            action,
            notes: notes.to_string(),
        };
        self.send_json(ApiRequest::post(url).json(&body)?).await
    }
}
