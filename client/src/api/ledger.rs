use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    client::{ApiClient, ApiRequest},
    types::{Account, JournalEntry, Page, Transaction},
};
use crate::error::ApiError;

impl ApiClient {
    /// Unauthenticated health check; the body shape is not fixed.
    pub async fn api_status(&self) -> Result<Value, ApiError> {
        let url = self.endpoint("/status/").await;
        self.public_json(ApiRequest::get(url)).await
    }

    pub async fn list_accounts(&self) -> Result<Page<Account>, ApiError> {
        self.get_page("/accounts/").await
    }

    pub async fn create_account(&self, account: &Account) -> Result<Account, ApiError> {
        let url = self.endpoint("/accounts/").await;
        self.send_json(ApiRequest::post(url).json(account)?).await
    }

    pub async fn update_account(&self, id: i64, account: &Account) -> Result<Account, ApiError> {
        let url = self.endpoint(&format!("/accounts/{}/", id)).await;
        self.send_json(ApiRequest::put(url).json(account)?).await
    }

    pub async fn delete_account(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/accounts/{}/", id)).await;
        let response = self.authenticated_request(ApiRequest::delete(url)).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.json::<Value>().await.ok();
            Err(ApiError::from_status(status, body))
        }
    }

    pub async fn list_transactions(&self) -> Result<Page<Transaction>, ApiError> {
        self.get_page("/transactions/").await
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, ApiError> {
        let url = self.endpoint(&format!("/transactions/{}/", id)).await;
        self.send_json(ApiRequest::get(url)).await
    }

    pub async fn create_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, ApiError> {
        let url = self.endpoint("/transactions/").await;
        self.send_json(ApiRequest::post(url).json(transaction)?).await
    }

    pub async fn list_journal_entries(&self) -> Result<Page<JournalEntry>, ApiError> {
        self.get_page("/journal-entries/").await
    }

    pub async fn create_journal_entry(
        &self,
        entry: &JournalEntry,
    ) -> Result<JournalEntry, ApiError> {
        let url = self.endpoint("/journal-entries/").await;
        self.send_json(ApiRequest::post(url).json(entry)?).await
    }

    async fn get_page<T: DeserializeOwned>(&self, path: &str) -> Result<Page<T>, ApiError> {
        let url = self.endpoint(path).await;
        let value: Value = self.send_json(ApiRequest::get(url)).await?;
        Page::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
