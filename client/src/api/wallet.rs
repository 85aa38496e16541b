use super::{
    client::{ApiClient, ApiRequest},
    types::{
        CoinType, CreateDepositRequest, CreateDepositResponse, Deposit, DepositsEnvelope,
        TrackCopyRequest, TrackCopyResponse, WalletAddress, WalletBalance, WalletEnvelope,
    },
};
use crate::error::ApiError;

impl ApiClient {
    pub async fn get_wallet_address(&self, coin: CoinType) -> Result<WalletAddress, ApiError> {
        let url = self
            .endpoint(&format!("/deposits/wallet-address/?coin_type={}", coin.as_str()))
            .await;
        self.send_json(ApiRequest::get(url)).await
    }

    /// Records a deposit the user says they sent. Stays `pending` until an
    /// admin confirms it.
    pub async fn create_deposit(
        &self,
        request: &CreateDepositRequest,
    ) -> Result<CreateDepositResponse, ApiError> {
        let url = self.endpoint("/deposits/create/").await;
        self.send_json(ApiRequest::post(url).json(request)?).await
    }

    pub async fn list_deposits(&self) -> Result<Vec<Deposit>, ApiError> {
        let url = self.endpoint("/deposits/").await;
        let envelope: DepositsEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.deposits)
    }

    pub async fn get_wallet_balance(&self) -> Result<WalletBalance, ApiError> {
        let url = self.endpoint("/wallet/balance/").await;
        let envelope: WalletEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.wallet)
    }

    pub async fn track_wallet_copy(
        &self,
        coin: CoinType,
        wallet_address: &str,
    ) -> Result<TrackCopyResponse, ApiError> {
        let url = self.endpoint("/wallet/track-copy/").await;
        let body = TrackCopyRequest {
            coin_type: coin,
            wallet_address: wallet_address.to_string(),
        };
        self.send_json(ApiRequest::post(url).json(&body)?).await
    }
}
