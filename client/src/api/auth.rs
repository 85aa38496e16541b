use super::{
    client::{ApiClient, ApiRequest},
    types::{
        AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
        MessageResponse, ProfileEnvelope, RegisterRequest, ResetPasswordRequest, User,
    },
};
use crate::error::ApiError;

impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/auth/register/").await;
        let auth: AuthResponse = self.public_json(ApiRequest::post(url).json(request)?).await?;
        self.session().store_tokens(&auth.tokens)?;
        log::info!("Registered user {}", auth.user.id);
        Ok(auth)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/auth/login/").await;
        let auth: AuthResponse = self.public_json(ApiRequest::post(url).json(request)?).await?;
        self.session().store_tokens(&auth.tokens)?;
        log::info!("Logged in user {}", auth.user.id);
        Ok(auth)
    }

    /// Forgets the token pair. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.session().clear();
        log::info!("Logged out");
    }

    pub async fn get_profile(&self) -> Result<User, ApiError> {
        let url = self.endpoint("/auth/profile/").await;
        let envelope: ProfileEnvelope = self.send_json(ApiRequest::get(url)).await?;
        Ok(envelope.user)
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/auth/change-password/").await;
        let body = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_json(ApiRequest::post(url).json(&body)?).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/auth/forgot-password/").await;
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.public_json(ApiRequest::post(url).json(&body)?).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint("/auth/reset-password/").await;
        let body = ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        };
        self.public_json(ApiRequest::post(url).json(&body)?).await
    }
}
