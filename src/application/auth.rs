use crate::domain::ports::{AuthTokens, SharedIdentityProvider, SharedUserStore};
use crate::domain::user::{BankingDetails, User};
use crate::error::{Result, ServiceError};
use rust_decimal::Decimal;
use tracing::info;

/// Registration input as accepted from the sign-up surface.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub address: Option<String>,
    pub banking_details: Option<NewBankingDetails>,
}

#[derive(Debug, Clone)]
pub struct NewBankingDetails {
    pub agency: String,
    pub account_number: String,
}

/// Credential lifecycle, delegated to the identity provider.
///
/// The provider owns the protocol; this service only enforces the local
/// password policy, guards against duplicate emails, and persists the user
/// record under the subject id the provider assigns.
pub struct AuthService {
    identity: SharedIdentityProvider,
    store: SharedUserStore,
}

impl AuthService {
    pub fn new(identity: SharedIdentityProvider, store: SharedUserStore) -> Self {
        Self { identity, store }
    }

    pub async fn register(&self, input: Registration) -> Result<User> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "user with email {} already exists",
                input.email
            )));
        }
        validate_password(&input.password)?;

        let subject = self.identity.sign_up(&input.email, &input.password).await?;
        info!(email = %input.email, subject = %subject, "identity registered");

        let user = User {
            id: subject,
            name: input.name,
            email: input.email,
            address: input.address,
            profile_picture_url: None,
            banking_details: input.banking_details.map(|details| BankingDetails {
                agency: details.agency,
                account_number: details.account_number,
                balance: Decimal::ZERO,
            }),
        };
        self.store.create(user).await
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens> {
        self.identity.sign_in(email, password).await
    }

    pub async fn confirm(&self, email: &str, code: &str) -> Result<()> {
        self.identity.confirm_sign_up(email, code).await
    }

    pub async fn resend_code(&self, email: &str) -> Result<()> {
        self.identity.resend_code(email).await
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(ServiceError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ServiceError::Validation(
            "password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ServiceError::Validation(
            "password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ServiceError::Validation(
            "password must contain a digit".to_string(),
        ));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ServiceError::Validation(
            "password must contain a special character".to_string(),
        ));
    }
    Ok(())
}
