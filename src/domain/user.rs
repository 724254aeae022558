use crate::error::{Result, ServiceError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Banking association embedded in a user record.
///
/// The balance column is only ever written through
/// [`UserStore::update_balance`](super::ports::UserStore::update_balance);
/// the generic partial-update path rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingDetails {
    pub agency: String,
    pub account_number: String,
    #[serde(default)]
    pub balance: Decimal,
}

/// A user record as owned by the durable store.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub profile_picture_url: Option<String>,
    pub banking_details: Option<BankingDetails>,
}

impl User {
    /// Current balance, zero when the user has no banking association.
    pub fn balance(&self) -> Decimal {
        self.banking_details
            .as_ref()
            .map(|details| details.balance)
            .unwrap_or(Decimal::ZERO)
    }
}

/// A positive monetary amount carried by transfer requests.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ServiceError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ServiceError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    Credit,
    Debit,
}

/// Canonical cache entry shape for a user.
///
/// Older deployments cached the store entity verbatim, which serialized its
/// fields with a leading underscore. The aliases keep those entries readable;
/// every write emits the canonical camelCase form, so legacy entries migrate
/// the next time they are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "_name")]
    pub name: String,
    #[serde(alias = "_email")]
    pub email: String,
    #[serde(default, alias = "_address", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        alias = "profilePicture",
        alias = "_profilePicture",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_picture_url: Option<String>,
    #[serde(
        default,
        alias = "_bankingDetails",
        skip_serializing_if = "Option::is_none"
    )]
    pub banking_details: Option<BankingDetails>,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            banking_details: user.banking_details.clone(),
        }
    }
}

impl UserSnapshot {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            address: self.address,
            profile_picture_url: self.profile_picture_url,
            banking_details: self.banking_details,
        }
    }
}

/// Fields the generic partial-update path may touch.
///
/// The balance is deliberately not representable here; [`UserPatch::from_value`]
/// rejects any payload that tries to smuggle it in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "profilePicture")]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub banking_details: Option<BankingDetailsPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BankingDetailsPatch {
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
}

impl UserPatch {
    /// Builds a patch from untrusted JSON.
    ///
    /// A `balance` key anywhere in the payload is an invariant violation, not
    /// a mere unknown field: the balance column is reachable only through the
    /// balance mutation path.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let nested_balance = value
            .get("bankingDetails")
            .and_then(|details| details.get("balance"));
        if value.get("balance").is_some() || nested_balance.is_some() {
            return Err(ServiceError::InvariantViolation(
                "balance cannot be set through a partial update".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|err| ServiceError::Validation(format!("invalid user patch: {err}")))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(ServiceError::Validation("name must not be empty".to_string()));
        }
        if let Some(email) = &self.email
            && !email.contains('@')
        {
            return Err(ServiceError::Validation(format!("invalid email: {email}")));
        }
        Ok(())
    }
}
