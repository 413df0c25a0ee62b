use serde::{Deserialize, Deserializer, Serialize};

use crate::{db_types::Amount, traits::UserApiError};

/// The mutable profile fields of a user. Every field is optional; `None` keeps the current value.
///
/// `personal_rate` can also be cleared: `Some(None)` (an explicit `null` in JSON) removes the rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub selected_filial: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub personal_rate: Option<Option<Amount>>,
}

/// Tells a field that is present, even as `null`, apart from one that is missing.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl UserProfileUpdate {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_surname<S: Into<String>>(mut self, surname: S) -> Self {
        self.surname = Some(surname.into());
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_filial<S: Into<String>>(mut self, filial: S) -> Self {
        self.selected_filial = Some(filial.into());
        self
    }

    pub fn with_personal_rate(mut self, rate: Amount) -> Self {
        self.personal_rate = Some(Some(rate));
        self
    }

    pub fn clear_personal_rate(mut self) -> Self {
        self.personal_rate = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.surname.is_none() &&
            self.phone.is_none() &&
            self.email.is_none() &&
            self.role.is_none() &&
            self.selected_filial.is_none() &&
            self.personal_rate.is_none()
    }

    pub fn validate(&self) -> Result<(), UserApiError> {
        match self.personal_rate {
            Some(Some(rate)) if rate.is_negative() => {
                Err(UserApiError::InvalidPersonalRate(format!("{rate} is negative")))
            },
            _ => Ok(()),
        }
    }
}

/// Checks a requested referral bonus percentage. It must be supplied and may not be negative.
pub fn validate_bonus_percentage(percentage: Option<Amount>) -> Result<Amount, UserApiError> {
    match percentage {
        None => Err(UserApiError::InvalidBonusPercentage("A bonus percentage must be supplied".to_string())),
        Some(p) if p.is_negative() => Err(UserApiError::InvalidBonusPercentage(format!("{p} is negative"))),
        Some(p) => Ok(p),
    }
}
