//! Client record model.
//!
//! # Invariants
//! - Name and postal address fields are never blank.
//! - Email, when present, has a plausible `local@domain.tld` shape.

use crate::model::validation::{require_text, ValidationError};
use crate::model::visit::GeoPoint;
use crate::model::ClientId;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Person receiving care at a fixed address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Checks the fields shared with [`NewClient::validate`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_contact(
            &self.name,
            &self.email,
            [&self.address, &self.city, &self.state, &self.zip_code],
        )?;
        GeoPoint::new(self.latitude, self.longitude)?;
        Ok(())
    }

    /// Applies the present fields of a patch.
    pub fn apply(&mut self, patch: &ClientPatch) {
        let ClientPatch {
            name,
            email,
            phone,
            address,
            city,
            state,
            zip_code,
            latitude,
            longitude,
            notes,
            is_active,
        } = patch;
        if let Some(value) = name {
            self.name = value.clone();
        }
        if let Some(value) = email {
            self.email = value.clone();
        }
        if let Some(value) = phone {
            self.phone = value.clone();
        }
        if let Some(value) = address {
            self.address = value.clone();
        }
        if let Some(value) = city {
            self.city = value.clone();
        }
        if let Some(value) = state {
            self.state = value.clone();
        }
        if let Some(value) = zip_code {
            self.zip_code = value.clone();
        }
        if let Some(value) = latitude {
            self.latitude = *value;
        }
        if let Some(value) = longitude {
            self.longitude = *value;
        }
        if let Some(value) = notes {
            self.notes = value.clone();
        }
        if let Some(value) = is_active {
            self.is_active = *value;
        }
    }
}

/// Request model for registering a client. New clients start active.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: String,
}

impl NewClient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_contact(
            &self.name,
            &self.email,
            [&self.address, &self.city, &self.state, &self.zip_code],
        )?;
        GeoPoint::new(self.latitude, self.longitude)?;
        Ok(())
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

fn validate_contact(
    name: &str,
    email: &str,
    [address, city, state, zip_code]: [&String; 4],
) -> Result<(), ValidationError> {
    require_text("name", name)?;
    require_text("address", address)?;
    require_text("city", city)?;
    require_text("state", state)?;
    require_text("zip_code", zip_code)?;

    let email = email.trim();
    if !email.is_empty() && !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ClientPatch, NewClient};
    use crate::model::validation::ValidationError;

    fn new_client() -> NewClient {
        NewClient {
            name: "John Smith".to_string(),
            email: "john.smith@email.com".to_string(),
            address: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            latitude: 39.7817,
            longitude: -89.6501,
            ..NewClient::default()
        }
    }

    #[test]
    fn valid_client_passes() {
        new_client().validate().unwrap();
    }

    #[test]
    fn blank_address_fields_are_rejected() {
        let mut client = new_client();
        client.city = "  ".to_string();
        assert_eq!(client.validate(), Err(ValidationError::BlankField("city")));
    }

    #[test]
    fn email_is_optional_but_checked_when_present() {
        let mut client = new_client();
        client.email = String::new();
        client.validate().unwrap();

        client.email = "not-an-email".to_string();
        assert!(matches!(
            client.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn home_coordinates_must_be_in_range() {
        let mut client = new_client();
        client.latitude = 95.0;
        assert_eq!(
            client.validate(),
            Err(ValidationError::LatitudeOutOfRange(95.0))
        );
    }

    #[test]
    fn patch_deserializes_with_missing_fields() {
        let patch: ClientPatch = serde_json::from_str(r#"{"city":"Chicago"}"#).unwrap();
        assert_eq!(patch.city.as_deref(), Some("Chicago"));
        assert!(patch.name.is_none());
    }
}
