use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::ProductStatus,
    services::storage_service::public_url,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UmkmProfile {
    pub id: i32,
    pub name: String,
    pub owner_name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub story: String,
    pub established_year: Option<i32>,
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UmkmProductSummary {
    pub id: i32,
    pub name: String,
    pub status: ProductStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateUmkmRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    #[serde(default)]
    pub story: String,
    pub established_year: Option<i32>,
}

impl CreateUmkmRequest {
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.name,
            &self.owner_name,
            &self.address,
            &self.phone,
            &self.story,
        ];

        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }

        validate_year(self.established_year)
    }

    /// Blank email is stored as null.
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUmkmRequest {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub story: Option<String>,
    pub established_year: Option<i32>,
}

impl UpdateUmkmRequest {
    pub fn validate(&self) -> Result<()> {
        let provided = [
            &self.name,
            &self.owner_name,
            &self.address,
            &self.phone,
            &self.story,
        ];

        if provided
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| v.trim().is_empty()))
        {
            return Err(AppError::BadRequest(
                "Required fields cannot be blank".to_string(),
            ));
        }

        validate_year(self.established_year)
    }
}

fn validate_year(year: Option<i32>) -> Result<()> {
    match year {
        Some(year) if !(1800..=2200).contains(&year) => Err(AppError::BadRequest(format!(
            "Invalid established year: {}",
            year
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct UmkmView {
    #[serde(flatten)]
    pub profile: UmkmProfile,
    pub logo_url: Option<String>,
}

impl UmkmView {
    pub fn new(profile: UmkmProfile, assets_url: &str) -> Self {
        Self {
            logo_url: profile
                .logo_path
                .as_deref()
                .map(|path| public_url(assets_url, path)),
            profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UmkmDetail {
    #[serde(flatten)]
    pub umkm: UmkmView,
    pub products: Vec<UmkmProductSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUmkmRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Dapur Bu Sri",
            "owner_name": "Sri",
            "address": "Jl. Melati 3",
            "phone": "08123",
            "email": "  ",
            "story": "Sejak 1998",
            "established_year": 1998
        }))
        .unwrap()
    }

    #[test]
    fn accepts_complete_profile_and_nulls_blank_email() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.email(), None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let req: CreateUmkmRequest = serde_json::from_value(serde_json::json!({
            "name": "Dapur Bu Sri",
            "owner_name": "Sri",
            "address": "Jl. Melati 3",
            "story": "Sejak 1998"
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn update_rejects_blanked_fields_only() {
        let ok: UpdateUmkmRequest =
            serde_json::from_value(serde_json::json!({ "phone": "0812" })).unwrap();
        assert!(ok.validate().is_ok());

        let blank: UpdateUmkmRequest =
            serde_json::from_value(serde_json::json!({ "name": " " })).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn rejects_implausible_year() {
        let mut req = request();
        req.established_year = Some(42);
        assert!(req.validate().is_err());
    }
}
