//! Medicine entity

use serde::{Deserialize, Serialize};

use super::{Pharmacy, Validator};
use crate::error::AppResult;

/// A stored medicine. `pharmacy` holds the owning pharmacy's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub pharmacy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A medicine with its pharmacy reference resolved.
///
/// `pharmacy` is `null` when the referenced pharmacy no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub pharmacy: Option<Pharmacy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Medicine {
    pub fn populate(self, pharmacy: Option<Pharmacy>) -> MedicineView {
        MedicineView {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            pharmacy,
            image: self.image,
        }
    }
}

/// Medicine create/update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicineInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MedicineInput {
    /// Creation requires the descriptive fields; the owner comes from the credential.
    pub fn validate_create(&self) -> AppResult<()> {
        Validator::new()
            .required("name", self.name.as_deref())
            .required("description", self.description.as_deref())
            .required("price", self.price.as_deref())
            .required("stock", self.stock.as_deref())
            .non_empty("image", self.image.as_deref())
            .finish()
    }

    pub fn validate_update(&self) -> AppResult<()> {
        Validator::new()
            .non_empty("name", self.name.as_deref())
            .non_empty("description", self.description.as_deref())
            .non_empty("pharmacy", self.pharmacy.as_deref())
            .non_empty("image", self.image.as_deref())
            .finish()
    }
}
