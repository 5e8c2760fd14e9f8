use std::fmt::Debug;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record held by one of the REST collections.
///
/// `Draft` is the request body used for both create (POST) and full
/// replace (PUT); it carries only the editable fields.
pub trait Record: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static {
    type Draft: Serialize + Clone + Debug + PartialEq + Send + Sync;

    /// Singular noun used in notices ("product", "user").
    const KIND: &'static str;

    fn id(&self) -> i64;

    fn to_draft(&self) -> Self::Draft;

    /// Builds the record the server would hold after applying `draft`.
    fn from_draft(id: i64, draft: &Self::Draft) -> Self;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(
        rename = "fechaCreacion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

/// Partial product update; only the fields that are set go on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "cantidad", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }

    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = self.name.as_ref() {
            product.name = name.clone();
        }
        if let Some(description) = self.description.as_ref() {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
    }
}

impl Record for Product {
    type Draft = ProductDraft;

    const KIND: &'static str = "product";

    fn id(&self) -> i64 {
        self.id
    }

    fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }

    fn from_draft(id: i64, draft: &ProductDraft) -> Self {
        Product {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            quantity: draft.quantity,
            created_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
}

impl Record for User {
    type Draft = UserDraft;

    const KIND: &'static str = "user";

    fn id(&self) -> i64 {
        self.id
    }

    fn to_draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    fn from_draft(id: i64, draft: &UserDraft) -> Self {
        User {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
        }
    }
}
