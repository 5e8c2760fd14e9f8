//! Input forms for products and users.
//!
//! A form is either idle (empty, submitting creates a record) or editing a
//! record it was populated from (submitting replaces that record). The
//! submit step turns the mode into a [`SubmitIntent`] once, together with a
//! validated draft.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{Product, ProductDraft, ProductPatch, Record, User, UserDraft};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Idle,
    Editing(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitIntent {
    Create,
    Update(i64),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("'{value}' is not a valid email address")]
    InvalidEmail { value: String },

    #[error("unknown field '{field}', expected one of: {expected}")]
    UnknownField { field: String, expected: String },
}

/// The editable fields of one record type, held as the raw text the user
/// typed until submit.
pub trait Fields: Default + Clone {
    type Record: Record;

    const NAMES: &'static [&'static str];

    fn from_record(record: &Self::Record) -> Self;

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError>;

    fn entries(&self) -> Vec<(&'static str, String)>;

    fn draft(&self) -> Result<<Self::Record as Record>::Draft, FormError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Form<F> {
    mode: FormMode,
    fields: F,
}

pub type ProductForm = Form<ProductFields>;
pub type UserForm = Form<UserFields>;

impl<F: Fields> Form<F> {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Idle,
            fields: F::default(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn populate(&mut self, record: &F::Record) {
        self.mode = FormMode::Editing(record.id());
        self.fields = F::from_record(record);
    }

    pub fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        self.fields.set(field, value)
    }

    pub fn reset(&mut self) {
        self.mode = FormMode::Idle;
        self.fields = F::default();
    }

    pub fn submit(&self) -> Result<(SubmitIntent, <F::Record as Record>::Draft), FormError> {
        let draft = self.fields.draft()?;
        let intent = match self.mode {
            FormMode::Idle => SubmitIntent::Create,
            FormMode::Editing(id) => SubmitIntent::Update(id),
        };
        Ok((intent, draft))
    }
}

fn unknown_field<F: Fields>(field: &str) -> FormError {
    FormError::UnknownField {
        field: field.to_string(),
        expected: F::NAMES.join(", "),
    }
}

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Required { field });
    }
    Ok(trimmed.to_string())
}

pub fn parse_price(value: &str) -> Result<Decimal, FormError> {
    let raw = required("price", value)?;
    let price = Decimal::from_str(&raw).map_err(|_| FormError::InvalidNumber {
        field: "price",
        value: raw.clone(),
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(FormError::Negative { field: "price" });
    }
    Ok(price)
}

pub fn parse_quantity(value: &str) -> Result<u32, FormError> {
    let raw = required("quantity", value)?;
    match raw.parse::<i64>() {
        Ok(n) if n < 0 => Err(FormError::Negative { field: "quantity" }),
        Ok(n) => u32::try_from(n).map_err(|_| FormError::InvalidNumber {
            field: "quantity",
            value: raw,
        }),
        Err(_) => Err(FormError::InvalidNumber {
            field: "quantity",
            value: raw,
        }),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: String,
}

impl Fields for ProductFields {
    type Record = Product;

    const NAMES: &'static [&'static str] = &["name", "description", "price", "quantity"];

    fn from_record(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            quantity: product.quantity.to_string(),
        }
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        let slot = match field.trim().to_lowercase().as_str() {
            "name" | "nombre" => &mut self.name,
            "description" | "descripcion" | "desc" => &mut self.description,
            "price" | "precio" => &mut self.price,
            "quantity" | "cantidad" | "qty" => &mut self.quantity,
            _ => return Err(unknown_field::<Self>(field)),
        };
        *slot = value.to_string();
        Ok(())
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("price", self.price.clone()),
            ("quantity", self.quantity.clone()),
        ]
    }

    fn draft(&self) -> Result<ProductDraft, FormError> {
        let name = required("name", &self.name)?;
        let description = self.description.trim();
        Ok(ProductDraft {
            name,
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
            price: parse_price(&self.price)?,
            quantity: parse_quantity(&self.quantity)?,
        })
    }
}

/// Builds a partial update from whichever fields were given.
pub fn product_patch(
    name: Option<&str>,
    description: Option<&str>,
    price: Option<&str>,
    quantity: Option<&str>,
) -> Result<ProductPatch, FormError> {
    Ok(ProductPatch {
        name: name.map(|n| required("name", n)).transpose()?,
        description: description.map(|d| d.trim().to_string()),
        price: price.map(parse_price).transpose()?,
        quantity: quantity.map(parse_quantity).transpose()?,
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
}

impl Fields for UserFields {
    type Record = User;

    const NAMES: &'static [&'static str] = &["name", "email"];

    fn from_record(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        let slot = match field.trim().to_lowercase().as_str() {
            "name" | "nombre" => &mut self.name,
            "email" | "correo" => &mut self.email,
            _ => return Err(unknown_field::<Self>(field)),
        };
        *slot = value.to_string();
        Ok(())
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone()), ("email", self.email.clone())]
    }

    fn draft(&self) -> Result<UserDraft, FormError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let valid = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
            .unwrap_or(false);
        if !valid {
            return Err(FormError::InvalidEmail { value: email });
        }
        Ok(UserDraft { name, email })
    }
}
