use log::{error, info};

use super::FlowError;
use crate::api::{Collection, PatchProducts};
use crate::form::{ProductForm, SubmitIntent};
use crate::loader::{LoadOutcome, ProductLoader, RetryPolicy};
use crate::model::{Product, ProductPatch};
use crate::output::{Severity, Surface};

/// Product page state: the loader, the form and the id awaiting a delete
/// confirmation. Every successful mutation restarts the loader from
/// attempt one.
pub struct ProductManager<C> {
    products: C,
    loader: ProductLoader,
    form: ProductForm,
    pending_delete: Option<i64>,
    snapshot: Vec<Product>,
}

impl<C: Collection<Product>> ProductManager<C> {
    pub fn new(products: C, policy: RetryPolicy) -> Self {
        Self {
            products,
            loader: ProductLoader::new(policy),
            form: ProductForm::new(),
            pending_delete: None,
            snapshot: Vec::new(),
        }
    }

    pub fn collection(&self) -> &C {
        &self.products
    }

    pub fn loader(&self) -> &ProductLoader {
        &self.loader
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    /// Products from the latest successful list fetch.
    pub fn snapshot(&self) -> &[Product] {
        &self.snapshot
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    pub async fn load<S: Surface + ?Sized>(&mut self, surface: &mut S) -> LoadOutcome {
        let outcome = self.loader.load(&self.products, surface).await;
        self.remember(&outcome);
        outcome
    }

    pub async fn retry<S: Surface + ?Sized>(&mut self, surface: &mut S) -> LoadOutcome {
        let outcome = self.loader.retry(&self.products, surface).await;
        self.remember(&outcome);
        outcome
    }

    fn remember(&mut self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(list) => self.snapshot = list.clone(),
            LoadOutcome::Empty => self.snapshot.clear(),
            LoadOutcome::Failed(_) => {}
        }
    }

    pub fn new_product(&mut self) {
        self.form.reset();
    }

    pub async fn show<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        surface: &mut S,
    ) -> Result<Product, FlowError> {
        match self.products.get(id).await {
            Ok(product) => {
                surface.products(std::slice::from_ref(&product));
                Ok(product)
            }
            Err(err) => {
                error!("failed to fetch product {id}: {err}");
                surface.notice(Severity::Danger, "Failed to load product data");
                Err(err.into())
            }
        }
    }

    /// Fetches the product and fills the form with it.
    pub async fn begin_edit<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        surface: &mut S,
    ) -> Result<(), FlowError> {
        match self.products.get(id).await {
            Ok(product) => {
                self.form.populate(&product);
                Ok(())
            }
            Err(err) => {
                error!("failed to load product {id} for editing: {err}");
                surface.notice(Severity::Danger, "Failed to load product data");
                Err(err.into())
            }
        }
    }

    pub async fn save<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<(), FlowError> {
        let (intent, draft) = match self.form.submit() {
            Ok(submission) => submission,
            Err(err) => {
                surface.notice(Severity::Warning, &err.to_string());
                return Err(err.into());
            }
        };

        let (result, verb) = match intent {
            SubmitIntent::Create => (self.products.create(&draft).await, "create"),
            SubmitIntent::Update(id) => (self.products.replace(id, &draft).await, "update"),
        };

        match result {
            Ok(()) => {
                info!("product {verb} succeeded for '{}'", draft.name);
                let done = if verb == "create" { "created" } else { "updated" };
                surface.notice(Severity::Success, &format!("Product {done} successfully"));
                self.form.reset();
                self.retry(surface).await;
                Ok(())
            }
            Err(err) => {
                error!("product {verb} failed: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to {verb} product: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }

    pub fn request_delete(&mut self, id: i64) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<(), FlowError> {
        let id = self
            .pending_delete
            .ok_or(FlowError::NothingPending("product"))?;
        match self.products.delete(id).await {
            Ok(()) => {
                info!("deleted product {id}");
                self.pending_delete = None;
                surface.notice(Severity::Success, "Product deleted successfully");
                self.retry(surface).await;
                Ok(())
            }
            Err(err) => {
                error!("failed to delete product {id}: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to delete product: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }
}

impl<C: Collection<Product> + PatchProducts> ProductManager<C> {
    pub async fn patch<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        patch: &ProductPatch,
        surface: &mut S,
    ) -> Result<(), FlowError> {
        if patch.is_empty() {
            surface.notice(Severity::Warning, "Nothing to update");
            return Err(FlowError::EmptyPatch);
        }
        match self.products.patch(id, patch).await {
            Ok(()) => {
                info!("patched product {id}");
                surface.notice(Severity::Success, "Product updated successfully");
                self.retry(surface).await;
                Ok(())
            }
            Err(err) => {
                error!("failed to patch product {id}: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to update product: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }
}
