use log::{error, info};

use super::FlowError;
use crate::api::Collection;
use crate::form::{FormMode, SubmitIntent, UserForm};
use crate::model::User;
use crate::output::{Severity, Surface};

/// User page state. No retry policy here: a failed list fetch is reported
/// and left for the user to reload.
pub struct UserManager<C> {
    users: C,
    form: UserForm,
    snapshot: Vec<User>,
}

impl<C: Collection<User>> UserManager<C> {
    pub fn new(users: C) -> Self {
        Self {
            users,
            form: UserForm::new(),
            snapshot: Vec::new(),
        }
    }

    pub fn collection(&self) -> &C {
        &self.users
    }

    pub fn form(&self) -> &UserForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut UserForm {
        &mut self.form
    }

    pub fn mode(&self) -> FormMode {
        self.form.mode()
    }

    pub fn snapshot(&self) -> &[User] {
        &self.snapshot
    }

    pub async fn load<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<(), FlowError> {
        match self.users.list().await {
            Ok(users) => {
                info!("loaded {} users", users.len());
                surface.users(&users);
                self.snapshot = users;
                Ok(())
            }
            Err(err) => {
                error!("failed to load users: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to load users: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }

    pub async fn show<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        surface: &mut S,
    ) -> Result<User, FlowError> {
        match self.users.get(id).await {
            Ok(user) => {
                surface.users(std::slice::from_ref(&user));
                Ok(user)
            }
            Err(err) => {
                error!("failed to fetch user {id}: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to load user: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }

    /// Idle -> Editing(id), only once the record has been fetched.
    pub async fn begin_edit<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        surface: &mut S,
    ) -> Result<(), FlowError> {
        match self.users.get(id).await {
            Ok(user) => {
                self.form.populate(&user);
                Ok(())
            }
            Err(err) => {
                error!("failed to load user {id} for editing: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to load user: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form.reset();
    }

    /// Editing -> Idle on success; a failed save keeps the form as it was.
    pub async fn save<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<(), FlowError> {
        let (intent, draft) = match self.form.submit() {
            Ok(submission) => submission,
            Err(err) => {
                surface.notice(Severity::Warning, &err.to_string());
                return Err(err.into());
            }
        };

        let result = match intent {
            SubmitIntent::Create => self.users.create(&draft).await,
            SubmitIntent::Update(id) => self.users.replace(id, &draft).await,
        };

        match result {
            Ok(()) => {
                let done = match intent {
                    SubmitIntent::Create => "created",
                    SubmitIntent::Update(_) => "updated",
                };
                info!("user {done}: {}", draft.email);
                surface.notice(Severity::Success, &format!("User {done} successfully"));
                self.form.reset();
                // The save already succeeded; a failed reload is reported on its own.
                let _ = self.load(surface).await;
                Ok(())
            }
            Err(err) => {
                error!("failed to save user: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to save user: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }

    pub async fn delete<S: Surface + ?Sized>(
        &mut self,
        id: i64,
        surface: &mut S,
    ) -> Result<(), FlowError> {
        match self.users.delete(id).await {
            Ok(()) => {
                info!("deleted user {id}");
                surface.notice(Severity::Success, "User deleted successfully");
                let _ = self.load(surface).await;
                Ok(())
            }
            Err(err) => {
                error!("failed to delete user {id}: {err}");
                surface.notice(
                    Severity::Danger,
                    &format!("Failed to delete user: {}", err.user_message()),
                );
                Err(err.into())
            }
        }
    }
}
