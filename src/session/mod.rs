//! Interactive console: the terminal counterpart of the product and user
//! pages. One line is one command; state (form mode, loader attempts,
//! pending deletion) lives in the managers between lines.

use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::api::{Collection, PatchProducts};
use crate::form::{Fields, FormMode};
use crate::manager::{ProductManager, UserManager};
use crate::model::{Product, User};
use crate::output::{Severity, Surface};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Products,
    Users,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Switch(View),
    List,
    Retry,
    New,
    Edit(i64),
    Show(i64),
    Set { field: String, value: String },
    Form,
    Save,
    Cancel,
    Delete(i64),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let need_id = |verb: &str| -> Result<i64, String> {
        if rest.is_empty() {
            return Err(format!("usage: {verb} <id>"));
        }
        crate::utils::parse_id(rest)
    };

    let cmd = match head.to_lowercase().as_str() {
        "products" | "p" => ConsoleCommand::Switch(View::Products),
        "users" | "u" => ConsoleCommand::Switch(View::Users),
        "list" | "ls" | "reload" => ConsoleCommand::List,
        "retry" => ConsoleCommand::Retry,
        "new" => ConsoleCommand::New,
        "edit" => ConsoleCommand::Edit(need_id("edit")?),
        "show" => ConsoleCommand::Show(need_id("show")?),
        "set" => {
            let first = rest.split(char::is_whitespace).next().unwrap_or("");
            let (field, value) = if first.contains('=') {
                rest.split_once('=')
                    .map(|(f, v)| (f.trim(), v.trim()))
                    .unwrap_or((rest, ""))
            } else {
                match rest.split_once(char::is_whitespace) {
                    Some((f, v)) => (f, v.trim()),
                    None => (rest, ""),
                }
            };
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            ConsoleCommand::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "form" => ConsoleCommand::Form,
        "save" => ConsoleCommand::Save,
        "cancel" => ConsoleCommand::Cancel,
        "delete" | "rm" => ConsoleCommand::Delete(need_id("delete")?),
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}', type `help`")),
    };
    Ok(Some(cmd))
}

pub const HELP: &str = "\
Commands:
  products | users      switch view and load its list
  list                  reload the current list
  retry                 restart product loading from the first attempt
  new                   clear the form (create mode)
  edit <id>             load a record into the form (update mode)
  show <id>             show one record
  set <field> <value>   change a form field
  form                  show the form
  save                  create or update from the form
  cancel                clear the form
  delete <id>           delete a record (products ask for confirmation)
  help                  this text
  quit                  leave
";

pub struct Session<PC, UC> {
    view: View,
    products: ProductManager<PC>,
    users: UserManager<UC>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl<PC, UC> Session<PC, UC>
where
    PC: Collection<Product> + PatchProducts,
    UC: Collection<User>,
{
    pub fn new(view: View, products: ProductManager<PC>, users: UserManager<UC>) -> Self {
        Self {
            view,
            products,
            users,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn products(&self) -> &ProductManager<PC> {
        &self.products
    }

    pub fn users(&self) -> &UserManager<UC> {
        &self.users
    }

    pub fn prompt(&self) -> String {
        let view = match self.view {
            View::Products => "products",
            View::Users => "users",
        };
        if self.products.pending_delete().is_some() {
            return "confirm [y/N]> ".to_string();
        }
        let mode = match self.view {
            View::Products => self.products.form().mode(),
            View::Users => self.users.mode(),
        };
        match mode {
            FormMode::Idle => format!("{view}> "),
            FormMode::Editing(id) => format!("{view} (editing #{id})> "),
        }
    }

    /// Loads the current view the way opening its page would: the product
    /// loader always starts again from attempt one.
    pub async fn start<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.load_view(surface).await;
    }

    async fn load_view<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        match self.view {
            View::Products => {
                self.products.retry(surface).await;
            }
            View::Users => {
                let _ = self.users.load(surface).await;
            }
        }
    }

    /// Handles one input line. While a product deletion is pending the line
    /// is read as the answer to the confirmation question.
    pub async fn handle_line<S: Surface + ?Sized>(
        &mut self,
        line: &str,
        surface: &mut S,
    ) -> Flow {
        if self.products.pending_delete().is_some() {
            if crate::utils::is_affirmative(line) {
                let _ = self.products.confirm_delete(surface).await;
            } else {
                self.products.cancel_delete();
                surface.notice(Severity::Info, "Deletion cancelled");
            }
            return Flow::Continue;
        }

        match parse_command(line) {
            Ok(Some(cmd)) => self.handle(cmd, surface).await,
            Ok(None) => Flow::Continue,
            Err(e) => {
                surface.notice(Severity::Warning, &e);
                Flow::Continue
            }
        }
    }

    pub async fn handle<S: Surface + ?Sized>(
        &mut self,
        cmd: ConsoleCommand,
        surface: &mut S,
    ) -> Flow {
        debug!("console command {cmd:?} on {:?}", self.view);
        match cmd {
            ConsoleCommand::Switch(view) => {
                self.view = view;
                self.load_view(surface).await;
            }
            ConsoleCommand::List => self.load_view(surface).await,
            ConsoleCommand::Retry => {
                if self.view == View::Products {
                    self.products.retry(surface).await;
                } else {
                    let _ = self.users.load(surface).await;
                }
            }
            ConsoleCommand::New => match self.view {
                View::Products => self.products.new_product(),
                View::Users => self.users.cancel_edit(),
            },
            ConsoleCommand::Edit(id) => {
                let loaded = match self.view {
                    View::Products => self.products.begin_edit(id, surface).await.is_ok(),
                    View::Users => self.users.begin_edit(id, surface).await.is_ok(),
                };
                if loaded {
                    self.show_form(surface);
                }
            }
            ConsoleCommand::Show(id) => {
                let _ = match self.view {
                    View::Products => self.products.show(id, surface).await.map(|_| ()),
                    View::Users => self.users.show(id, surface).await.map(|_| ()),
                };
            }
            ConsoleCommand::Set { field, value } => {
                let result = match self.view {
                    View::Products => self.products.form_mut().set(&field, &value),
                    View::Users => self.users.form_mut().set(&field, &value),
                };
                if let Err(e) = result {
                    surface.notice(Severity::Warning, &e.to_string());
                }
            }
            ConsoleCommand::Form => self.show_form(surface),
            ConsoleCommand::Save => {
                let _ = match self.view {
                    View::Products => self.products.save(surface).await,
                    View::Users => self.users.save(surface).await,
                };
            }
            ConsoleCommand::Cancel => match self.view {
                View::Products => self.products.new_product(),
                View::Users => self.users.cancel_edit(),
            },
            ConsoleCommand::Delete(id) => match self.view {
                View::Products => {
                    self.products.request_delete(id);
                    surface.notice(
                        Severity::Warning,
                        &format!("Delete product #{id}? Answer y to confirm."),
                    );
                }
                View::Users => {
                    let _ = self.users.delete(id, surface).await;
                }
            },
            ConsoleCommand::Help => surface.status_line(HELP.trim_end()),
            ConsoleCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn show_form<S: Surface + ?Sized>(&self, surface: &mut S) {
        let (title, entries) = match self.view {
            View::Products => {
                let form = self.products.form();
                let title = match form.mode() {
                    FormMode::Idle => "New product".to_string(),
                    FormMode::Editing(id) => format!("Edit product #{id}"),
                };
                (title, form.fields().entries())
            }
            View::Users => {
                let form = self.users.form();
                let title = match form.mode() {
                    FormMode::Idle => "New user".to_string(),
                    FormMode::Editing(id) => format!("Edit user #{id}"),
                };
                (title, form.fields().entries())
            }
        };
        let mut text = format!("{title}\n");
        for (name, value) in entries {
            text.push_str(&format!("  {name:<12} {value}\n"));
        }
        surface.status_line(text.trim_end());
    }

    /// Reads commands until `quit` or end of input. A line that is not
    /// valid UTF-8 is skipped with a warning.
    pub async fn run<R, W, S>(
        &mut self,
        mut input: R,
        mut prompt_out: W,
        surface: &mut S,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Surface + ?Sized,
    {
        self.start(surface).await;
        let mut buf = Vec::new();
        loop {
            prompt_out.write_all(self.prompt().as_bytes()).await?;
            prompt_out.flush().await?;
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(e) => {
                    debug!("skipping undecodable input line: {e}");
                    surface.notice(Severity::Warning, "Ignored a line that is not valid UTF-8");
                    continue;
                }
            };
            if self.handle_line(line, surface).await == Flow::Quit {
                break;
            }
        }
        Ok(())
    }
}
