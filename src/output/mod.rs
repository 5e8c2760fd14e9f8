pub mod console;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::loader::LoadEvent;
use crate::model::{Product, User};

pub use console::Console;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INF",
            Severity::Success => "OK",
            Severity::Warning => "WRN",
            Severity::Danger => "ERR",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Where the managers put what the user sees: notices, tables and the
/// single status line that stands in for a table body while loading.
pub trait Surface {
    fn notice(&mut self, severity: Severity, message: &str);

    fn products(&mut self, products: &[Product]);

    fn users(&mut self, users: &[User]);

    fn status_line(&mut self, line: &str);

    /// `Some` while waiting on the backend, `None` once the wait is over.
    fn progress(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            self.status_line(message);
        }
    }

    fn load_event(&mut self, event: &LoadEvent<'_>) {
        match event {
            LoadEvent::Loading {
                attempt,
                max_attempts,
            } => {
                self.progress(Some(&format!(
                    "Loading products (attempt {attempt}/{max_attempts})..."
                )));
            }
            LoadEvent::Retrying {
                attempt,
                max_attempts,
                remaining,
                delay,
                ..
            } => {
                self.progress(None);
                self.notice(
                    Severity::Warning,
                    &format!(
                        "Failed to load products. Retrying in {} seconds...",
                        delay.as_secs_f64()
                    ),
                );
                self.progress(Some(&format!(
                    "Retrying connection ({attempt}/{max_attempts}), {remaining} attempt(s) left..."
                )));
            }
            LoadEvent::Seeding => {
                self.progress(None);
                self.notice(
                    Severity::Info,
                    "No products in the database. Creating sample data...",
                );
            }
            LoadEvent::SeedRejected { name, error } => {
                self.notice(
                    Severity::Warning,
                    &format!(
                        "Failed to create sample product '{name}': {}",
                        error.user_message()
                    ),
                );
            }
            LoadEvent::Seeded { created, total } if created == total => {
                self.notice(Severity::Success, "Sample data created successfully");
            }
            LoadEvent::Seeded { created, total } => {
                self.notice(
                    Severity::Warning,
                    &format!("Created {created} of {total} sample products"),
                );
            }
            LoadEvent::SeedFailed { error, .. } => {
                self.notice(
                    Severity::Danger,
                    &format!("Failed to create sample data: {}", error.user_message()),
                );
            }
            LoadEvent::Loaded { products } => {
                self.progress(None);
                self.products(products);
            }
            LoadEvent::Empty => {
                self.progress(None);
                self.status_line("No products available");
            }
            LoadEvent::Failed { .. } => {
                self.progress(None);
                self.notice(
                    Severity::Danger,
                    "Failed to load products. Please check the database connection.",
                );
                self.status_line("Database connection error. Use `retry` to try again.");
            }
        }
    }
}

pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price.round_dp(2))
}

pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(ts) => ts.format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => "N/A".to_string(),
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[String]| {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&header_cells);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&rule);
    for row in rows {
        push_row(row);
    }
    out
}

pub fn render_product_table(products: &[Product]) -> String {
    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.description
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .unwrap_or("-")
                    .to_string(),
                format_price(p.price),
                p.quantity.to_string(),
                format_timestamp(p.created_at),
            ]
        })
        .collect();
    render_table(
        &["ID", "Name", "Description", "Price", "Quantity", "Created"],
        &rows,
    )
}

pub fn render_user_table(users: &[User]) -> String {
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone()])
        .collect();
    render_table(&["ID", "Name", "Email"], &rows)
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}
