use std::time::Duration;

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::{OutputFormat, Severity, Surface};
use crate::model::{Product, User};

/// Terminal surface: tagged notices on stderr, tables on stdout and a
/// spinner while the loader waits on the backend.
pub struct Console {
    format: OutputFormat,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
}

impl Console {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            spinner: None,
            show_spinner: true,
        }
    }

    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    fn tag(severity: Severity) -> ColoredString {
        let tag = severity.tag().bold();
        match severity {
            Severity::Info => tag.blue(),
            Severity::Success => tag.green(),
            Severity::Warning => tag.yellow(),
            Severity::Danger => tag.red(),
        }
    }

    fn emit_err(&self, line: String) {
        match self.spinner.as_ref() {
            Some(pb) => pb.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn emit_out(&self, text: &str) {
        match self.spinner.as_ref() {
            Some(pb) => pb.suspend(|| print!("{text}")),
            None => print!("{text}"),
        }
    }

    pub fn kv_line(&self, label: &str, value: &str) {
        self.emit_err(format!(":: {:<10}: {}", label, value));
    }
}

impl Surface for Console {
    fn notice(&mut self, severity: Severity, message: &str) {
        self.emit_err(format!(
            "{}{}{} {}",
            "[".bold().white(),
            Self::tag(severity),
            "]".bold().white(),
            message
        ));
    }

    fn products(&mut self, products: &[Product]) {
        let rendered = match self.format {
            OutputFormat::Text => super::render_product_table(products),
            OutputFormat::Json => format!("{}\n", super::render_json(products)),
        };
        self.emit_out(&rendered);
    }

    fn users(&mut self, users: &[User]) {
        let rendered = match self.format {
            OutputFormat::Text => {
                if users.is_empty() {
                    "No users available\n".to_string()
                } else {
                    super::render_user_table(users)
                }
            }
            OutputFormat::Json => format!("{}\n", super::render_json(users)),
        };
        self.emit_out(&rendered);
    }

    fn status_line(&mut self, line: &str) {
        if self.format == OutputFormat::Json {
            self.emit_err(format!(":: {line}"));
        } else {
            self.emit_out(&format!("{}\n", line.dimmed()));
        }
    }

    fn progress(&mut self, message: Option<&str>) {
        match message {
            Some(message) if self.show_spinner => {
                let pb = self.spinner.get_or_insert_with(|| {
                    let pb = ProgressBar::new_spinner();
                    pb.set_draw_target(ProgressDrawTarget::stderr());
                    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]")
                    {
                        pb.set_style(style);
                    }
                    pb.enable_steady_tick(Duration::from_millis(120));
                    pb
                });
                pb.set_message(message.to_string());
            }
            Some(message) => self.status_line(message),
            None => {
                if let Some(pb) = self.spinner.take() {
                    pb.finish_and_clear();
                }
            }
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}
