use crate::cli::args::{CliArgs, Command, ProductAction, UserAction};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if let Some(max_attempts) = args.max_attempts {
        if max_attempts == 0 {
            return Err("invalid max-attempts, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.base_url.as_deref() {
        if reqwest::Url::parse(raw.trim()).is_err() {
            return Err(format!("invalid --base-url '{raw}'"));
        }
    }

    let id = match args.command.as_ref() {
        Some(Command::Products { action }) => match action {
            ProductAction::Show { id }
            | ProductAction::Edit { id, .. }
            | ProductAction::Patch { id, .. }
            | ProductAction::Delete { id, .. } => Some(*id),
            _ => None,
        },
        Some(Command::Users { action }) => match action {
            UserAction::Show { id } | UserAction::Edit { id, .. } | UserAction::Delete { id } => {
                Some(*id)
            }
            _ => None,
        },
        _ => None,
    };
    if let Some(id) = id {
        if id <= 0 {
            return Err(format!("invalid id {id}, expected positive integer"));
        }
    }
    Ok(())
}
