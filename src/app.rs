use std::process::ExitCode;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::api::health::HealthReport;
use crate::api::{self, ApiClient, ClientOptions, RestCollection};
use crate::cli::args::{
    CliArgs, Command, ProductAction, ProductFieldArgs, UserAction, UserFieldArgs,
};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::form;
use crate::loader::{LoadOutcome, RetryPolicy};
use crate::manager::{FlowError, ProductManager, UserManager};
use crate::model::{Product, User};
use crate::output::{Console, OutputFormat, Severity, Surface};
use crate::session::{Session, View};

fn print_banner() {
    const BANNER: &str = r#"
             __        __            __  __
  _________ _/ /_____ _/ /___  ____ _/ /_/ /
 / ___/ __ `/ __/ __ `/ / __ \/ __ `/ __/ /
/ /__/ /_/ / /_/ /_/ / / /_/ / /_/ / /_/ /
\___/\__,_/\__/\__,_/_/\____/\__, /\__/_/
                            /____/"#;
    eprintln!("{}", BANNER);
    eprintln!(
        "       v{} - catalog console (type `help`)\n",
        env!("CARGO_PKG_VERSION")
    );
}

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    products_path: String,
    users_path: String,
    health_path: String,
    policy: RetryPolicy,
    output_format: OutputFormat,
    no_color: bool,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let output_format_raw = args
        .output_format
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let output_format = OutputFormat::parse(&output_format_raw)
        .ok_or_else(|| format!("invalid output format '{output_format_raw}'"))?;

    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());
    if let Some(raw) = header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }

    let client = ClientOptions {
        base_url: args
            .base_url
            .or(cfg.base_url)
            .unwrap_or_else(|| api::DEFAULT_BASE_URL.to_string()),
        timeout_seconds: args.timeout.or(cfg.timeout).unwrap_or(10),
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        header,
    };
    if reqwest::Url::parse(client.base_url.trim()).is_err() {
        return Err(format!("invalid base URL '{}'", client.base_url));
    }

    let max_attempts = args
        .max_attempts
        .or(cfg.max_attempts)
        .unwrap_or(crate::loader::MAX_ATTEMPTS);
    if max_attempts == 0 {
        return Err("invalid max_attempts, expected positive integer".to_string());
    }
    let policy = RetryPolicy {
        max_attempts,
        backoff_step: args
            .backoff_step_ms
            .or(cfg.backoff_step_ms)
            .map(Duration::from_millis)
            .unwrap_or(crate::loader::BACKOFF_STEP),
        seed_on_empty: !args.no_seed && cfg.seed_on_empty.unwrap_or(true),
    };

    let products_path = crate::utils::normalize_resource_path(
        cfg.products_path.as_deref().unwrap_or(api::PRODUCTS_PATH),
    );
    let users_path =
        crate::utils::normalize_resource_path(cfg.users_path.as_deref().unwrap_or(api::USERS_PATH));
    let health_path = crate::utils::normalize_resource_path(
        cfg.health_path.as_deref().unwrap_or(api::HEALTH_PATH),
    );

    Ok(RunConfig {
        client,
        products_path,
        users_path,
        health_path,
        policy,
        output_format,
        no_color,
        command: args.command.unwrap_or(Command::Console { users: false }),
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("catalogctl={level}")),
    )
    .format_timestamp(None)
    .try_init();
}

async fn confirm_on_stdin(question: &str) -> Result<bool, String> {
    let mut stderr = tokio::io::stderr();
    stderr
        .write_all(format!("{question} [y/N] ").as_bytes())
        .await
        .map_err(|e| format!("failed to write prompt: {e}"))?;
    stderr
        .flush()
        .await
        .map_err(|e| format!("failed to write prompt: {e}"))?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read answer: {e}"))?
        .unwrap_or_default();
    Ok(crate::utils::is_affirmative(&answer))
}

fn reported<T>(
    result: Result<T, form::FormError>,
    console: &mut Console,
) -> Result<T, FlowError> {
    result.map_err(|e| {
        console.notice(Severity::Warning, &e.to_string());
        FlowError::Form(e)
    })
}

fn apply_product_fields(
    manager: &mut ProductManager<RestCollection<Product>>,
    fields: &ProductFieldArgs,
    console: &mut Console,
) -> Result<(), FlowError> {
    for (name, value) in fields.assignments() {
        reported(manager.form_mut().set(name, value), console)?;
    }
    Ok(())
}

fn apply_user_fields(
    manager: &mut UserManager<RestCollection<User>>,
    fields: &UserFieldArgs,
    console: &mut Console,
) -> Result<(), FlowError> {
    for (name, value) in fields.assignments() {
        reported(manager.form_mut().set(name, value), console)?;
    }
    Ok(())
}

async fn run_products(
    action: ProductAction,
    manager: &mut ProductManager<RestCollection<Product>>,
    console: &mut Console,
) -> Result<(), FlowError> {
    match action {
        ProductAction::List => match manager.load(console).await {
            LoadOutcome::Failed(err) => Err(err.into()),
            LoadOutcome::Loaded(_) | LoadOutcome::Empty => Ok(()),
        },
        ProductAction::Show { id } => manager.show(id, console).await.map(|_| ()),
        ProductAction::Add { fields } => {
            manager.new_product();
            apply_product_fields(manager, &fields, console)?;
            manager.save(console).await
        }
        ProductAction::Edit { id, fields } => {
            manager.begin_edit(id, console).await?;
            apply_product_fields(manager, &fields, console)?;
            manager.save(console).await
        }
        ProductAction::Patch { id, fields } => {
            let patch = reported(
                form::product_patch(
                    fields.name.as_deref(),
                    fields.description.as_deref(),
                    fields.price.as_deref(),
                    fields.quantity.as_deref(),
                ),
                console,
            )?;
            manager.patch(id, &patch, console).await
        }
        ProductAction::Delete { id, yes } => {
            let confirmed = yes
                || confirm_on_stdin(&format!("Delete product #{id}?"))
                    .await
                    .unwrap_or(false);
            if !confirmed {
                console.notice(Severity::Info, "Deletion cancelled");
                return Ok(());
            }
            manager.request_delete(id);
            manager.confirm_delete(console).await
        }
    }
}

async fn run_users(
    action: UserAction,
    manager: &mut UserManager<RestCollection<User>>,
    console: &mut Console,
) -> Result<(), FlowError> {
    match action {
        UserAction::List => manager.load(console).await,
        UserAction::Show { id } => manager.show(id, console).await.map(|_| ()),
        UserAction::Add { fields } => {
            manager.cancel_edit();
            apply_user_fields(manager, &fields, console)?;
            manager.save(console).await
        }
        UserAction::Edit { id, fields } => {
            manager.begin_edit(id, console).await?;
            apply_user_fields(manager, &fields, console)?;
            manager.save(console).await
        }
        UserAction::Delete { id } => manager.delete(id, console).await,
    }
}

/// Shows a readiness report; a service that is not UP counts as a failure.
pub(crate) fn report_health<S: Surface + ?Sized>(
    report: &HealthReport,
    surface: &mut S,
) -> Result<(), FlowError> {
    let severity = if report.is_up() {
        Severity::Success
    } else {
        Severity::Danger
    };
    surface.notice(severity, &format!("Backend status: {}", report.status));
    for check in report.checks.iter() {
        let severity = if check.is_up() {
            Severity::Info
        } else {
            Severity::Warning
        };
        let data = check.data_summary();
        let line = if data.is_empty() {
            format!("{}: {}", check.name, check.status)
        } else {
            format!("{}: {} ({})", check.name, check.status, data)
        };
        surface.notice(severity, &line);
    }
    if report.is_up() {
        Ok(())
    } else {
        Err(FlowError::NotReady(report.status.clone()))
    }
}

async fn run_health(
    client: &ApiClient,
    path: &str,
    console: &mut Console,
) -> Result<(), FlowError> {
    match api::health::readiness(client, path).await {
        Ok(report) => report_health(&report, console),
        Err(err) => {
            console.notice(
                Severity::Danger,
                &format!("Health check failed: {}", err.user_message()),
            );
            Err(err.into())
        }
    }
}

async fn run_async(run: RunConfig) -> Result<ExitCode, String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let client = ApiClient::new(&run.client).map_err(|e| e.to_string())?;
    let mut products = ProductManager::new(
        RestCollection::<Product>::new(client.clone(), run.products_path.clone()),
        run.policy,
    );
    let mut users = UserManager::new(RestCollection::<User>::new(
        client.clone(),
        run.users_path.clone(),
    ));
    let mut console = Console::new(run.output_format);
    if run.output_format == OutputFormat::Json {
        console = console.without_spinner();
    }

    let result = match run.command {
        Command::Products { action } => run_products(action, &mut products, &mut console).await,
        Command::Users { action } => run_users(action, &mut users, &mut console).await,
        Command::Health => run_health(&client, &run.health_path, &mut console).await,
        Command::Console { users: start_on_users } => {
            print_banner();
            console.kv_line("Backend", client.base_url());
            console.kv_line("Products", &run.products_path);
            console.kv_line("Users", &run.users_path);
            let view = if start_on_users {
                View::Users
            } else {
                View::Products
            };
            let mut session = Session::new(view, products, users);
            session
                .run(
                    BufReader::new(tokio::io::stdin()),
                    tokio::io::stdout(),
                    &mut console,
                )
                .await
                .map_err(|e| format!("console I/O error: {e}"))?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::InitConfig => return Ok(ExitCode::SUCCESS),
    };

    // Failures were already shown as notices by the time they get here.
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            log::debug!("command failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_config(path: Option<String>) -> Result<ExitCode, String> {
    let path = match path {
        Some(p) => config::expand_tilde(&p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!(":: Config    : wrote {}", path.display());
    } else {
        println!(":: Config    : {} already exists", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_cli() -> Result<ExitCode, String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = e.print();
                return Ok(ExitCode::SUCCESS);
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    if matches!(args.command, Some(Command::InitConfig)) {
        return init_config(args.config.clone());
    }

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
