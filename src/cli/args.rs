use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalogctl",
    version,
    about = "terminal client for the product and user catalog API",
    long_about = "catalogctl lists, creates, edits and deletes products and users through the catalog REST API.\n\nExamples:\n  catalogctl products list\n  catalogctl products add --name \"Teclado\" --price 15.50 --quantity 4\n  catalogctl users edit 3 --email ana@example.com\n  catalogctl --base-url http://localhost:9080 console\n\nTip: Use --config to persist the backend URL and retry settings."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Table output format (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.catalogctl/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'u',
        long = "base-url",
        visible_alias = "url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Backend root URL (default http://localhost:8080)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        global = true,
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        long = "max-attempts",
        value_name = "N",
        global = true,
        help_heading = "Loading",
        help = "Attempts made to load the product list before giving up."
    )]
    pub max_attempts: Option<u32>,

    #[arg(
        long = "backoff-step",
        value_name = "MS",
        global = true,
        help_heading = "Loading",
        help = "Backoff step in milliseconds; attempt n waits (n-1) steps."
    )]
    pub backoff_step_ms: Option<u64>,

    #[arg(
        long = "no-seed",
        global = true,
        help_heading = "Loading",
        help = "Do not create sample products when the catalog starts out empty."
    )]
    pub no_seed: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage products.
    #[command(visible_alias = "p")]
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage users.
    #[command(visible_alias = "u")]
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Show the backend readiness report.
    Health,

    /// Interactive session (default when no command is given).
    Console {
        #[arg(long = "users", help = "Start on the user view.")]
        users: bool,
    },

    /// Write a commented default config file if none exists.
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductAction {
    /// List products, retrying and seeding as needed.
    #[command(visible_alias = "ls")]
    List,

    /// Show one product.
    Show { id: i64 },

    /// Create a product.
    Add {
        #[command(flatten)]
        fields: ProductFieldArgs,
    },

    /// Replace a product; fields not given keep their saved values.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ProductFieldArgs,
    },

    /// Partially update a product; only the given fields are sent.
    Patch {
        id: i64,
        #[command(flatten)]
        fields: ProductFieldArgs,
    },

    /// Delete a product after confirmation.
    #[command(visible_alias = "rm")]
    Delete {
        id: i64,
        #[arg(short = 'y', long = "yes", help = "Skip the confirmation prompt.")]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProductFieldArgs {
    #[arg(long = "name", value_name = "TEXT")]
    pub name: Option<String>,

    #[arg(long = "description", visible_alias = "desc", value_name = "TEXT")]
    pub description: Option<String>,

    #[arg(long = "price", value_name = "DECIMAL")]
    pub price: Option<String>,

    #[arg(long = "quantity", visible_alias = "qty", value_name = "N")]
    pub quantity: Option<String>,
}

impl ProductFieldArgs {
    pub fn assignments(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(v) = self.name.as_deref() {
            out.push(("name", v));
        }
        if let Some(v) = self.description.as_deref() {
            out.push(("description", v));
        }
        if let Some(v) = self.price.as_deref() {
            out.push(("price", v));
        }
        if let Some(v) = self.quantity.as_deref() {
            out.push(("quantity", v));
        }
        out
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserAction {
    /// List users.
    #[command(visible_alias = "ls")]
    List,

    /// Show one user.
    Show { id: i64 },

    /// Create a user.
    Add {
        #[command(flatten)]
        fields: UserFieldArgs,
    },

    /// Replace a user; fields not given keep their saved values.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: UserFieldArgs,
    },

    /// Delete a user.
    #[command(visible_alias = "rm")]
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserFieldArgs {
    #[arg(long = "name", value_name = "TEXT")]
    pub name: Option<String>,

    #[arg(long = "email", value_name = "ADDRESS")]
    pub email: Option<String>,
}

impl UserFieldArgs {
    pub fn assignments(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(v) = self.name.as_deref() {
            out.push(("name", v));
        }
        if let Some(v) = self.email.as_deref() {
            out.push(("email", v));
        }
        out
    }
}
