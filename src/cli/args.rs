use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ecopack",
    version,
    about = "packaging material recommendation client",
    long_about = "EcoPack submits product requirements to a packaging recommendation backend and renders the ranked materials it returns.\n\nExamples:\n  ecopack --weight 2 --fragility high --water-resistant\n  ecopack -d catalog --weight 5 --strength 3 -o report.html\n  ecopack -d predict --field biodegradability_score=80 --field recyclability_percent=60\n\nTip: Use --config to persist the backend URL and custom deployments."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        long = "nch",
        visible_alias = "no-chart",
        help_heading = "Output",
        help = "Do not draw the cost / CO₂ chart."
    )]
    pub no_chart: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Backend",
        help = "Backend base URL (e.g. http://127.0.0.1:5000)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'd',
        long = "dep",
        visible_alias = "deployment",
        value_name = "NAME",
        help_heading = "Backend",
        help = "Deployment field-mapping table to use (recommend, catalog, predict, product or a config entry)."
    )]
    pub deployment: Option<String>,

    #[arg(
        long = "ld",
        visible_alias = "list-deployments",
        help_heading = "Backend",
        help = "List known deployments and their request fields, then exit."
    )]
    pub list_deployments: bool,

    #[arg(
        long = "hc",
        visible_alias = "health",
        help_heading = "Backend",
        help = "Probe the backend health endpoint, then exit."
    )]
    pub health: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Backend",
        help = "Path to config file (defaults to ~/.ecopack/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Backend",
        help = "Write a commented default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'k',
        long = "key",
        visible_alias = "api-key",
        value_name = "KEY",
        help_heading = "HTTP",
        help = "API key sent as X-API-KEY."
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "cat",
        visible_alias = "category",
        value_name = "NAME",
        help_heading = "Product",
        help = "Product category (e.g. Electronics, Food)."
    )]
    pub category: Option<String>,

    #[arg(
        short = 'w',
        long = "wt",
        visible_alias = "weight",
        value_name = "KG",
        help_heading = "Product",
        help = "Product weight or required weight capacity in kg."
    )]
    pub weight: Option<String>,

    #[arg(
        short = 'f',
        long = "frg",
        visible_alias = "fragility",
        value_name = "LEVEL",
        help_heading = "Product",
        help = "Fragility level (low, medium, high)."
    )]
    pub fragility: Option<String>,

    #[arg(
        short = 's',
        long = "str",
        visible_alias = "strength",
        value_name = "N",
        help_heading = "Product",
        help = "Required strength rating."
    )]
    pub strength: Option<String>,

    #[arg(
        short = 'W',
        long = "wr",
        visible_alias = "water-resistant",
        help_heading = "Product",
        help = "Require water resistance."
    )]
    pub water_resistant: bool,

    #[arg(
        short = 'b',
        long = "bio",
        visible_alias = "biodegradability",
        value_name = "0-100",
        help_heading = "Product",
        help = "Biodegradability score."
    )]
    pub biodegradability: Option<String>,

    #[arg(
        short = 'r',
        long = "rec",
        visible_alias = "recyclability",
        value_name = "0-100",
        help_heading = "Product",
        help = "Recyclability percent."
    )]
    pub recyclability: Option<String>,

    #[arg(
        short = 'e',
        long = "ce",
        visible_alias = "cost-efficiency",
        value_name = "N",
        help_heading = "Product",
        help = "Cost efficiency score."
    )]
    pub cost_efficiency: Option<String>,

    #[arg(
        short = 'P',
        long = "pid",
        visible_alias = "product-id",
        value_name = "ID",
        help_heading = "Product",
        help = "Catalog product id (product deployment)."
    )]
    pub product_id: Option<String>,

    #[arg(
        short = 'F',
        long = "fld",
        visible_alias = "field",
        value_name = "INPUT=VALUE",
        action = ArgAction::Append,
        help_heading = "Product",
        help = "Set any form input by name (repeatable, overrides the named flags)."
    )]
    pub field: Vec<String>,
}
