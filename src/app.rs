use std::process::ExitCode;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::warn;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::mapping::{self, FieldMapping};
use crate::output::{self, OutputFormat};
use crate::render::terminal::{TerminalChart, TerminalSurface};
use crate::render::StateKind;
use crate::request::FormValues;
use crate::runner::{Options, Session};
use crate::transport::{self, HttpTransport};

fn print_banner() {
    const BANNER: &str = r#"
                                        __
   ___  _________  ____  ____ ______/ /__
  / _ \/ ___/ __ \/ __ \/ __ `/ ___/ //_/
 /  __/ /__/ /_/ / /_/ / /_/ / /__/ ,<
 \___/\___/\____/ .___/\__,_/\___/_/|_|
               /_/
       packaging material recommendations
    "#;
    print!("{}", BANNER.green());
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn arg_flags(arg: &clap::Arg) -> String {
    let mut names: Vec<String> = arg.get_short().map(|c| format!("-{c}")).into_iter().collect();
    if let Some(long) = arg.get_long() {
        names.push(format!("--{long}"));
    }
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        let alias = format!("--{alias}");
        if !names.contains(&alias) {
            names.push(alias);
        }
    }
    let mut flags = names.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|v| v.first())
            .map(|v| v.to_string())
            .unwrap_or_else(|| arg.get_id().as_str().to_uppercase());
        flags.push_str(&format!(" <{value}>"));
    }
    flags
}

fn arg_help(arg: &clap::Arg) -> String {
    let mut help = arg
        .get_help()
        .map(|h| h.to_string().trim().to_string())
        .unwrap_or_default();
    let defaults: Vec<String> = arg
        .get_default_values()
        .iter()
        .map(|v| v.to_string_lossy().into_owned())
        .collect();
    if !defaults.is_empty() && arg.get_action().takes_values() {
        help.push_str(&format!(" [default: {}]", defaults.join(",")));
    }
    help
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let name = cmd.get_name().to_string();
    let mut out = match cmd.get_version() {
        Some(version) => format!("{name} {version}\n"),
        None => format!("{name}\n"),
    };
    if let Some(about) = cmd.get_about() {
        out.push_str(&format!("{about}\n"));
    }
    out.push_str(&format!("\nUsage: {name} [OPTIONS]\n"));

    let mut sections: Vec<(&str, Vec<(String, String)>)> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        let entry = (arg_flags(arg), arg_help(arg));
        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, entries)) => entries.push(entry),
            None => sections.push((heading, vec![entry])),
        }
    }

    for (heading, entries) in sections {
        out.push_str(&format!("\n{heading}:\n"));
        let width = entries.iter().map(|(f, _)| f.len()).max().unwrap_or(0);
        for (flags, help) in entries {
            let line = format!("  {flags:<width$}  {help}");
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    mapping: FieldMapping,
    form: FormValues,
    output_path: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    chart: bool,
    health: bool,
}

fn named_inputs(args: &CliArgs) -> Vec<(&'static str, Option<String>)> {
    vec![
        (mapping::CATEGORY, args.category.clone()),
        (mapping::WEIGHT, args.weight.clone()),
        (mapping::FRAGILITY, args.fragility.clone()),
        (mapping::STRENGTH, args.strength.clone()),
        (mapping::BIODEGRADABILITY, args.biodegradability.clone()),
        (mapping::RECYCLABILITY, args.recyclability.clone()),
        (mapping::COST_EFFICIENCY, args.cost_efficiency.clone()),
        (mapping::PRODUCT_ID, args.product_id.clone()),
    ]
}

/// Fills the deployment's form inputs from the named flags and `--field`
/// assignments. Checkbox inputs are always bound, unchecked by default.
fn build_form(args: &CliArgs, deployment: &FieldMapping) -> Result<FormValues, String> {
    let mut form = FormValues::new();
    for field in deployment.request.iter().filter(|f| f.kind.is_checkbox()) {
        form.check(&field.input, false);
    }

    for (canonical, value) in named_inputs(args) {
        let Some(value) = value else {
            continue;
        };
        match deployment.field(canonical) {
            Some(field) => {
                form.set(&field.input, value);
            }
            None => warn!(
                field = canonical,
                deployment = %deployment.name,
                "deployment has no such field, ignoring flag"
            ),
        }
    }
    if args.water_resistant {
        match deployment.field(mapping::WATER_RESISTANT) {
            Some(field) => {
                form.check(&field.input, true);
            }
            None => warn!(
                deployment = %deployment.name,
                "deployment has no water resistance field, ignoring flag"
            ),
        }
    }

    for raw in args.field.iter() {
        let (input, value) = crate::utils::parse_assignment(raw)
            .map_err(|e| format!("invalid --field '{raw}': {e}"))?;
        match deployment.request.iter().find(|f| f.input == input) {
            Some(field) if field.kind.is_checkbox() => {
                form.check(&input, crate::request::parse_checkbox(&value));
            }
            Some(_) => {
                form.set(&input, value);
            }
            None => warn!(input = %input, deployment = %deployment.name, "unknown form input"),
        }
    }

    let missing: Vec<String> = deployment
        .request
        .iter()
        .filter(|f| !form.has(&f.input))
        .map(|f| f.input.clone())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "deployment '{}' needs input(s): {} (use the named flags or --field INPUT=VALUE)",
            deployment.name,
            missing.join(", ")
        ));
    }
    Ok(form)
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };
    let chart = !args.no_chart && cfg.chart.unwrap_or(true);

    let options = Options {
        base_url: args
            .url
            .clone()
            .or(cfg.base_url.clone())
            .unwrap_or_else(|| Options::default().base_url),
        deployment: args
            .deployment
            .clone()
            .or(cfg.deployment.clone())
            .unwrap_or_else(|| mapping::DEFAULT_DEPLOYMENT.to_string()),
        custom_deployments: cfg.custom_deployments(),
        timeout_seconds: args
            .timeout
            .or(cfg.timeout)
            .unwrap_or(transport::DEFAULT_TIMEOUT_SECONDS),
        proxy: args.proxy.clone().or(cfg.proxy.clone()),
        header: args.header.clone().or(cfg.header.clone()),
        api_key: args.api_key.clone().or(cfg.api_key.clone()),
    };
    if options.timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if reqwest::Url::parse(&options.base_url).is_err() {
        return Err(format!("invalid URL: {}", options.base_url));
    }
    let mapping = options.resolve_mapping().map_err(|e| e.to_string())?;

    let output_path = args
        .output
        .clone()
        .or(cfg.output.clone())
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.clone().or(cfg.output_format.clone()) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        None => output_path
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let form = if args.health {
        FormValues::new()
    } else {
        build_form(&args, &mapping)?
    };

    Ok(RunConfig {
        options,
        mapping,
        form,
        output_path,
        output_format,
        no_color,
        chart,
        health: args.health,
    })
}

fn list_deployments(cfg: &ConfigFile) {
    let mut all = cfg.custom_deployments();
    for builtin in FieldMapping::builtins() {
        if !all.iter().any(|m| m.name == builtin.name) {
            all.push(builtin);
        }
    }
    for m in all.iter() {
        println!("{} {}", m.name.bold(), m.endpoint.dimmed());
        for f in m.request.iter() {
            println!(
                "  {:<16} -> {:<24} input={} ({:?})",
                f.name, f.key, f.input, f.kind
            );
        }
    }
}

async fn run_health(run: &RunConfig) -> Result<ExitCode, String> {
    let transport = HttpTransport::new(&run.options.http_options()).map_err(|e| e.to_string())?;
    match transport.health(transport::HEALTH_PATH).await {
        Ok(status) => {
            format_kv_line("Health", &status.status);
            if let Some(service) = status.service.as_deref() {
                format_kv_line("Service", service);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", "[ERR]".bold().red(), e);
            Ok(ExitCode::from(2))
        }
    }
}

async fn write_output(
    run: &RunConfig,
    path: &str,
    response: &crate::normalize::RecommendationResponse,
) -> Result<(), String> {
    let doc = output::build_document(&run.mapping.name, response, &run.mapping.display);
    let rendered = output::render(&doc, run.output_format);
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<ExitCode, String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    format_kv_line("Backend", &run.options.base_url);
    format_kv_line(
        "Deployment",
        &format!("{} ({})", run.mapping.name, run.mapping.endpoint),
    );
    format_kv_line("Timeout", &format!("{}s", run.options.timeout_seconds));
    if let Some(path) = run.output_path.as_deref() {
        format_kv_line("Output", path);
    }
    println!();

    if run.health {
        return run_health(&run).await;
    }

    let now = Instant::now();
    let surface = TerminalSurface::new(true);
    let report = if run.chart {
        let mut session = Session::connect_with_chart(&run.options, surface, TerminalChart::default())
            .map_err(|e| e.to_string())?;
        session.submit(&run.form).await.map_err(|e| e.to_string())?
    } else {
        let mut session = Session::connect(&run.options, surface).map_err(|e| e.to_string())?;
        session.submit(&run.form).await.map_err(|e| e.to_string())?
    };

    if let (Some(path), Some(response)) = (run.output_path.as_deref(), report.response.as_ref()) {
        write_output(&run, path, response).await?;
    }

    println!();
    println!(
        ":: Completed :: request took {}ms ::",
        now.elapsed().as_millis()
    );

    Ok(match report.state {
        StateKind::Error => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

pub fn run_cli() -> Result<ExitCode, String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(ExitCode::SUCCESS);
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(ExitCode::SUCCESS);
            }
            _ => return Err(e.to_string()),
        },
    };
    init_logging(args.verbose);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if args.init_config {
        let path = user_config_path
            .clone()
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path".to_string())?;
        let created = config::ensure_default_config_file(&path).map_err(|e| e.to_string())?;
        let verb = if created { "wrote" } else { "kept existing" };
        println!("{verb} {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false).map_err(|e| e.to_string())?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true).map_err(|e| e.to_string())?,
            None => ConfigFile::default(),
        },
    };

    if args.list_deployments {
        list_deployments(&cfg);
        return Ok(ExitCode::SUCCESS);
    }

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
