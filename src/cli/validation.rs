use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    for raw in args.field.iter() {
        crate::utils::parse_assignment(raw).map_err(|e| format!("invalid --field '{raw}': {e}"))?;
    }
    for (flag, value) in [
        ("--biodegradability", args.biodegradability.as_deref()),
        ("--recyclability", args.recyclability.as_deref()),
    ] {
        if let Some(raw) = value {
            if let Some(n) = crate::request::coerce_number(raw) {
                if !(0.0..=100.0).contains(&n) {
                    return Err(format!("invalid {flag} '{raw}', expected 0-100"));
                }
            }
        }
    }
    Ok(())
}
