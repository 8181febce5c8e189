use std::error::Error;
use std::path::Path;

use ecopack::config::parse_config;
use ecopack::output::{build_document, render, OutputFormat};
use ecopack::render::terminal::TerminalSurface;
use ecopack::request::FormValues;
use ecopack::runner::{Options, Session};

const CONFIG: &str = r#"
base_url: http://127.0.0.1:8000
deployment: legacy
deployments:
  legacy:
    endpoint: /v1/materials/rank
    request:
      - { name: weight, key: max_weight, input: weight, kind: number }
      - { name: fragility, key: fragile, input: fragile, kind: flag }
    response:
      list_key: items
      material: [name]
      cost: [price]
      co2: [carbon]
    display:
      currency: "$"
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cfg = parse_config(CONFIG, Path::new("inline.yml"))?;
    let options = Options {
        base_url: cfg.base_url.clone().unwrap_or_default(),
        deployment: cfg.deployment.clone().unwrap_or_default(),
        custom_deployments: cfg.custom_deployments(),
        ..Options::default()
    };

    let mut session = Session::connect(&options, TerminalSurface::new(false))?;
    let form = FormValues::new()
        .with("weight", "4.5")
        .with_check("fragile", true);
    let report = session.submit(&form).await?;

    println!("Request: {}", report.request);
    if let Some(response) = report.response.as_ref() {
        let doc = build_document(&session.mapping().name, response, &session.mapping().display);
        print!("{}", String::from_utf8_lossy(&render(&doc, OutputFormat::Text)));
    }

    Ok(())
}
