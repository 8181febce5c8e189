use std::error::Error;

use ecopack::render::terminal::{TerminalChart, TerminalSurface};
use ecopack::request::FormValues;
use ecopack::runner::{Options, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut session = Session::connect_with_chart(
        &Options {
            base_url: "http://127.0.0.1:5000".to_string(),
            deployment: "recommend".to_string(),
            timeout_seconds: 5,
            ..Options::default()
        },
        TerminalSurface::new(true),
        TerminalChart::default(),
    )?;

    let mut form = FormValues::new()
        .with("category", "Electronics")
        .with("weight", "2")
        .with("fragility", "high")
        .with_check("waterResistant", true);
    let report = session.submit(&form).await?;

    println!("State: {:?}", report.state);
    if let Some(response) = report.response.as_ref() {
        println!("Results: {}", response.display_count());
        for r in response.recommendations.iter() {
            println!(
                "{} {:?} {:?}",
                r.material.as_deref().unwrap_or("-"),
                r.cost,
                r.co2
            );
        }
    }
    if let Some(failure) = report.failure {
        println!("Failure: {failure}");
    }

    session.reset(&mut form);

    Ok(())
}
