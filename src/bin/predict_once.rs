use clap::Parser;
use heart_risk_form::config::DEFAULT_MODEL_PATH;
use heart_risk_form::core::orchestrator::{Outcome, RequestOrchestrator};
use heart_risk_form::core::InputRecord;
use heart_risk_form::utils::logger;
use heart_risk_form::web::views::format_probability;
use heart_risk_form::{InferenceInvoker, LocalStorage, RiskPipeline};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "predict-once")]
#[command(about = "Validate one record and run it through the pipeline")]
struct Args {
    /// Path to the pipeline artifact (JSON)
    #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: String,

    /// Field value as name=value; repeat for every field
    #[arg(short, long = "field", value_parser = parse_pair)]
    fields: Vec<(String, String)>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let pipeline = match RiskPipeline::load(&LocalStorage::default(), &args.model).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    let orchestrator = RequestOrchestrator::new(Arc::new(InferenceInvoker::new(Arc::new(pipeline))));
    let input: InputRecord = args.fields.into_iter().collect();
    let report = orchestrator.handle(input).await;

    if args.json {
        let response: heart_risk_form::web::handlers::ApiResponse = report.outcome.clone().into();
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    match report.outcome {
        Outcome::Succeeded { prediction, .. } => {
            if !args.json {
                println!("✅ {}", prediction.label.text());
                println!("📊 Probabilitas: {}", format_probability(prediction.probability));
            }
        }
        Outcome::Invalid { errors, .. } => {
            if !args.json {
                for (field, message) in errors.iter() {
                    eprintln!("❌ {}: {}", field, message);
                }
            }
            std::process::exit(1);
        }
        Outcome::Failed { errors, .. } => {
            if !args.json {
                eprintln!("❌ {}", errors.general_message().unwrap_or("Terjadi kesalahan"));
            }
            std::process::exit(2);
        }
    }

    Ok(())
}
