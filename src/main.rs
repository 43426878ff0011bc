use anyhow::{bail, Context, Result};
use ergo_posture::config::Config;
use ergo_posture::input::AnalysisRequest;
use ergo_posture::logging::init_tracing;
use ergo_posture::{Analyzer, Domain};

const CONFIG_PATH: &str = "config.toml";

const USAGE: &str = "usage: ergo-posture <seated|desk|hand|arm-screen|lower-body> <request.json> [config.toml]";

struct Args {
    domain: Domain,
    request_path: String,
    config_path: String,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        bail!("{}", USAGE);
    }
    let domain = args[1]
        .parse::<Domain>()
        .with_context(|| format!("{}\n{}", args[1], USAGE))?;
    Ok(Args {
        domain,
        request_path: args[2].clone(),
        config_path: args.get(3).cloned().unwrap_or_else(|| CONFIG_PATH.to_string()),
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = Config::load_or_default(&args.config_path)?;
    init_tracing(&config.log)?;

    let analyzer = Analyzer::new(config).context("Invalid threshold configuration")?;
    let observation = AnalysisRequest::load(&args.request_path)?
        .into_observation()
        .context("Invalid request")?;

    let result = analyzer
        .analyze(args.domain, &observation)
        .with_context(|| format!("{} analysis failed", args.domain))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
