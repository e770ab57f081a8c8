use anyhow::{bail, Context, Result};
use std::io::Read;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signal_tester::backtesting::SignalTester;
use signal_tester::config::Config;
use signal_tester::exchange::{self, Exchange, HistoricalExchange};
use signal_tester::models::Timeframe;
use signal_tester::parser;

const EXAMPLE_SIGNAL: &str = "BTC/USDT Buy at 35000, SL at 34500, TP1 at 35500, TP2 at 36000, Time: 2023-11-15 08:00";

#[derive(Debug, Default)]
struct Args {
    exchange: Option<String>,
    timeframe: Option<Timeframe>,
    candles: Option<String>,
    json: bool,
    text: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--exchange" => {
                args.exchange = Some(it.next().context("--exchange needs a value")?.to_lowercase())
            }
            "--timeframe" => {
                let tf = it.next().context("--timeframe needs a value")?;
                args.timeframe = Some(tf.parse::<Timeframe>()?);
            }
            "--candles" => args.candles = Some(it.next().context("--candles needs a file")?),
            "--json" => args.json = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            s if s.starts_with("--") => bail!("Unknown option {}", s),
            _ => args.text.push(arg),
        }
    }

    Ok(args)
}

fn print_usage() {
    println!("Usage: signal-tester [--exchange NAME] [--timeframe TF] [--candles FILE] [--json] [SIGNAL TEXT...]");
    println!();
    println!("Reads the signal from stdin when no text is given.");
    println!("Example signal:");
    println!("  {}", EXAMPLE_SIGNAL);
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cfg = Config::from_env();
    let args = parse_args()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    if let Some(name) = args.exchange {
        cfg.exchange = name;
    }
    if let Some(tf) = args.timeframe {
        cfg.timeframe = tf;
    }

    let text = if args.text.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read signal from stdin")?;
        buf
    } else {
        args.text.join(" ")
    };

    let signal = match parser::parse(&text) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error parsing signal: {}", e);
            eprintln!();
            eprintln!("Example format:");
            eprintln!("  {}", EXAMPLE_SIGNAL);
            std::process::exit(2);
        }
    };

    if !args.json {
        println!("Parsed signal: {}", signal);
    }

    let venue: Box<dyn Exchange> = match &args.candles {
        Some(path) => Box::new(HistoricalExchange::from_json_file(&signal.pair, cfg.timeframe, path)?),
        None => exchange::connect(&cfg)?,
    };

    let mut tester = SignalTester::new(venue, cfg.timeframe, cfg.fetch_settings());
    info!("Using {} price history at {}", tester.exchange_name(), cfg.timeframe);
    let result = tester
        .test_signal(&signal)
        .await
        .with_context(|| format!("Failed to test {} signal", signal.pair))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        result.print_summary();
    }

    Ok(())
}
