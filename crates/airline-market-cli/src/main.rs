//! Airline Market CLI
//!
//! Command-line interface for playing and evaluating scripted pricing
//! policies on the airline market.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use airline_market::eval::Evaluator;
use airline_market::log::ConsoleLogger;
use airline_market::policy::{policy_by_name, MarketView, PricingPolicy};
use airline_market::prelude::*;

#[derive(Parser)]
#[command(name = "airmarket")]
#[command(version, about = "Airline Market - repeated pricing game for competing airlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate scripted policies over several episodes
    Eval {
        /// Number of episodes
        #[arg(long, default_value = "5")]
        episodes: usize,

        /// Policy for every airline, or a comma-separated list in airline order
        #[arg(long, default_value = "undercut")]
        policy: String,

        /// Base seed; episode i and airline j use seed + i / seed + j
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Scenario JSON file (defaults to the built-in market)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Write per-day sales to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Play one episode and render every day
    Demo {
        /// Policy for every airline, or a comma-separated list in airline order
        #[arg(long, default_value = "random")]
        policy: String,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Scenario JSON file (defaults to the built-in market)
        #[arg(long)]
        scenario: Option<PathBuf>,
    },

    /// List available policies and the default market
    List,

    /// Print the default scenario as JSON
    Config,
}

fn main() -> Result<()> {
    // Logs go to stderr so report output stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            episodes,
            policy,
            seed,
            scenario,
            csv,
            json,
        } => {
            eval(episodes, &policy, seed, scenario, csv, json)?;
        }
        Commands::Demo {
            policy,
            seed,
            scenario,
        } => {
            demo(&policy, seed, scenario)?;
        }
        Commands::List => {
            list();
        }
        Commands::Config => {
            println!("{}", ScenarioConfig::default().to_json()?);
        }
    }

    Ok(())
}

fn load_scenario(path: Option<PathBuf>) -> Result<ScenarioConfig> {
    match path {
        Some(path) => ScenarioConfig::from_json_file(&path)
            .with_context(|| format!("loading scenario {}", path.display())),
        None => Ok(ScenarioConfig::default()),
    }
}

/// One policy per airline from a comma list; a single name is shared by all.
fn build_policies(list: &str, num_agents: usize, seed: u64) -> Result<Vec<Box<dyn PricingPolicy>>> {
    let names: Vec<&str> = list.split(',').map(str::trim).collect();
    let names = match names.len() {
        1 => vec![names[0]; num_agents],
        n if n == num_agents => names,
        n => bail!("{n} policies given for {num_agents} airlines"),
    };
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Ok(policy_by_name(name, seed.wrapping_add(i as u64))?))
        .collect()
}

fn eval(
    episodes: usize,
    policy: &str,
    seed: u64,
    scenario: Option<PathBuf>,
    csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let scenario = load_scenario(scenario)?;
    let market = scenario.build()?;
    let policies = build_policies(policy, market.num_agents(), seed)?;

    tracing::info!(
        episodes,
        policies = ?policies.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "Starting evaluation"
    );

    let mut evaluator = Evaluator::new(market, policies)?.with_logger(Box::new(ConsoleLogger::new()));
    let report = evaluator.run(episodes, Some(seed))?;

    if let Some(path) = csv {
        report.write_csv(&path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.summary());
    }

    Ok(())
}

fn demo(policy: &str, seed: u64, scenario: Option<PathBuf>) -> Result<()> {
    let scenario = load_scenario(scenario)?;
    let mut env = scenario.build()?;
    let mut policies = build_policies(policy, env.num_agents(), seed)?;

    tracing::info!(policy, seed, "Running demo");

    let (mut obs, _) = env.reset(Some(seed));
    if let Some(render) = env.render() {
        println!("{render}");
    }

    let mut totals = vec![0.0f32; env.num_agents()];
    while !env.is_done() {
        let actions: Vec<usize> = policies
            .iter_mut()
            .enumerate()
            .map(|(agent, p)| {
                let view = MarketView {
                    agent,
                    menu: env.menu(),
                    encoder: env.encoder(),
                };
                p.act(&obs.values()[agent], &view)
            })
            .collect();

        let result = env.step_indices(&actions)?;
        for (total, reward) in totals.iter_mut().zip(result.rewards.values()) {
            *total += reward;
        }
        if let Some(render) = env.render() {
            println!("{render}");
        }
        obs = result.observations;
    }

    println!("Episode returns:");
    for (airline, total) in env.agents().iter().zip(&totals) {
        println!("  {airline}: {total:.2}");
    }
    Ok(())
}

fn list() {
    println!("Available policies:");
    println!();
    println!("  random         Uniform over the price menu (seeded)");
    println!("  cycle          Walk the menu one level per day");
    println!("  undercut       One level below the cheapest rival");
    println!("  low, mid, high Fixed menu level");
    println!("  fixed:<index>  Fixed menu index");
    println!();
    let config = MarketConfig::default();
    let airlines: Vec<&str> = config.agents.iter().map(Airline::as_str).collect();
    println!("Default market:");
    println!("  airlines   {}", airlines.join(", "));
    println!("  days       {}", config.max_days);
    println!(
        "  prices     {} levels, {:.0} to {:.0}",
        config.price_points.len(),
        config.price_points.first().copied().unwrap_or_default(),
        config.price_points.last().copied().unwrap_or_default()
    );
}
