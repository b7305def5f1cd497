//! Evaluation harness.
//!
//! Plays whole episodes with one scripted policy per airline and collects
//! per-day sales plus per-episode returns.

use crate::env::{Airline, EpisodeStats, ParallelEnv};
use crate::log::{MetricLogger, NoOpLogger};
use crate::market::AirlineMarket;
use crate::policy::{MarketView, PricingPolicy};
use crate::{MarketError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// One airline's sales on one day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayRecord {
    /// 1-based
    pub episode: usize,
    /// 1-based
    pub day: u32,
    pub airline: Airline,
    pub price: f32,
    pub passengers: f32,
    pub revenue: f32,
}

/// Outcome of an evaluation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvalReport {
    pub agents: Vec<Airline>,
    /// Episode returns, one row per episode in airline order
    pub episode_returns: Vec<Vec<f32>>,
    pub days: Vec<DayRecord>,
}

impl EvalReport {
    pub fn num_episodes(&self) -> usize {
        self.episode_returns.len()
    }

    /// Mean episode return per airline, airline order.
    pub fn averages(&self) -> Vec<(Airline, f32)> {
        let n = self.episode_returns.len().max(1) as f32;
        self.agents
            .iter()
            .enumerate()
            .map(|(i, airline)| {
                let total: f32 = self.episode_returns.iter().map(|r| r[i]).sum();
                (airline.clone(), total / n)
            })
            .collect()
    }

    /// Airline with the best average return; the earlier airline wins ties.
    pub fn winner(&self) -> Option<(Airline, f32)> {
        if self.episode_returns.is_empty() {
            return None;
        }
        self.averages()
            .into_iter()
            .fold(None, |best: Option<(Airline, f32)>, (airline, avg)| match best {
                Some((_, b)) if b >= avg => best,
                _ => Some((airline, avg)),
            })
    }

    /// Per-episode lines followed by the averages and the winner.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (ep, returns) in self.episode_returns.iter().enumerate() {
            let line = self
                .agents
                .iter()
                .zip(returns)
                .map(|(a, r)| format!("{a} = {r:.2}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "Episode {}: {}", ep + 1, line);
        }
        let _ = writeln!(out, "\nAverage Rewards over episodes");
        for (airline, avg) in self.averages() {
            let _ = writeln!(out, "{airline}: {avg:.2}");
        }
        if let Some((airline, avg)) = self.winner() {
            let _ = writeln!(out, "\nWinner: {airline} ({avg:.2})");
        }
        out
    }

    /// Daily records as CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Episode,Day,Airline,Price,Passengers,Revenue\n");
        for d in &self.days {
            let _ = writeln!(
                out,
                "{},{},{},{:.2},{:.2},{:.2}",
                d.episode, d.day, d.airline, d.price, d.passengers, d.revenue
            );
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_csv())?;
        tracing::info!(path = %path.as_ref().display(), rows = self.days.len(), "Wrote CSV");
        Ok(())
    }
}

/// Runs a market with one policy per airline.
pub struct Evaluator {
    env: EpisodeStats<AirlineMarket>,
    policies: Vec<Box<dyn PricingPolicy>>,
    logger: Box<dyn MetricLogger>,
}

impl Evaluator {
    /// `policies` are matched to airlines in order.
    pub fn new(env: AirlineMarket, policies: Vec<Box<dyn PricingPolicy>>) -> Result<Self> {
        if policies.len() != env.num_agents() {
            return Err(MarketError::config(format!(
                "{} airlines but {} policies",
                env.num_agents(),
                policies.len()
            )));
        }
        Ok(Self {
            env: EpisodeStats::new(env),
            policies,
            logger: Box::new(NoOpLogger),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn MetricLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn market(&self) -> &AirlineMarket {
        self.env.inner()
    }

    /// Play `episodes` full episodes. Episode `i` is reset with `seed + i` (wrapping).
    pub fn run(&mut self, episodes: usize, seed: Option<u64>) -> Result<EvalReport> {
        let mut report = EvalReport {
            agents: self.env.possible_agents().to_vec(),
            ..Default::default()
        };
        for ep in 0..episodes {
            let episode_seed = seed.map(|s| s.wrapping_add(ep as u64));
            let returns = self.run_episode(ep, episode_seed, &mut report)?;
            let metrics: HashMap<String, f64> = report
                .agents
                .iter()
                .zip(&returns)
                .map(|(airline, ret)| (format!("{airline}/episode_return"), *ret as f64))
                .collect();
            self.logger.log_metrics(&metrics, ep as u64 + 1);
            report.episode_returns.push(returns);
        }
        for (airline, avg) in report.averages() {
            self.logger
                .log_scalar(&format!("{airline}/average_return"), avg as f64, episodes as u64);
        }
        self.logger.close();
        tracing::info!(episodes, "Evaluation finished");
        Ok(report)
    }

    fn run_episode(
        &mut self,
        ep: usize,
        seed: Option<u64>,
        report: &mut EvalReport,
    ) -> Result<Vec<f32>> {
        let (mut obs, _) = self.env.reset(seed);
        self.policies.iter_mut().for_each(|p| p.reset());

        let mut day = 0;
        loop {
            let market = self.env.inner();
            let actions: Vec<usize> = self
                .policies
                .iter_mut()
                .enumerate()
                .map(|(agent, policy)| {
                    let view = MarketView {
                        agent,
                        menu: market.menu(),
                        encoder: market.encoder(),
                    };
                    policy.act(&obs.values()[agent], &view)
                })
                .collect();

            let result = self.env.step_indices(&actions)?;
            day += 1;
            for (airline, info) in result.infos.iter() {
                report.days.push(DayRecord {
                    episode: ep + 1,
                    day,
                    airline: airline.clone(),
                    price: info.get("price").unwrap_or_default(),
                    passengers: info.get("passengers").unwrap_or_default(),
                    revenue: info.get("revenue").unwrap_or_default(),
                });
            }

            if result.all_done() {
                let returns: Vec<f32> = result
                    .infos
                    .values()
                    .iter()
                    .map(|i| i.episode_return.unwrap_or_default())
                    .collect();
                tracing::debug!(episode = ep + 1, days = day, ?returns, "Episode finished");
                return Ok(returns);
            }
            obs = result.observations;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use crate::demand::{ConstantDemand, DemandPredictor};
    use crate::policy::{FixedPolicy, RandomPolicy};
    use std::sync::{Arc, Mutex};

    fn market() -> AirlineMarket {
        let config = MarketConfig::new(["A", "B"], vec![100.0, 200.0]).max_days(3);
        let predictors: Vec<Arc<dyn DemandPredictor>> = vec![
            Arc::new(ConstantDemand::new(10.0)),
            Arc::new(ConstantDemand::new(10.0)),
        ];
        AirlineMarket::new(config, predictors).unwrap()
    }

    #[test]
    fn test_run_collects_days_and_returns() {
        let policies: Vec<Box<dyn PricingPolicy>> =
            vec![Box::new(FixedPolicy::Highest), Box::new(FixedPolicy::Lowest)];
        let mut evaluator = Evaluator::new(market(), policies).unwrap();
        let report = evaluator.run(2, Some(0)).unwrap();

        assert_eq!(report.num_episodes(), 2);
        assert_eq!(report.days.len(), 2 * 3 * 2);
        // 200 * 10 / 1000 = 2.0 per day, 3 days
        assert_eq!(report.episode_returns[0], vec![6.0, 3.0]);
        let (winner, avg) = report.winner().unwrap();
        assert_eq!(winner, Airline::from("A"));
        assert_eq!(avg, 6.0);

        let last = report.days.last().unwrap();
        assert_eq!((last.episode, last.day), (2, 3));
        assert_eq!(last.airline, Airline::from("B"));
        assert_eq!(last.revenue, 1000.0);
    }

    #[test]
    fn test_csv_and_summary() {
        let policies: Vec<Box<dyn PricingPolicy>> =
            vec![Box::new(FixedPolicy::Lowest), Box::new(FixedPolicy::Lowest)];
        let report = Evaluator::new(market(), policies).unwrap().run(1, None).unwrap();

        let csv = report.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Episode,Day,Airline,Price,Passengers,Revenue"));
        assert_eq!(lines.next(), Some("1,1,A,100.00,10.00,1000.00"));
        assert_eq!(csv.lines().count(), 1 + 6);

        let summary = report.summary();
        assert!(summary.starts_with("Episode 1: A = 3.00, B = 3.00"));
        assert!(summary.contains("Winner: A (3.00)"));
    }

    #[test]
    fn test_policy_count_mismatch() {
        let policies: Vec<Box<dyn PricingPolicy>> = vec![Box::new(FixedPolicy::Lowest)];
        assert!(matches!(
            Evaluator::new(market(), policies),
            Err(MarketError::Configuration(_))
        ));
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, f64, u64)>>>);

    impl MetricLogger for Recorder {
        fn log_scalar(&self, name: &str, value: f64, step: u64) {
            self.0.lock().unwrap().push((name.to_string(), value, step));
        }

        fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
            for (k, v) in metrics {
                self.log_scalar(k, *v, step);
            }
        }
    }

    #[test]
    fn test_episode_returns_reach_logger() {
        let recorder = Recorder::default();
        let policies: Vec<Box<dyn PricingPolicy>> =
            vec![Box::new(FixedPolicy::Highest), Box::new(FixedPolicy::Lowest)];
        Evaluator::new(market(), policies)
            .unwrap()
            .with_logger(Box::new(recorder.clone()))
            .run(2, None)
            .unwrap();

        let logged = recorder.0.lock().unwrap();
        assert_eq!(logged.len(), 2 * 2 + 2);
        assert!(logged.contains(&("B/episode_return".to_string(), 3.0, 2)));
        assert!(logged.contains(&("A/average_return".to_string(), 6.0, 2)));
    }

    #[test]
    fn test_seed_offset_wraps() {
        let policies: Vec<Box<dyn PricingPolicy>> =
            vec![Box::new(RandomPolicy::new(1)), Box::new(RandomPolicy::new(2))];
        let report = Evaluator::new(market(), policies)
            .unwrap()
            .run(2, Some(u64::MAX))
            .unwrap();
        assert_eq!(report.num_episodes(), 2);
    }

    #[test]
    fn test_empty_report_has_no_winner() {
        assert!(EvalReport::default().winner().is_none());
    }
}
