use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::NewsdeskError;
use crate::types::ReliabilityEvent;

/// Longest dedup and novelty window accepted from configuration.
pub const MAX_DEDUP_WINDOW_DAYS: i64 = 365;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, NewsdeskError> {
        Ok(Self {
            database_url: required_env("DATABASE_URL")?,
            pipeline: PipelineConfig::from_env()?,
        })
    }

    pub fn log_redacted(&self) {
        let db = match url::Url::parse(&self.database_url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("****"));
                }
                parsed.to_string()
            }
            Err(_) => "<unparseable>".to_string(),
        };
        let p = &self.pipeline;
        info!(
            database_url = db.as_str(),
            dedup_window_days = p.dedup_window_days,
            fuzzy_title_ratio = p.fuzzy_title_ratio,
            approve_threshold = p.thresholds.approve,
            hold_threshold = p.thresholds.hold,
            min_credible_sources = p.min_credible_sources,
            min_academic_sources = p.min_academic_sources,
            max_revisions = p.max_revisions,
            "Loaded config"
        );
    }
}

/// Dimension weights for the composite newsworthiness score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub worker_impact: f64,
    pub timeliness: f64,
    pub verifiability: f64,
    pub regional_relevance: f64,
    pub conflict: f64,
    pub novelty: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            worker_impact: 0.30,
            timeliness: 0.20,
            verifiability: 0.20,
            regional_relevance: 0.15,
            conflict: 0.10,
            novelty: 0.05,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.worker_impact
            + self.timeliness
            + self.verifiability
            + self.regional_relevance
            + self.conflict
            + self.novelty
    }

    /// Weights must be non-negative and sum to 1.0.
    pub fn validate(&self) -> Result<(), NewsdeskError> {
        let all = [
            self.worker_impact,
            self.timeliness,
            self.verifiability,
            self.regional_relevance,
            self.conflict,
            self.novelty,
        ];
        if all.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(NewsdeskError::Config(
                "dimension weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.sum() - 1.0).abs() > 1e-6 {
            return Err(NewsdeskError::Config(format!(
                "dimension weights must sum to 1.0, got {:.4}",
                self.sum()
            )));
        }
        Ok(())
    }
}

/// Composite-score decision boundaries. `approve` is inclusive, `hold` is the
/// inclusive floor of the hold band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub approve: f64,
    pub hold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            approve: 60.0,
            hold: 30.0,
        }
    }
}

/// Review SLA lookup by article category.
#[derive(Debug, Clone, PartialEq)]
pub struct SlaPolicy {
    pub news_like: Vec<String>,
    pub news_hours: i64,
    pub analysis_like: Vec<String>,
    pub analysis_hours: i64,
    pub default_hours: i64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            news_like: ["breaking", "news", "labor_action", "workplace_safety", "policy"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            news_hours: 24,
            analysis_like: ["analysis", "investigation", "feature", "explainer", "wages"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            analysis_hours: 48,
            default_hours: 48,
        }
    }
}

impl SlaPolicy {
    /// Review window in hours for a category. Never below one hour.
    pub fn hours_for(&self, category: &str) -> i64 {
        let matches = |list: &[String]| list.iter().any(|c| c.eq_ignore_ascii_case(category));
        let hours = if matches(&self.news_like) {
            self.news_hours
        } else if matches(&self.analysis_like) {
            self.analysis_hours
        } else {
            self.default_hours
        };
        hours.max(1)
    }
}

/// Score adjustments applied per reliability event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityDeltas {
    pub accuracy_confirmed: f64,
    pub fact_check_pass: f64,
    pub minor_correction: f64,
    pub correction_issued: f64,
    pub fact_check_fail: f64,
    pub retraction: f64,
}

impl Default for ReliabilityDeltas {
    fn default() -> Self {
        Self {
            accuracy_confirmed: 5.0,
            fact_check_pass: 3.0,
            minor_correction: -5.0,
            correction_issued: -10.0,
            fact_check_fail: -8.0,
            retraction: -30.0,
        }
    }
}

impl ReliabilityDeltas {
    pub fn delta_for(&self, event: ReliabilityEvent) -> f64 {
        match event {
            ReliabilityEvent::AccuracyConfirmed => self.accuracy_confirmed,
            ReliabilityEvent::FactCheckPass => self.fact_check_pass,
            ReliabilityEvent::MinorCorrection => self.minor_correction,
            ReliabilityEvent::CorrectionIssued => self.correction_issued,
            ReliabilityEvent::FactCheckFail => self.fact_check_fail,
            ReliabilityEvent::Retraction => self.retraction,
        }
    }
}

/// Every tunable of the decision pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub dedup_window_days: i64,
    pub dedup_cache_capacity: usize,
    pub fuzzy_title_ratio: f64,
    pub novelty_match_ratio: f64,
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub timeliness_half_life_hours: f64,
    pub min_credible_sources: usize,
    pub min_academic_sources: usize,
    pub max_revisions: u32,
    pub sla: SlaPolicy,
    pub reliability: ReliabilityDeltas,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup_window_days: 7,
            dedup_cache_capacity: 50_000,
            fuzzy_title_ratio: 0.80,
            novelty_match_ratio: 0.50,
            weights: Weights::default(),
            thresholds: Thresholds::default(),
            timeliness_half_life_hours: 48.0,
            min_credible_sources: 3,
            min_academic_sources: 2,
            max_revisions: 2,
            sla: SlaPolicy::default(),
            reliability: ReliabilityDeltas::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by any `NEWSDESK_*` variables present.
    pub fn from_env() -> Result<Self, NewsdeskError> {
        let d = Self::default();
        let config = Self {
            dedup_window_days: env_or("NEWSDESK_DEDUP_WINDOW_DAYS", d.dedup_window_days)?,
            dedup_cache_capacity: env_or("NEWSDESK_DEDUP_CACHE_CAPACITY", d.dedup_cache_capacity)?,
            fuzzy_title_ratio: env_or("NEWSDESK_FUZZY_TITLE_RATIO", d.fuzzy_title_ratio)?,
            novelty_match_ratio: env_or("NEWSDESK_NOVELTY_MATCH_RATIO", d.novelty_match_ratio)?,
            weights: d.weights,
            thresholds: Thresholds {
                approve: env_or("NEWSDESK_APPROVE_THRESHOLD", d.thresholds.approve)?,
                hold: env_or("NEWSDESK_HOLD_THRESHOLD", d.thresholds.hold)?,
            },
            timeliness_half_life_hours: env_or(
                "NEWSDESK_TIMELINESS_HALF_LIFE_HOURS",
                d.timeliness_half_life_hours,
            )?,
            min_credible_sources: env_or("NEWSDESK_MIN_CREDIBLE_SOURCES", d.min_credible_sources)?,
            min_academic_sources: env_or("NEWSDESK_MIN_ACADEMIC_SOURCES", d.min_academic_sources)?,
            max_revisions: env_or("NEWSDESK_MAX_REVISIONS", d.max_revisions)?,
            sla: d.sla,
            reliability: d.reliability,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NewsdeskError> {
        self.weights.validate()?;
        if self.thresholds.hold > self.thresholds.approve {
            return Err(NewsdeskError::Config(format!(
                "hold threshold {} exceeds approve threshold {}",
                self.thresholds.hold, self.thresholds.approve
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_title_ratio) {
            return Err(NewsdeskError::Config(
                "fuzzy title ratio must be within [0, 1]".to_string(),
            ));
        }
        if self.dedup_window_days <= 0 || !self.timeliness_half_life_hours.is_finite()
            || self.timeliness_half_life_hours <= 0.0
        {
            return Err(NewsdeskError::Config(
                "dedup window and timeliness half-life must be positive".to_string(),
            ));
        }
        if self.dedup_window_days > MAX_DEDUP_WINDOW_DAYS {
            return Err(NewsdeskError::Config(format!(
                "dedup window of {} days exceeds the {MAX_DEDUP_WINDOW_DAYS} day maximum",
                self.dedup_window_days
            )));
        }
        Ok(())
    }
}

fn required_env(key: &str) -> Result<String, NewsdeskError> {
    env::var(key).map_err(|_| NewsdeskError::Config(format!("{key} environment variable is required")))
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, NewsdeskError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| NewsdeskError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!(Weights::default().validate().is_ok());
    }

    #[test]
    fn lopsided_weights_are_rejected() {
        let weights = Weights {
            novelty: 0.5,
            ..Weights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn sla_news_and_analysis_categories() {
        let sla = SlaPolicy::default();
        assert_eq!(sla.hours_for("breaking"), 24);
        assert_eq!(sla.hours_for("Analysis"), 48);
        assert_eq!(sla.hours_for("gardening"), 48);
    }

    #[test]
    fn sla_never_zero() {
        let sla = SlaPolicy {
            news_hours: 0,
            default_hours: -5,
            ..SlaPolicy::default()
        };
        assert_eq!(sla.hours_for("news"), 1);
        assert_eq!(sla.hours_for("unknown"), 1);
    }

    #[test]
    fn default_reliability_deltas() {
        let d = ReliabilityDeltas::default();
        assert_eq!(d.delta_for(ReliabilityEvent::Retraction), -30.0);
        assert_eq!(d.delta_for(ReliabilityEvent::AccuracyConfirmed), 5.0);
        assert_eq!(d.delta_for(ReliabilityEvent::FactCheckFail), -8.0);
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let config = PipelineConfig {
            thresholds: Thresholds {
                approve: 30.0,
                hold: 60.0,
            },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_dedup_window_is_a_config_error() {
        let config = PipelineConfig {
            dedup_window_days: i64::MAX / 1000,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(NewsdeskError::Config(_))));

        let widest = PipelineConfig {
            dedup_window_days: MAX_DEDUP_WINDOW_DAYS,
            ..PipelineConfig::default()
        };
        assert!(widest.validate().is_ok());
    }
}
