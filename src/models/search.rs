use serde::{Deserialize, Serialize};

/// Immutable per-run search configuration. Built once by the caller
/// (CLI args or a stored run row) and never mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpec {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub job_type: JobTypeFilter,
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub location: LocationFilter,
    /// Source ids to scrape; empty means every registered source.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl SearchSpec {
    /// True when at least one keyword carries non-whitespace content.
    pub fn has_keywords(&self) -> bool {
        self.keywords.iter().any(|k| !k.trim().is_empty())
    }
}

/// Job type as detected on a scraped posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Remote,
    FullTime,
    Freelance,
    Hybrid,
    PartTime,
}

impl JobType {
    /// Best-effort mapping from the free-text labels sources use.
    /// Contract/temporary postings count as freelance.
    pub fn parse(label: &str) -> Option<JobType> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "remote" | "fullyremote" | "remoteok" => Some(JobType::Remote),
            "fulltime" | "full" | "permanent" => Some(JobType::FullTime),
            "freelance" | "contract" | "contractor" | "temporary" => Some(JobType::Freelance),
            "hybrid" => Some(JobType::Hybrid),
            "parttime" | "part" => Some(JobType::PartTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Remote => "remote",
            JobType::FullTime => "full_time",
            JobType::Freelance => "freelance",
            JobType::Hybrid => "hybrid",
            JobType::PartTime => "part_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum JobTypeFilter {
    #[default]
    All,
    Remote,
    FullTime,
    Freelance,
    Hybrid,
    PartTime,
}

impl JobTypeFilter {
    /// Exact match only; a candidate with no detected type fails any
    /// filter other than `All`.
    pub fn accepts(&self, detected: Option<JobType>) -> bool {
        let wanted = match self {
            JobTypeFilter::All => return true,
            JobTypeFilter::Remote => JobType::Remote,
            JobTypeFilter::FullTime => JobType::FullTime,
            JobTypeFilter::Freelance => JobType::Freelance,
            JobTypeFilter::Hybrid => JobType::Hybrid,
            JobTypeFilter::PartTime => JobType::PartTime,
        };
        detected == Some(wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    All,
    Day,
    ThreeDays,
    Week,
}

impl TimeWindow {
    /// Maximum posting age in days, or None for an unbounded window.
    pub fn max_age_days(&self) -> Option<i64> {
        match self {
            TimeWindow::All => None,
            TimeWindow::Day => Some(1),
            TimeWindow::ThreeDays => Some(3),
            TimeWindow::Week => Some(7),
        }
    }
}

/// Geographic market a posting is inferred to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    Usa,
    Uk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LocationFilter {
    #[default]
    All,
    Usa,
    Uk,
}

impl LocationFilter {
    pub fn accepts(&self, market: Option<Market>) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::Usa => market == Some(Market::Usa),
            LocationFilter::Uk => market == Some(Market::Uk),
        }
    }
}
