use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// --- Candidate Types ---

/// Lifecycle of a discovered event candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Discovered,
    Evaluated,
    Approved,
    Hold,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Evaluated => "evaluated",
            Self::Approved => "approved",
            Self::Hold => "hold",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected candidates are frozen apart from the topic backlink.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovered" => Ok(Self::Discovered),
            "evaluated" => Ok(Self::Evaluated),
            "approved" => Ok(Self::Approved),
            "hold" => Ok(Self::Hold),
            "rejected" => Ok(Self::Rejected),
            _ => Err(anyhow::anyhow!("Unknown candidate status: {}", s)),
        }
    }
}

/// Outcome of newsworthiness scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Hold,
    Reject,
}

impl Decision {
    pub fn candidate_status(&self) -> CandidateStatus {
        match self {
            Self::Approve => CandidateStatus::Approved,
            Self::Hold => CandidateStatus::Hold,
            Self::Reject => CandidateStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Hold => write!(f, "hold"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// The six newsworthiness dimensions, each in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScores {
    pub worker_impact: f64,
    pub timeliness: f64,
    pub verifiability: f64,
    pub regional_relevance: f64,
    pub conflict: f64,
    pub novelty: f64,
}

/// Raw item as delivered by the discovery collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiscoveredEvent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_url: String,
    /// Which feed or API produced the item (e.g. "rss:reuters", "reddit").
    #[serde(default)]
    pub discovered_from: String,
    #[serde(default)]
    pub event_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct EventCandidate {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    #[builder(setter(into))]
    pub title: String,
    #[builder(default, setter(into))]
    pub description: String,
    #[builder(default, setter(into))]
    pub source_url: String,
    #[builder(default, setter(into))]
    pub discovered_from: String,
    #[builder(default = Utc::now())]
    pub discovered_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub event_at: Option<DateTime<Utc>>,
    #[builder(default)]
    pub dimensions: Option<DimensionScores>,
    #[builder(default)]
    pub composite_score: Option<f64>,
    #[builder(default = CandidateStatus::Discovered)]
    pub status: CandidateStatus,
    #[builder(default)]
    pub status_reason: Option<String>,
    #[builder(default)]
    pub topic_id: Option<Uuid>,
}

impl EventCandidate {
    pub fn from_discovery(event: DiscoveredEvent, discovered_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            source_url: event.source_url,
            discovered_from: event.discovered_from,
            discovered_at,
            event_at: event.event_at,
            dimensions: None,
            composite_score: None,
            status: CandidateStatus::Discovered,
            status_reason: None,
            topic_id: None,
        }
    }

    /// Title and description joined, for keyword scanning.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

// --- Topic Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    InsufficientSources,
    Failed,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::InsufficientSources => "insufficient_sources",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "insufficient_sources" => Ok(Self::InsufficientSources),
            "failed" => Ok(Self::Failed),
            _ => Err(anyhow::anyhow!("Unknown verification status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionScope {
    National,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalClassification {
    pub scope: RegionScope,
    /// Metro or state slug when the scope is local and a place was named.
    pub region_id: Option<String>,
}

/// How a claim is known: first-hand, attributed, or inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimClass {
    Observed,
    Claimed,
    Interpreted,
}

impl std::fmt::Display for ClaimClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Observed => write!(f, "observed"),
            Self::Claimed => write!(f, "claimed"),
            Self::Interpreted => write!(f, "interpreted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedFact {
    pub text: String,
    pub classification: ClaimClass,
    pub supporting_sources: Vec<String>,
    /// 0.0-1.0
    pub confidence: f64,
    /// Verbatim statements from sources that disagree on a number, name or date.
    pub conflicting_info: Option<String>,
    /// Stated by at least two independent sources.
    pub cross_referenced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSource {
    pub url: String,
    pub name: String,
    pub source_key: String,
    pub kind: SourceKind,
    pub tier: SourceTier,
    pub credibility_score: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourcePlan {
    pub primary: Vec<PlannedSource>,
    pub supporting: Vec<PlannedSource>,
    pub attribution_strategy: String,
}

impl SourcePlan {
    /// All planned sources in rank order.
    pub fn ranked(&self) -> impl Iterator<Item = &PlannedSource> {
        self.primary.iter().chain(self.supporting.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub regional: RegionalClassification,
    pub dimensions: DimensionScores,
    pub composite_score: f64,
    pub verification_status: VerificationStatus,
    pub verified_facts: Vec<VerifiedFact>,
    pub source_plan: Option<SourcePlan>,
    pub verification_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

// --- Source Types ---

/// Structural credibility tier. Tier one is the most credible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl SourceTier {
    pub fn level(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
            Self::Tier4 => 4,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Tier1),
            2 => Some(Self::Tier2),
            3 => Some(Self::Tier3),
            4 => Some(Self::Tier4),
            _ => None,
        }
    }

    /// Inclusive credibility range a fresh source of this tier belongs to.
    pub fn score_range(&self) -> (f64, f64) {
        match self {
            Self::Tier1 => (90.0, 100.0),
            Self::Tier2 => (70.0, 89.0),
            Self::Tier3 => (50.0, 69.0),
            Self::Tier4 => (0.0, 49.0),
        }
    }

    /// Initial running score assigned at first citation.
    pub fn initial_score(&self) -> f64 {
        match self {
            Self::Tier1 => 95.0,
            Self::Tier2 => 85.0,
            Self::Tier3 => 60.0,
            Self::Tier4 => 30.0,
        }
    }

    /// Tier 1 and Tier 2 count toward the credible-source threshold.
    pub fn is_credible(&self) -> bool {
        matches!(self, Self::Tier1 | Self::Tier2)
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tier {}", self.level())
    }
}

/// What kind of outlet or document a citation is. Determines the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GovernmentDocument,
    PeerReviewed,
    OfficialStatement,
    WireService,
    InvestigativeOutlet,
    RegionalOutlet,
    PublicRecord,
    VerifiedOfficialSocial,
    PressRelease,
    Anonymous,
    UnverifiedSocial,
    Opinion,
}

impl SourceKind {
    pub fn tier(&self) -> SourceTier {
        match self {
            Self::GovernmentDocument | Self::PeerReviewed | Self::OfficialStatement => {
                SourceTier::Tier1
            }
            Self::WireService | Self::InvestigativeOutlet => SourceTier::Tier2,
            Self::RegionalOutlet | Self::PublicRecord | Self::VerifiedOfficialSocial => {
                SourceTier::Tier3
            }
            Self::PressRelease | Self::Anonymous | Self::UnverifiedSocial | Self::Opinion => {
                SourceTier::Tier4
            }
        }
    }

    pub fn is_academic(&self) -> bool {
        matches!(self, Self::PeerReviewed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovernmentDocument => "government_document",
            Self::PeerReviewed => "peer_reviewed",
            Self::OfficialStatement => "official_statement",
            Self::WireService => "wire_service",
            Self::InvestigativeOutlet => "investigative_outlet",
            Self::RegionalOutlet => "regional_outlet",
            Self::PublicRecord => "public_record",
            Self::VerifiedOfficialSocial => "verified_official_social",
            Self::PressRelease => "press_release",
            Self::Anonymous => "anonymous",
            Self::UnverifiedSocial => "unverified_social",
            Self::Opinion => "opinion",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "government_document" => Ok(Self::GovernmentDocument),
            "peer_reviewed" => Ok(Self::PeerReviewed),
            "official_statement" => Ok(Self::OfficialStatement),
            "wire_service" => Ok(Self::WireService),
            "investigative_outlet" => Ok(Self::InvestigativeOutlet),
            "regional_outlet" => Ok(Self::RegionalOutlet),
            "public_record" => Ok(Self::PublicRecord),
            "verified_official_social" => Ok(Self::VerifiedOfficialSocial),
            "press_release" => Ok(Self::PressRelease),
            "anonymous" => Ok(Self::Anonymous),
            "unverified_social" => Ok(Self::UnverifiedSocial),
            "opinion" => Ok(Self::Opinion),
            _ => Err(anyhow::anyhow!("Unknown source kind: {}", s)),
        }
    }
}

/// A citation found by the source-discovery collaborator for a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiscoveredSource {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Kind declared by discovery; inferred from the URL when absent.
    #[serde(default)]
    pub kind: Option<SourceKind>,
    /// Individual statements extracted from the source.
    #[serde(default)]
    pub claims: Vec<String>,
    /// Raw excerpt, split into sentences when no claims were extracted.
    #[serde(default)]
    pub excerpt: Option<String>,
}

/// A cited outlet with its running credibility track record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    /// Normalized host, e.g. "reuters.com".
    pub key: String,
    pub name: String,
    pub kind: SourceKind,
    pub tier: SourceTier,
    pub credibility_score: f64,
    pub citation_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    pub fn first_citation(key: &str, name: &str, kind: SourceKind, now: DateTime<Utc>) -> Self {
        let tier = kind.tier();
        Self {
            id: Uuid::new_v4(),
            key: key.to_string(),
            name: name.to_string(),
            kind,
            tier,
            credibility_score: tier.initial_score(),
            citation_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityEvent {
    AccuracyConfirmed,
    MinorCorrection,
    CorrectionIssued,
    Retraction,
    FactCheckPass,
    FactCheckFail,
}

impl ReliabilityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccuracyConfirmed => "accuracy_confirmed",
            Self::MinorCorrection => "minor_correction",
            Self::CorrectionIssued => "correction_issued",
            Self::Retraction => "retraction",
            Self::FactCheckPass => "fact_check_pass",
            Self::FactCheckFail => "fact_check_fail",
        }
    }
}

impl std::fmt::Display for ReliabilityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReliabilityEvent {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accuracy_confirmed" => Ok(Self::AccuracyConfirmed),
            "minor_correction" => Ok(Self::MinorCorrection),
            "correction_issued" => Ok(Self::CorrectionIssued),
            "retraction" => Ok(Self::Retraction),
            "fact_check_pass" => Ok(Self::FactCheckPass),
            "fact_check_fail" => Ok(Self::FactCheckFail),
            _ => Err(anyhow::anyhow!("Unknown reliability event: {}", s)),
        }
    }
}

/// Immutable audit entry for one reliability adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReliabilityLogEntry {
    pub id: Uuid,
    pub source_id: Uuid,
    pub event: ReliabilityEvent,
    pub delta: f64,
    pub resulting_score: f64,
    pub article_id: Option<Uuid>,
    pub correction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Editorial Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    UnderReview,
    RevisionRequested,
    Approved,
    Published,
    Archived,
    NeedsSeniorReview,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::UnderReview => "under_review",
            Self::RevisionRequested => "revision_requested",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::NeedsSeniorReview => "needs_senior_review",
        }
    }

    /// Statuses that count against the assigned editor's open workload.
    pub fn counts_toward_workload(&self) -> bool {
        matches!(self, Self::UnderReview | Self::RevisionRequested)
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "under_review" => Ok(Self::UnderReview),
            "revision_requested" => Ok(Self::RevisionRequested),
            "approved" => Ok(Self::Approved),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            "needs_senior_review" => Ok(Self::NeedsSeniorReview),
            _ => Err(anyhow::anyhow!("Unknown article status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub category: String,
    /// Draft content. Opaque to the pipeline.
    pub body: String,
    pub status: ArticleStatus,
    pub assigned_editor: Option<Uuid>,
    pub review_deadline: Option<DateTime<Utc>>,
    pub editorial_notes: String,
    pub revision_count: u32,
    /// Set by the upstream quality gate before the draft is handed over.
    pub quality_gate_passed: bool,
    pub approved_by: Option<String>,
    pub archived_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one substantive edit cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRevision {
    pub id: Uuid,
    pub article_id: Uuid,
    pub revision_number: u32,
    pub actor: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub change_reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Editor {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    #[builder(setter(into))]
    pub name: String,
    #[builder(default)]
    pub specializations: Vec<String>,
    #[builder(default)]
    pub general: bool,
    #[builder(default = true)]
    pub active: bool,
    #[builder(default)]
    pub open_workload: u32,
}

impl Editor {
    pub fn specializes_in(&self, category: &str) -> bool {
        self.specializations
            .iter()
            .any(|s| s.eq_ignore_ascii_case(category))
    }
}

/// Notification emitted by an editorial transition, stored in the outbox in
/// the same unit of work as the transition itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorialEvent {
    AssignedForReview {
        article_id: Uuid,
        editor_id: Uuid,
        review_deadline: DateTime<Utc>,
    },
    RevisionRequested {
        article_id: Uuid,
        editor_id: Option<Uuid>,
        notes: String,
    },
    EscalatedToSeniorReview {
        article_id: Uuid,
        revision_count: u32,
        requested_by: String,
        notes: String,
    },
    Approved {
        article_id: Uuid,
        approved_by: String,
    },
    Published {
        article_id: Uuid,
        published_by: String,
    },
    Archived {
        article_id: Uuid,
        archived_by: String,
        reason: String,
    },
    CorrectionPublished {
        article_id: Uuid,
        correction_id: Uuid,
    },
}

impl EditorialEvent {
    pub fn article_id(&self) -> Uuid {
        match self {
            Self::AssignedForReview { article_id, .. }
            | Self::RevisionRequested { article_id, .. }
            | Self::EscalatedToSeniorReview { article_id, .. }
            | Self::Approved { article_id, .. }
            | Self::Published { article_id, .. }
            | Self::Archived { article_id, .. }
            | Self::CorrectionPublished { article_id, .. } => *article_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssignedForReview { .. } => "assigned_for_review",
            Self::RevisionRequested { .. } => "revision_requested",
            Self::EscalatedToSeniorReview { .. } => "escalated_to_senior_review",
            Self::Approved { .. } => "approved",
            Self::Published { .. } => "published",
            Self::Archived { .. } => "archived",
            Self::CorrectionPublished { .. } => "correction_published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub event: EditorialEvent,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}

// --- Correction Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    FactualError,
    SourceError,
    Clarification,
    Update,
    Retraction,
}

impl CorrectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FactualError => "factual_error",
            Self::SourceError => "source_error",
            Self::Clarification => "clarification",
            Self::Update => "update",
            Self::Retraction => "retraction",
        }
    }
}

impl std::str::FromStr for CorrectionType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "factual_error" => Ok(Self::FactualError),
            "source_error" => Ok(Self::SourceError),
            "clarification" => Ok(Self::Clarification),
            "update" => Ok(Self::Update),
            "retraction" => Ok(Self::Retraction),
            _ => Err(anyhow::anyhow!("Unknown correction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl CorrectionSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for CorrectionSeverity {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(Self::Minor),
            "moderate" => Ok(Self::Moderate),
            "major" => Ok(Self::Major),
            "critical" => Ok(Self::Critical),
            _ => Err(anyhow::anyhow!("Unknown correction severity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    Pending,
    Verified,
    Published,
    Rejected,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CorrectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CorrectionStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "published" => Ok(Self::Published),
            "rejected" => Ok(Self::Rejected),
            _ => Err(anyhow::anyhow!("Unknown correction status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: Uuid,
    pub article_id: Uuid,
    pub correction_type: CorrectionType,
    pub severity: CorrectionSeverity,
    pub original_text: String,
    pub corrected_text: String,
    pub public_notice: String,
    pub status: CorrectionStatus,
    pub reported_by: String,
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Input schemas
// ---------------------------------------------------------------------------

/// JSON Schemas for the files the discovery side hands over: a batch of
/// events and the topic-title to sources map used for verification.
pub fn input_schemas() -> serde_json::Value {
    serde_json::json!({
        "discovered_events": schemars::schema_for!(Vec<DiscoveredEvent>),
        "discovered_sources": schemars::schema_for!(
            std::collections::HashMap<String, Vec<DiscoveredSource>>
        ),
    })
}
