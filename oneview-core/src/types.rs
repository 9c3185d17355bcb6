//! Core domain types for oneview
//!
//! The analytics model is a small star schema: dimension tables describe the
//! people, requisitions and customers of a staffing operation, and fact tables
//! record what happened (calls, timesheets, pipeline moves, placements).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Recruiter** | A user who owns calls, hours, candidates and placements |
//! | **Job** | An open or closed requisition for a client |
//! | **Client** | The customer a job is recruited for |
//! | **Fact** | An immutable event row (call, timesheet, pipeline move, placement) |
//! | **Dimension** | A reference entity joined into facts |
//!
//! Recruiter email is the cross-system join key for calls and timesheets;
//! pipeline and placement facts join on recruiter id.

use crate::analytics::widgets::Widget;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================
// Organization profile
// ============================================

/// Kind of organization using the dashboards.
///
/// Agency-only metrics (revenue based) are hidden for internal talent
/// acquisition teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    /// Staffing agency billing clients per placement
    #[default]
    Staffing,
    /// In-house talent acquisition team
    #[serde(alias = "internalTA")]
    InternalTa,
}

impl OrgType {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Staffing => "staffing",
            OrgType::InternalTa => "internal_ta",
        }
    }

    /// Parse from storage or CLI input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "staffing" | "agency" => Some(OrgType::Staffing),
            "internal_ta" | "internalta" | "internal" => Some(OrgType::InternalTa),
            _ => None,
        }
    }

    /// Whether agency-only metrics are meaningful for this org.
    pub fn is_agency(&self) -> bool {
        matches!(self, OrgType::Staffing)
    }

    /// Human-friendly label.
    pub fn display_name(&self) -> &'static str {
        match self {
            OrgType::Staffing => "Staffing Agency",
            OrgType::InternalTa => "Internal Talent Acquisition",
        }
    }
}

// ============================================
// Dimensions
// ============================================

/// A recruiter (user) of the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recruiter {
    pub id: String,
    /// Primary cross-system join key
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub team: Option<String>,
}

/// Lifecycle status of a job requisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Closed,
    Filled,
}

/// A job requisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    /// Denormalized client name; joins to [`Client::name`]
    pub client_name: String,
    pub status: JobStatus,
    pub opened_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub owner_recruiter_id: String,
}

/// A client company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
}

// ============================================
// Facts
// ============================================

/// Direction of a phone call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// A phone call from the telephony system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub recruiter_email: String,
    pub direction: CallDirection,
    pub duration_sec: u32,
    pub called_at: NaiveDateTime,
    pub is_missed: bool,
}

/// A timesheet entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hours {
    pub id: String,
    pub recruiter_email: String,
    pub work_date: NaiveDateTime,
    pub hours_logged: f64,
    pub is_billable: bool,
    pub client_name: Option<String>,
    pub job_id: Option<String>,
}

/// Candidate pipeline stage, strictly ordered from sourcing to placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Sourced,
    Submitted,
    Interview,
    Offer,
    Placed,
}

impl PipelineStage {
    /// All stages in pipeline order.
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Sourced,
        PipelineStage::Submitted,
        PipelineStage::Interview,
        PipelineStage::Offer,
        PipelineStage::Placed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Sourced => "sourced",
            PipelineStage::Submitted => "submitted",
            PipelineStage::Interview => "interview",
            PipelineStage::Offer => "offer",
            PipelineStage::Placed => "placed",
        }
    }

    /// Capitalized name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::Sourced => "Sourced",
            PipelineStage::Submitted => "Submitted",
            PipelineStage::Interview => "Interview",
            PipelineStage::Offer => "Offer",
            PipelineStage::Placed => "Placed",
        }
    }
}

/// A candidate entering a pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: String,
    pub candidate_id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub stage: PipelineStage,
    pub stage_start: NaiveDateTime,
    /// `None` while the candidate is still in this stage
    pub stage_end: Option<NaiveDateTime>,
}

/// A completed placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub placed_at: NaiveDateTime,
    pub recruiter_id: String,
    pub job_id: String,
    pub candidate_id: String,
    /// Agency only
    pub revenue_amount: Option<f64>,
    pub time_to_fill_days: u32,
}

// ============================================
// Workspace records (persisted in SQLite)
// ============================================

/// External system a user or record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    Loxo,
    Aircall,
    Timesheets,
}

impl IntegrationType {
    pub const ALL: [IntegrationType; 3] = [
        IntegrationType::Loxo,
        IntegrationType::Aircall,
        IntegrationType::Timesheets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationType::Loxo => "loxo",
            IntegrationType::Aircall => "aircall",
            IntegrationType::Timesheets => "timesheets",
        }
    }
}

/// Connection state of one integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub id: IntegrationType,
    pub connected: bool,
    pub api_key: Option<String>,
}

/// An organization workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub org_type: OrgType,
    pub integrations: Vec<Integration>,
}

/// A saved custom dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub widgets: Vec<Widget>,
}

/// An operational alert shown to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub user: String,
    pub message: String,
    pub acknowledged: bool,
}

/// Links a platform user to their ids in each integrated system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMapping {
    pub user: String,
    pub loxo_user_id: Option<String>,
    pub aircall_user_id: Option<String>,
    pub timesheet_user_id: Option<String>,
}

/// A timesheet record imported from the timesheet integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetRecord {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: String,
    pub date: NaiveDateTime,
    pub hours: f64,
    pub billable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stage_order() {
        assert!(PipelineStage::Sourced < PipelineStage::Submitted);
        assert!(PipelineStage::Offer < PipelineStage::Placed);
        let mut shuffled = vec![
            PipelineStage::Placed,
            PipelineStage::Sourced,
            PipelineStage::Offer,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![
                PipelineStage::Sourced,
                PipelineStage::Offer,
                PipelineStage::Placed
            ]
        );
    }

    #[test]
    fn test_org_type_parse() {
        assert_eq!(OrgType::parse("staffing"), Some(OrgType::Staffing));
        assert_eq!(OrgType::parse("Internal_TA"), Some(OrgType::InternalTa));
        assert_eq!(OrgType::parse("nonprofit"), None);
        assert!(OrgType::Staffing.is_agency());
        assert!(!OrgType::InternalTa.is_agency());
    }

    #[test]
    fn test_org_type_serde() {
        let json = serde_json::to_string(&OrgType::InternalTa).unwrap();
        assert_eq!(json, "\"internal_ta\"");
        let parsed: OrgType = serde_json::from_str("\"internalTA\"").unwrap();
        assert_eq!(parsed, OrgType::InternalTa);
    }
}
