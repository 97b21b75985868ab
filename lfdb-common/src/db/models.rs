//! Database models and domain enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Availability of a video on YouTube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    Active,
    Private,
    Deleted,
    Blocked,
    Unavailable,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Active => "ACTIVE",
            VideoStatus::Private => "PRIVATE",
            VideoStatus::Deleted => "DELETED",
            VideoStatus::Blocked => "BLOCKED",
            VideoStatus::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(VideoStatus::Active),
            "PRIVATE" => Ok(VideoStatus::Private),
            "DELETED" => Ok(VideoStatus::Deleted),
            "BLOCKED" => Ok(VideoStatus::Blocked),
            "UNAVAILABLE" => Ok(VideoStatus::Unavailable),
            other => Err(Error::InvalidInput(format!("Unknown video status: {}", other))),
        }
    }
}

/// Review state of an extracted repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::PendingReview => "PENDING_REVIEW",
            RepairStatus::Approved => "APPROVED",
            RepairStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepairStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_REVIEW" => Ok(RepairStatus::PendingReview),
            "APPROVED" => Ok(RepairStatus::Approved),
            "REJECTED" => Ok(RepairStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown repair status: {}", other))),
        }
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Self-reported certainty of an AI extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Lenient parse; anything unrecognized is `Low`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    /// Review status a new repair receives for this confidence
    pub fn initial_repair_status(&self) -> RepairStatus {
        match self {
            Confidence::High => RepairStatus::Approved,
            _ => RepairStatus::PendingReview,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Laptop model belonging to a brand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaptopModel {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub brand_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemType {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A synced YouTube video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub youtube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub published_at: DateTime<Utc>,
    pub transcript: Option<String>,
    pub processed: bool,
    pub status: VideoStatus,
    pub unavailable_at: Option<DateTime<Utc>>,
    pub unavailable_reason: Option<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Curated repair record, one per video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub id: String,
    pub video_id: String,
    pub model_id: Option<String>,
    pub problem_type_id: Option<String>,
    pub troubleshooting: Option<String>,
    pub solution: Option<String>,
    pub status: RepairStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account record; credentials never leave the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_status_round_trips_through_text() {
        for status in [
            VideoStatus::Active,
            VideoStatus::Private,
            VideoStatus::Deleted,
            VideoStatus::Blocked,
            VideoStatus::Unavailable,
        ] {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!("GONE".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_repair_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&RepairStatus::PendingReview).unwrap();
        assert_eq!(json, "\"PENDING_REVIEW\"");
        assert_eq!(RepairStatus::PendingReview.to_string(), "PENDING_REVIEW");
    }

    #[test]
    fn test_confidence_lenient_parse() {
        assert_eq!(Confidence::parse_lenient("HIGH"), Confidence::High);
        assert_eq!(Confidence::parse_lenient(" medium "), Confidence::Medium);
        assert_eq!(Confidence::parse_lenient("very sure"), Confidence::Low);
    }

    #[test]
    fn test_only_high_confidence_is_auto_approved() {
        assert_eq!(Confidence::High.initial_repair_status(), RepairStatus::Approved);
        assert_eq!(Confidence::Medium.initial_repair_status(), RepairStatus::PendingReview);
        assert_eq!(Confidence::Low.initial_repair_status(), RepairStatus::PendingReview);
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: None,
            role: Role::Admin,
            password_hash: "hash".to_string(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert!(json.get("passwordHash").is_none());
    }
}
