//! Reviewer-authored state layered onto immutable source images.
//!
//! A [`ReviewState`] is optional per image: an image without a stored
//! document is NOT_REVIEWED with every issue flag cleared and no remark.
//! All mutations go through [`ReviewState::apply`], which produces both the
//! next state and the [`AuditEvent`] describing the change so every store
//! records them together.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ImageKey;
use super::audit::{AuditEvent, AuditEventType};
use crate::error::QcError;

/// Maximum remark length in characters.
pub const MAX_REMARK_CHARS: usize = 2000;

/// Review status of a single image or, derived, of a product variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    /// A reviewer marked the image as checked.
    Reviewed,
    /// Default state; no reviewer has signed off.
    #[default]
    NotReviewed,
}

impl ReviewStatus {
    /// Returns the opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Reviewed => Self::NotReviewed,
            Self::NotReviewed => Self::Reviewed,
        }
    }

    /// Wire representation (`"REVIEWED"` / `"NOT_REVIEWED"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reviewed => "REVIEWED",
            Self::NotReviewed => "NOT_REVIEWED",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REVIEWED" => Ok(Self::Reviewed),
            "NOT_REVIEWED" => Ok(Self::NotReviewed),
            other => Err(QcError::InvalidStatusFilter(other.to_string())),
        }
    }
}

/// Named defect categories a reviewer can flag on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKey {
    /// Image is blurry.
    ImageBlur,
    /// Product is cut off by the frame.
    CroppedImage,
    /// MRP (price) is printed in the image.
    MrpPresentInImage,
    /// General quality problem.
    ImageQuality,
    /// Wrong aspect ratio.
    AspectRatio,
}

impl IssueKey {
    /// Every issue key, in display order.
    pub const ALL: [Self; 5] = [
        Self::ImageBlur,
        Self::CroppedImage,
        Self::MrpPresentInImage,
        Self::ImageQuality,
        Self::AspectRatio,
    ];

    /// Wire name of the flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImageBlur => "image_blur",
            Self::CroppedImage => "cropped_image",
            Self::MrpPresentInImage => "mrp_present_in_image",
            Self::ImageQuality => "image_quality",
            Self::AspectRatio => "aspect_ratio",
        }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKey {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| QcError::InvalidIssueKey(s.to_string()))
    }
}

/// The five issue flags of one image. Missing keys deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ImageIssues {
    /// Image is blurry.
    pub image_blur: bool,
    /// Product is cut off by the frame.
    pub cropped_image: bool,
    /// MRP is printed in the image.
    pub mrp_present_in_image: bool,
    /// General quality problem.
    pub image_quality: bool,
    /// Wrong aspect ratio.
    pub aspect_ratio: bool,
}

impl ImageIssues {
    /// Returns the value of one flag.
    #[must_use]
    pub const fn get(&self, key: IssueKey) -> bool {
        match key {
            IssueKey::ImageBlur => self.image_blur,
            IssueKey::CroppedImage => self.cropped_image,
            IssueKey::MrpPresentInImage => self.mrp_present_in_image,
            IssueKey::ImageQuality => self.image_quality,
            IssueKey::AspectRatio => self.aspect_ratio,
        }
    }

    /// Sets one flag.
    pub fn set(&mut self, key: IssueKey, value: bool) {
        let slot = match key {
            IssueKey::ImageBlur => &mut self.image_blur,
            IssueKey::CroppedImage => &mut self.cropped_image,
            IssueKey::MrpPresentInImage => &mut self.mrp_present_in_image,
            IssueKey::ImageQuality => &mut self.image_quality,
            IssueKey::AspectRatio => &mut self.aspect_ratio,
        };
        *slot = value;
    }

    /// Returns `true` if any flag is raised.
    #[must_use]
    pub fn any(&self) -> bool {
        IssueKey::ALL.into_iter().any(|k| self.get(k))
    }
}

/// A single change requested by a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewMutation {
    /// Flip REVIEWED / NOT_REVIEWED.
    ToggleStatus,
    /// Change one issue flag. `None` flips the current value.
    SetIssue {
        /// Flag to change.
        key: IssueKey,
        /// Explicit target value, or `None` to flip.
        value: Option<bool>,
    },
    /// Replace the remark. `None` clears it.
    SetRemark(Option<String>),
}

/// Mutable review document for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Current review status.
    pub status: ReviewStatus,
    /// Issue flags.
    pub issues: ImageIssues,
    /// Free-text reviewer remark.
    pub remark: Option<String>,
    /// Email of the last writer.
    pub updated_by: Option<String>,
    /// Time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// Applies `mutation` on top of `current` (or the default state when
    /// no document exists) and returns the new state with its audit event.
    ///
    /// Fields untouched by the mutation are carried over unchanged.
    #[must_use]
    pub fn apply(
        current: Option<&Self>,
        key: &ImageKey,
        mutation: &ReviewMutation,
        actor: &str,
        at: DateTime<Utc>,
    ) -> (Self, AuditEvent) {
        let before = current.cloned().unwrap_or_default();
        let mut after = before.clone();
        after.updated_by = Some(actor.to_string());
        after.updated_at = Some(at);

        let mut event = AuditEvent {
            event_id: Uuid::new_v4(),
            event_ts: at,
            event_type: AuditEventType::StatusChange,
            actor: actor.to_string(),
            product_variant_id: key.product_variant_id.clone(),
            image_index: key.image_index,
            old_status: None,
            new_status: None,
            issue_key: None,
            old_issue_value: None,
            new_issue_value: None,
            issues_snapshot: None,
            old_remark: None,
            new_remark: None,
        };

        match mutation {
            ReviewMutation::ToggleStatus => {
                after.status = before.status.toggled();
                event.old_status = Some(before.status);
                event.new_status = Some(after.status);
            }
            ReviewMutation::SetIssue { key: issue, value } => {
                let old = before.issues.get(*issue);
                let new = value.unwrap_or(!old);
                after.issues.set(*issue, new);
                event.event_type = AuditEventType::IssueChange;
                event.issue_key = Some(*issue);
                event.old_issue_value = Some(old);
                event.new_issue_value = Some(new);
                event.issues_snapshot = Some(after.issues);
            }
            ReviewMutation::SetRemark(remark) => {
                after.remark.clone_from(remark);
                event.event_type = AuditEventType::RemarkChange;
                event.old_remark.clone_from(&before.remark);
                event.new_remark.clone_from(remark);
            }
        }

        (after, event)
    }
}

/// Normalises a remark from user input: trims, maps empty to `None` and
/// rejects overly long text.
///
/// # Errors
///
/// Returns [`QcError::InvalidRequest`] if the remark exceeds
/// [`MAX_REMARK_CHARS`].
pub fn normalize_remark(raw: Option<&str>) -> Result<Option<String>, QcError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let chars = text.chars().count();
    if chars > MAX_REMARK_CHARS {
        return Err(QcError::InvalidRequest(format!(
            "remark is {chars} characters; maximum is {MAX_REMARK_CHARS}"
        )));
    }
    Ok(Some(text.to_string()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn key() -> ImageKey {
        ImageKey::new("PV-1", 1)
    }

    #[test]
    fn absent_state_is_not_reviewed_without_issues() {
        let state = ReviewState::default();
        assert_eq!(state.status, ReviewStatus::NotReviewed);
        assert!(!state.issues.any());
        assert!(state.remark.is_none());
    }

    #[test]
    fn toggle_twice_returns_to_original() {
        let now = Utc::now();
        let (once, e1) = ReviewState::apply(None, &key(), &ReviewMutation::ToggleStatus, "a@x.io", now);
        assert_eq!(once.status, ReviewStatus::Reviewed);
        assert_eq!(e1.old_status, Some(ReviewStatus::NotReviewed));
        assert_eq!(e1.new_status, Some(ReviewStatus::Reviewed));

        let (twice, e2) =
            ReviewState::apply(Some(&once), &key(), &ReviewMutation::ToggleStatus, "b@x.io", now);
        assert_eq!(twice.status, ReviewStatus::NotReviewed);
        assert_eq!(twice.updated_by.as_deref(), Some("b@x.io"));
        assert_ne!(e1.event_id, e2.event_id);
    }

    #[test]
    fn toggle_status_keeps_issues_and_remark() {
        let mut current = ReviewState::default();
        current.issues.set(IssueKey::ImageBlur, true);
        current.remark = Some("blurry".to_string());

        let (next, _) = ReviewState::apply(
            Some(&current),
            &key(),
            &ReviewMutation::ToggleStatus,
            "a@x.io",
            Utc::now(),
        );
        assert!(next.issues.image_blur);
        assert_eq!(next.remark.as_deref(), Some("blurry"));
    }

    #[test]
    fn set_issue_with_explicit_value_and_flip() {
        let set = ReviewMutation::SetIssue {
            key: IssueKey::CroppedImage,
            value: Some(true),
        };
        let (s1, e1) = ReviewState::apply(None, &key(), &set, "a@x.io", Utc::now());
        assert!(s1.issues.cropped_image);
        assert_eq!(e1.event_type, AuditEventType::IssueChange);
        assert_eq!(e1.old_issue_value, Some(false));
        assert_eq!(e1.new_issue_value, Some(true));
        assert_eq!(e1.issues_snapshot.map(|i| i.cropped_image), Some(true));

        let flip = ReviewMutation::SetIssue {
            key: IssueKey::CroppedImage,
            value: None,
        };
        let (s2, _) = ReviewState::apply(Some(&s1), &key(), &flip, "a@x.io", Utc::now());
        assert!(!s2.issues.cropped_image);
        assert_eq!(s2.status, ReviewStatus::NotReviewed);
    }

    #[test]
    fn remark_change_records_before_and_after() {
        let (s1, _) = ReviewState::apply(
            None,
            &key(),
            &ReviewMutation::SetRemark(Some("first".to_string())),
            "a@x.io",
            Utc::now(),
        );
        let (s2, e2) = ReviewState::apply(
            Some(&s1),
            &key(),
            &ReviewMutation::SetRemark(None),
            "a@x.io",
            Utc::now(),
        );
        assert!(s2.remark.is_none());
        assert_eq!(e2.event_type, AuditEventType::RemarkChange);
        assert_eq!(e2.old_remark.as_deref(), Some("first"));
        assert!(e2.new_remark.is_none());
    }

    #[test]
    fn issue_key_parsing() {
        assert_eq!("mrp_present_in_image".parse::<IssueKey>().ok(), Some(IssueKey::MrpPresentInImage));
        assert!(matches!(
            "watermark".parse::<IssueKey>(),
            Err(QcError::InvalidIssueKey(_))
        ));
    }

    #[test]
    fn issues_deserialize_missing_keys_as_false() {
        let Ok(issues) = serde_json::from_str::<ImageIssues>(r#"{"image_blur":true}"#) else {
            panic!("valid issues json");
        };
        assert!(issues.image_blur);
        assert!(!issues.aspect_ratio);
    }

    #[test]
    fn normalize_remark_trims_and_clears() {
        assert_eq!(normalize_remark(Some("  ok  ")).ok().flatten().as_deref(), Some("ok"));
        assert_eq!(normalize_remark(Some("   ")).ok(), Some(None));
        assert_eq!(normalize_remark(None).ok(), Some(None));
        let long = "x".repeat(MAX_REMARK_CHARS + 1);
        assert!(normalize_remark(Some(long.as_str())).is_err());
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&ReviewStatus::NotReviewed).unwrap_or_default();
        assert_eq!(json, "\"NOT_REVIEWED\"");
        assert_eq!("REVIEWED".parse::<ReviewStatus>().ok(), Some(ReviewStatus::Reviewed));
    }
}
