use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use ts_rs::TS;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::pagination::Meta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, TS)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct IssueUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Extra {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Reference {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Reported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub user: Option<Uuid>,
}

/// A finding filed against a target. The project is always the target's project.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TS)]
#[serde(rename_all = "camelCase")]
pub struct TargetIssue {
    pub id: Uuid,
    #[sqlx(rename = "project_id")]
    pub project: Uuid,
    #[sqlx(rename = "target_id")]
    pub target: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub uniq_id: Option<String>,
    pub summary: String,
    #[serde(default)]
    #[sqlx(rename = "description")]
    pub desc: String,
    pub severity: Severity,
    #[sqlx(json)]
    #[serde(default)]
    pub urls: Vec<IssueUrl>,
    #[sqlx(json)]
    #[serde(default)]
    pub extras: Vec<Extra>,
    #[sqlx(json)]
    #[sqlx(rename = "reference_links")]
    #[serde(default)]
    pub references: Vec<Reference>,
    pub confirmed: bool,
    #[serde(rename = "false")]
    pub false_positive: bool,
    pub muted: bool,
    pub resolved: bool,
    #[sqlx(json)]
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl TargetIssue {
    /// A blank issue bound to `target` inside `project`, ready for an entity merge.
    pub fn new(project: Uuid, target: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project,
            target,
            uniq_id: None,
            summary: String::new(),
            desc: String::new(),
            severity: Severity::Info,
            urls: Vec::new(),
            extras: Vec::new(),
            references: Vec::new(),
            confirmed: false,
            false_positive: false,
            muted: false,
            resolved: false,
            activities: Vec::new(),
            created: now,
            updated: now,
        }
    }

    pub fn add_user_report_activity(&mut self, user: Uuid) {
        self.activities.push(Activity {
            kind: ActivityType::Reported,
            created: Utc::now(),
            user: Some(user),
        });
    }
}

/// Write-side projection of the mutable issue fields. Every field is
/// optional; absent fields leave the stored value untouched on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS)]
#[serde(rename_all = "camelCase")]
pub struct TargetIssueEntity {
    /// Target id. Only read on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    #[ts(optional)]
    pub uniq_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 120))]
    #[ts(optional)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10000))]
    #[ts(optional)]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    #[ts(optional)]
    pub urls: Option<Vec<IssueUrl>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    #[ts(optional)]
    pub extras: Option<Vec<Extra>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    #[ts(optional)]
    pub references: Option<Vec<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub confirmed: Option<bool>,
    #[serde(rename = "false", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub false_positive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub resolved: Option<bool>,
}

impl TargetIssueEntity {
    /// Field rules plus the fields a new issue cannot do without.
    pub fn validate_creating(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        let mut errors = ValidationErrors::new();
        if self.summary.as_deref().is_none_or(str::is_empty) {
            errors.add("summary", ValidationError::new("required"));
        }
        if self.severity.is_none() {
            errors.add("severity", ValidationError::new("required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges the present fields into `dst`. Returns `true` when a field the
    /// target summary depends on has changed.
    pub fn apply_to(&self, dst: &mut TargetIssue) -> bool {
        let mut rebuild_summary = false;

        if let Some(uniq_id) = &self.uniq_id {
            dst.uniq_id = (!uniq_id.is_empty()).then(|| uniq_id.clone());
        }
        if let Some(summary) = &self.summary {
            dst.summary = summary.clone();
        }
        if let Some(desc) = &self.desc {
            dst.desc = desc.clone();
        }
        if let Some(urls) = &self.urls {
            dst.urls = urls.clone();
        }
        if let Some(extras) = &self.extras {
            dst.extras = extras.clone();
        }
        if let Some(references) = &self.references {
            dst.references = references.clone();
        }
        if let Some(confirmed) = self.confirmed {
            dst.confirmed = confirmed;
        }

        if let Some(severity) = self.severity.filter(|s| *s != dst.severity) {
            dst.severity = severity;
            rebuild_summary = true;
        }
        for (value, slot) in [
            (self.false_positive, &mut dst.false_positive),
            (self.muted, &mut dst.muted),
            (self.resolved, &mut dst.resolved),
        ] {
            if let Some(value) = value.filter(|v| *v != *slot) {
                *slot = value;
                rebuild_summary = true;
            }
        }

        rebuild_summary
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListIssuesQuery {
    pub project: Option<Uuid>,
    pub target: Option<Uuid>,
    pub severity: Option<Severity>,
    pub confirmed: Option<bool>,
    #[serde(rename = "false")]
    pub false_positive: Option<bool>,
    pub muted: Option<bool>,
    pub resolved: Option<bool>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TargetIssueList {
    #[serde(flatten)]
    pub meta: Meta,
    pub results: Vec<TargetIssue>,
}
