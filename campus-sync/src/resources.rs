//! Known dashboard resources and their typed records.
//!
//! Every typed record keeps the fields the dashboard knows about and
//! collects anything else the server sends into `extra`, so records survive
//! a round trip through the controller unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::record::{Record, RecordId};

/// Collection endpoints exposed by the dashboard API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Teacher,
    Student,
    Faculty,
    Department,
    Certificate,
    DonationCategory,
    Donation,
    SalaryType,
    JobPost,
    Page,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Teacher,
        ResourceKind::Student,
        ResourceKind::Faculty,
        ResourceKind::Department,
        ResourceKind::Certificate,
        ResourceKind::DonationCategory,
        ResourceKind::Donation,
        ResourceKind::SalaryType,
        ResourceKind::JobPost,
        ResourceKind::Page,
    ];

    /// Endpoint path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Teacher => "/teacher-list",
            ResourceKind::Student => "/student",
            ResourceKind::Faculty => "/faculty",
            ResourceKind::Department => "/department",
            ResourceKind::Certificate => "/certificate",
            ResourceKind::DonationCategory => "/donation/categories",
            ResourceKind::Donation => "/donation",
            ResourceKind::SalaryType => "/salary-type",
            ResourceKind::JobPost => "/job-post",
            ResourceKind::Page => "/page",
        }
    }

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Teacher => "teacher",
            ResourceKind::Student => "student",
            ResourceKind::Faculty => "faculty",
            ResourceKind::Department => "department",
            ResourceKind::Certificate => "certificate",
            ResourceKind::DonationCategory => "donation-category",
            ResourceKind::Donation => "donation",
            ResourceKind::SalaryType => "salary-type",
            ResourceKind::JobPost => "job-post",
            ResourceKind::Page => "page",
        }
    }

    /// Field the list screen toggles, if it has one.
    pub fn toggle_field(self) -> Option<&'static str> {
        match self {
            ResourceKind::Certificate | ResourceKind::JobPost | ResourceKind::Page => {
                Some("status")
            }
            ResourceKind::Donation => None,
            _ => Some("active"),
        }
    }

    /// Columns shown in list tables, in display order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Teacher => &["id", "name", "email", "designation", "active"],
            ResourceKind::Student => &["id", "name", "roll_no", "class", "batch", "section", "active"],
            ResourceKind::Faculty => &["id", "name", "code", "active"],
            ResourceKind::Department => &["id", "name", "faculty_id", "active"],
            ResourceKind::Certificate => &["id", "title", "student_id", "issued_on", "status"],
            ResourceKind::DonationCategory => &["id", "name", "description", "active"],
            ResourceKind::Donation => &["id", "donor_name", "category_id", "amount", "status"],
            ResourceKind::SalaryType => &["id", "name", "amount", "active"],
            ResourceKind::JobPost => &["id", "title", "vacancies", "deadline", "status"],
            ResourceKind::Page => &["id", "title", "slug", "status"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Accepts the short name or the endpoint path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_matches('/');
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.path().trim_matches('/') == wanted)
            .ok_or_else(|| format!("unknown resource '{}'", s))
    }
}

fn default_status() -> String {
    "draft".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<RecordId>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_phone: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_id: Option<RecordId>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationCategory {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: RecordId,
    pub donor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donated_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryType {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancies: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Record for $ty {
                fn id(&self) -> RecordId {
                    self.id.clone()
                }
            }
        )+
    };
}

impl_record!(
    Teacher,
    Student,
    Faculty,
    Department,
    Certificate,
    DonationCategory,
    Donation,
    SalaryType,
    JobPost,
    Page,
);
