use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A child/student record. The backend is the source of truth; the client
/// list is a cache refreshed after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// `YYYY-MM-DD`.
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub parent_mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Child {
    /// The server-computed age, falling back to the same year-difference
    /// rule when the record predates that field.
    pub fn age_on(&self, today: jiff::civil::Date) -> Option<i64> {
        self.age.or_else(|| age_in_year(&self.dob, today).ok())
    }
}

/// Body of an add-child request. Built from a validated
/// [`ChildForm`](crate::validation::ChildForm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChild {
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub school: String,
    pub parent_name: String,
    pub parent_mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_mobile: Option<String>,
}

impl NewChild {
    /// The record the server will hold once the add succeeds.
    pub fn into_child(self, id: String, today: jiff::civil::Date) -> Child {
        let age = age_in_year(&self.dob, today).ok();
        Child {
            id,
            name: self.name,
            dob: self.dob,
            gender: self.gender,
            school: self.school,
            parent_name: self.parent_name,
            parent_mobile: self.parent_mobile,
            teacher_name: self.teacher_name,
            teacher_mobile: self.teacher_mobile,
            age,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Parse a `YYYY-MM-DD` date of birth.
pub fn parse_dob(dob: &str) -> Result<jiff::civil::Date, CoreError> {
    dob.trim()
        .parse::<jiff::civil::Date>()
        .map_err(|_| CoreError::InvalidDate {
            value: dob.to_string(),
        })
}

/// Age as the backend computes it: current year minus birth year. Birthdays
/// later in the year are not accounted for.
pub fn age_in_year(dob: &str, today: jiff::civil::Date) -> Result<i64, CoreError> {
    let born = parse_dob(dob)?;
    Ok(i64::from(today.year()) - i64::from(born.year()))
}
