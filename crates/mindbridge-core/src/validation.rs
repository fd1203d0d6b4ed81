//! Required-field checks for the forms the client submits.
//!
//! These are a UX convenience: they catch empty input before a request is
//! made. The backend remains the authority on what it accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::child::{NewChild, parse_dob};
use crate::models::session::{Guardian, StartRequest};
use crate::models::user::{Role, SignupRequest};

/// Placeholder the backend expects for optional student details.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field check that failed for one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} is required"));
        }
    }

    fn push(&mut self, field: &'static str, message: String) {
        self.errors.push(FieldError { field, message });
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "invalid input: {}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// The add-child form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildForm {
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub school: String,
    pub parent_name: String,
    pub parent_mobile: String,
    pub teacher_name: Option<String>,
    pub teacher_mobile: Option<String>,
}

impl ChildForm {
    pub fn validate(&self) -> Result<NewChild, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("name", &self.name);
        errors.require("school", &self.school);
        errors.require("dob", &self.dob);
        errors.require("gender", &self.gender);
        if !self.dob.trim().is_empty()
            && let Err(e) = parse_dob(&self.dob)
        {
            errors.push("dob", e.to_string());
        }

        errors.finish(|| NewChild {
            name: self.name.trim().to_string(),
            dob: self.dob.trim().to_string(),
            gender: self.gender.trim().to_string(),
            school: self.school.trim().to_string(),
            parent_name: self.parent_name.clone(),
            parent_mobile: self.parent_mobile.clone(),
            teacher_name: non_blank(&self.teacher_name),
            teacher_mobile: non_blank(&self.teacher_mobile),
        })
    }
}

/// The start-questionnaire form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartForm {
    pub student_name: String,
    pub student_dob: String,
    pub student_gender: String,
    pub school: String,
    pub guardian: Option<Guardian>,
    pub guardian_mobile: Option<String>,
    pub questionnaire_name: String,
    pub tnc_accepted: bool,
}

impl StartForm {
    pub fn validate(&self) -> Result<StartRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.require("student_name", &self.student_name);
        errors.require("student_dob", &self.student_dob);
        errors.require("student_gender", &self.student_gender);
        errors.require("questionnaire_name", &self.questionnaire_name);
        if let Some(Guardian::Parent(name) | Guardian::Teacher(name)) = &self.guardian {
            errors.require("guardian_name", name);
        }
        if !self.tnc_accepted {
            errors.push(
                "tnc_accepted",
                "terms and conditions must be accepted".to_string(),
            );
        }

        let mobile = non_blank(&self.guardian_mobile);
        let (parent_name, parent_mobile, teacher_name, teacher_mobile) = match &self.guardian {
            Some(Guardian::Parent(name)) => (Some(name.trim().to_string()), mobile, None, None),
            Some(Guardian::Teacher(name)) => (None, None, Some(name.trim().to_string()), mobile),
            None => (None, None, None, None),
        };
        let school = match self.school.trim() {
            "" => NOT_SPECIFIED.to_string(),
            s => s.to_string(),
        };

        errors.finish(|| StartRequest {
            student_name: self.student_name.trim().to_string(),
            student_dob: self.student_dob.trim().to_string(),
            student_gender: self.student_gender.trim().to_string(),
            parent_name,
            parent_mobile,
            teacher_name,
            teacher_mobile,
            school: Some(school),
            questionnaire_name: self.questionnaire_name.trim().to_string(),
            tnc_accepted: self.tnc_accepted,
        })
    }
}

/// The signup form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupForm {
    pub role: Option<Role>,
    pub name: String,
    pub school: String,
    pub mobile: String,
    pub password: String,
    pub confirm_password: String,
    pub otp: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.role.is_none() {
            errors.push("role", "role is required".to_string());
        }
        errors.require("name", &self.name);
        errors.require("mobile", &self.mobile);
        errors.require("password", &self.password);
        errors.require("otp", &self.otp);
        if self.role == Some(Role::Teacher) {
            errors.require("school", &self.school);
        }
        if self.password != self.confirm_password {
            errors.push("confirm_password", "passwords do not match".to_string());
        }

        match self.role {
            Some(role) => errors.finish(|| SignupRequest {
                role,
                name: self.name.trim().to_string(),
                school: (role == Role::Teacher).then(|| self.school.trim().to_string()),
                mobile: self.mobile.trim().to_string(),
                password: self.password.clone(),
                otp: self.otp.trim().to_string(),
            }),
            None => Err(errors),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
