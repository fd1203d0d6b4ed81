use std::collections::HashMap;

use tracing::info;

use mindbridge_core::models::review::{ChatRecord, DiagnosisUpdate, ReviewRow};

use crate::backend::Backend;
use crate::error::BotError;

/// School filter value that disables filtering.
pub const ALL_SCHOOLS: &str = "All Schools";

/// The psychologist's list of sessions with editable diagnoses.
///
/// Drafts are local until saved. A save changes the saved row only after
/// the backend accepts it.
#[derive(Debug, Clone, Default)]
pub struct ReviewTable {
    rows: Vec<ReviewRow>,
    schools: Vec<String>,
    drafts: HashMap<String, String>,
    school_filter: Option<String>,
    search: String,
}

impl ReviewTable {
    pub fn new(rows: Vec<ReviewRow>, schools: Vec<String>) -> Self {
        Self {
            rows,
            schools,
            ..Self::default()
        }
    }

    pub async fn load<B: Backend>(backend: &B) -> Result<Self, BotError> {
        let rows = backend.chat_responses().await?;
        let schools = backend.unique_schools().await?;
        Ok(Self::new(rows, schools))
    }

    pub fn rows(&self) -> &[ReviewRow] {
        &self.rows
    }

    pub fn row(&self, session_id: &str) -> Option<&ReviewRow> {
        self.rows.iter().find(|r| r.session_id == session_id)
    }

    /// Filter choices, [`ALL_SCHOOLS`] first.
    pub fn school_choices(&self) -> Vec<&str> {
        std::iter::once(ALL_SCHOOLS)
            .chain(self.schools.iter().map(String::as_str))
            .collect()
    }

    pub fn set_school_filter(&mut self, school: &str) {
        self.school_filter = if school == ALL_SCHOOLS || school.is_empty() {
            None
        } else {
            Some(school.to_string())
        };
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
    }

    /// Rows passing the school filter whose student, parent or school
    /// contains the search term, ignoring case.
    pub fn visible(&self) -> Vec<&ReviewRow> {
        self.rows
            .iter()
            .filter(|row| match &self.school_filter {
                Some(school) => row.school.as_deref() == Some(school.as_str()),
                None => true,
            })
            .filter(|row| self.search.is_empty() || self.matches_search(row))
            .collect()
    }

    fn matches_search(&self, row: &ReviewRow) -> bool {
        [
            Some(row.student_name.as_str()),
            row.parent_name.as_deref(),
            row.school.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&self.search))
    }

    pub fn diagnosed_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_diagnosed()).count()
    }

    pub fn set_draft(&mut self, session_id: &str, diagnosis: impl Into<String>) {
        self.drafts.insert(session_id.to_string(), diagnosis.into());
    }

    /// The unsaved draft for a session, else its saved diagnosis.
    pub fn draft(&self, session_id: &str) -> Option<&str> {
        self.drafts
            .get(session_id)
            .map(String::as_str)
            .or_else(|| self.row(session_id).and_then(|r| r.diagnosis.as_deref()))
    }

    /// Save `diagnosis` for one session. Only the row with that id changes,
    /// and only once the backend has accepted it.
    pub async fn save_diagnosis<B: Backend>(
        &mut self,
        backend: &B,
        session_id: &str,
        diagnosis: &str,
    ) -> Result<(), BotError> {
        let update = DiagnosisUpdate {
            session_id: session_id.to_string(),
            diagnosis: diagnosis.to_string(),
        };
        backend.update_diagnosis(&update).await?;

        for row in self.rows.iter_mut().filter(|r| r.session_id == session_id) {
            row.diagnosis = Some(update.diagnosis.clone());
        }
        self.drafts.remove(session_id);
        info!(session_id, "diagnosis saved");
        Ok(())
    }

    /// Save the pending draft for a session, if there is one.
    pub async fn save_draft<B: Backend>(
        &mut self,
        backend: &B,
        session_id: &str,
    ) -> Result<bool, BotError> {
        let Some(diagnosis) = self.drafts.get(session_id).cloned() else {
            return Ok(false);
        };
        self.save_diagnosis(backend, session_id, &diagnosis).await?;
        Ok(true)
    }

    pub async fn detail<B: Backend>(
        &self,
        backend: &B,
        session_id: &str,
    ) -> Result<ChatRecord, BotError> {
        Ok(backend.chat_record(session_id).await?)
    }
}
