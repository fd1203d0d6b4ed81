//! Client-side state shared by the front end's screens.
//!
//! The store is owned by the single task driving the user's actions, so
//! none of it is synchronised.

use mindbridge_core::models::child::Child;
use mindbridge_core::models::questionnaire::QuestionnaireSummary;
use mindbridge_core::models::user::{Credentials, User};

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    credentials: Option<Credentials>,
}

impl AuthState {
    pub fn sign_in(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn sign_out(&mut self) {
        self.credentials = None;
    }

    /// Current credentials, treating an expired token as absent.
    pub fn credentials(&self, now: jiff::Timestamp) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| !c.is_expired(now))
    }

    pub fn user(&self, now: jiff::Timestamp) -> Option<&User> {
        self.credentials(now).map(|c| &c.user)
    }

    pub fn is_authenticated(&self, now: jiff::Timestamp) -> bool {
        self.credentials(now).is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChildrenState {
    children: Vec<Child>,
    selected: Option<String>,
}

impl ChildrenState {
    pub fn all(&self) -> &[Child] {
        &self.children
    }

    pub fn set(&mut self, children: Vec<Child>) {
        if let Some(id) = &self.selected
            && !children.iter().any(|c| &c.id == id)
        {
            self.selected = None;
        }
        self.children = children;
    }

    pub fn add(&mut self, child: Child) {
        self.children.push(child);
    }

    /// Drop a child, clearing the selection if it pointed at it.
    pub fn remove(&mut self, child_id: &str) -> Option<Child> {
        let index = self.children.iter().position(|c| c.id == child_id)?;
        if self.selected.as_deref() == Some(child_id) {
            self.selected = None;
        }
        Some(self.children.remove(index))
    }

    pub fn get(&self, child_id: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.id == child_id)
    }

    /// Select a known child. Returns false if the id is not in the list.
    pub fn select(&mut self, child_id: &str) -> bool {
        if self.get(child_id).is_some() {
            self.selected = Some(child_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Child> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.selected = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireState {
    pub available: Vec<QuestionnaireSummary>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    pub auth: AuthState,
    pub children: ChildrenState,
    pub questionnaire: QuestionnaireState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything tied to the signed-in user.
    pub fn logout(&mut self) {
        self.auth.sign_out();
        self.children.clear();
        self.questionnaire = QuestionnaireState::default();
    }
}
