pub mod child;
pub mod questionnaire;
pub mod review;
pub mod session;
pub mod transcript;
pub mod user;
