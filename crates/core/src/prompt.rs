//! User prompts and notices raised by the cohort views.

use async_trait::async_trait;

/// Something the user is told after an action completes or fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Saved { name: String },
    SaveFailed,
    DeleteFailed,
    AnalyseFailed,
    /// Rejected before any request was made.
    Invalid(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Saved { name } => write!(f, "Cohort \"{name}\" saved successfully!"),
            Notice::SaveFailed => f.write_str("Failed to save cohort"),
            Notice::DeleteFailed => f.write_str("Failed to delete cohort"),
            Notice::AnalyseFailed => f.write_str("Failed to analyse cohort"),
            Notice::Invalid(message) => f.write_str(message),
        }
    }
}

/// Front-end hook for confirmations and notices.
///
/// `confirm` is awaited before destructive actions. Views never block on `notify`.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;

    fn notify(&self, notice: Notice);
}

pub(crate) fn delete_confirmation(name: &str) -> String {
    format!("Are you sure you want to delete \"{name}\"?")
}
