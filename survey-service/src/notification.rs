//! Toast text shown by hosts once a submission settles.

use serde::{Deserialize, Serialize};

use crate::session::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Destructive,
}

/// User-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn submitted() -> Self {
        Self {
            title: "Pesquisa enviada com sucesso!".to_string(),
            description: "Sua contribuição ajudará a plantar mais árvores.".to_string(),
            kind: NotificationKind::Success,
        }
    }

    /// Same text for every failure cause.
    pub fn failed() -> Self {
        Self {
            title: "Erro ao enviar pesquisa".to_string(),
            description: "Por favor, tente novamente.".to_string(),
            kind: NotificationKind::Destructive,
        }
    }

    /// Notification for a settled status; `None` while idle or in flight.
    pub fn for_status(status: &SubmissionStatus) -> Option<Self> {
        match status {
            SubmissionStatus::Succeeded(_) => Some(Self::submitted()),
            SubmissionStatus::Failed { .. } => Some(Self::failed()),
            SubmissionStatus::Idle | SubmissionStatus::InFlight => None,
        }
    }
}
