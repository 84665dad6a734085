use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Participante. `login` é a chave primária e nunca muda depois de criado.
///
/// The password is accepted on input but never serialized back: after
/// creation it only ever holds the bcrypt hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub login: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl Participant {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.login.trim().is_empty() {
            return Err(AppError::BadRequest("Participant login is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::BadRequest("Participant password is required".to_string()));
        }
        Ok(())
    }
}

/// Request para atualizar participante. Campos ausentes (ou null) ficam como estão.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParticipantRequest {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateParticipantRequest {
    /// Overwrites the profile fields that are present. The password is left
    /// to the caller because it has to be hashed first.
    pub fn apply_profile(&self, participant: &mut Participant) {
        if let Some(first_name) = &self.first_name {
            participant.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            participant.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            participant.email = email.clone();
        }
    }
}
