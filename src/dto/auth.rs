use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::UserEntity,
    dto::{format_system_time, household::HouseholdSummary, validation::validate_not_blank},
};

/// Sign-in method reported by the auth provider.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Password,
    Federated,
}

/// Identity verified by the auth provider, exchanged for a bearer token.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SessionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub uid: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub display_name: String,
    pub provider: AuthProvider,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub household_id: Option<Uuid>,
    pub created_at: String,
}

impl From<UserEntity> for UserSummary {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            household_id: user.household_id,
            created_at: format_system_time(user.created_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Opaque token to send as `Authorization: Bearer <token>`.
    pub token: String,
    pub user: UserSummary,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserSummary,
    pub household: Option<HouseholdSummary>,
}
