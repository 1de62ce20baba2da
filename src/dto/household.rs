use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::HouseholdEntity,
    dto::{
        format_system_time,
        validation::{validate_invite_code_input, validate_not_blank},
    },
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateHouseholdRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub name: String,
}

/// Invite code typed by the user; case and surrounding whitespace are ignored.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinHouseholdRequest {
    #[validate(custom(function = "validate_invite_code_input"))]
    pub invite_code: String,
}

/// Entry of the household list used by filter pickers.
#[derive(Debug, Serialize, ToSchema)]
pub struct HouseholdListItem {
    pub id: Uuid,
    pub name: String,
    pub member_count: usize,
}

impl From<HouseholdEntity> for HouseholdListItem {
    fn from(household: HouseholdEntity) -> Self {
        Self {
            id: household.id,
            name: household.name,
            member_count: household.members.len(),
        }
    }
}

/// Household detail, visible to members only.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HouseholdSummary {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<String>,
    pub created_by: String,
    pub created_at: String,
    pub invite_code: Option<String>,
}

impl From<HouseholdEntity> for HouseholdSummary {
    fn from(household: HouseholdEntity) -> Self {
        Self {
            id: household.id,
            name: household.name,
            members: household.members,
            created_by: household.created_by,
            created_at: format_system_time(household.created_at),
            invite_code: household.invite_code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCodeResponse {
    pub invite_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_household_name_is_rejected() {
        let request = CreateHouseholdRequest { name: "  ".into() };
        assert!(request.validate().is_err());
    }

    #[test]
    fn lowercase_invite_code_passes_validation() {
        let request = JoinHouseholdRequest {
            invite_code: "abc123".into(),
        };
        assert!(request.validate().is_ok());
    }
}
