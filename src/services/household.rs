//! Household resolution
//!
//! Maps a caller onto the household it registers for. Signed-in callers
//! without a household get a minimal one built from their profile claims.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::database::traits::HouseholdDirectory;
use crate::models::CreateHouseholdRequest;
use crate::services::auth::Caller;
use crate::utils::errors::{PantryError, Result};

#[derive(Clone)]
pub struct HouseholdResolver {
    directory: Arc<dyn HouseholdDirectory>,
}

impl HouseholdResolver {
    pub fn new(directory: Arc<dyn HouseholdDirectory>) -> Self {
        Self { directory }
    }

    /// Household of the caller, if one exists
    pub async fn resolve_existing(&self, caller: &Caller) -> Result<Option<i64>> {
        let household = match caller {
            Caller::User { user_id, .. } => self.directory.find_by_owner(*user_id).await?,
            Caller::Guest { token } => self.directory.find_by_guest_token(token).await?,
        };

        Ok(household.map(|h| h.id))
    }

    /// Household of the caller, provisioning a minimal one when possible
    pub async fn resolve_or_provision(&self, caller: &Caller) -> Result<i64> {
        if let Some(household_id) = self.resolve_existing(caller).await? {
            return Ok(household_id);
        }

        let (Some(user_id), Some(name)) = (caller.user_id(), caller.profile_name()) else {
            warn!(caller = %caller.rate_limit_key(), "No household and no profile data to create one");
            return Err(PantryError::forbidden("Household not resolved"));
        };

        let request = CreateHouseholdRequest {
            name: format!("{} Household", name),
            owner_user_id: user_id,
            head_member_name: name,
        };

        match self.directory.create_minimal(request).await {
            Ok(household) => {
                info!(household_id = household.id, user_id = user_id, "Provisioned household for caller");
                Ok(household.id)
            }
            Err(e) => {
                // A concurrent request may have provisioned it first
                debug!(user_id = user_id, error = %e, "Household provisioning failed, re-reading");
                match self.directory.find_by_owner(user_id).await {
                    Ok(Some(household)) => Ok(household.id),
                    _ => {
                        warn!(user_id = user_id, error = %e, "Household could not be provisioned");
                        Err(PantryError::forbidden("Household not resolved"))
                    }
                }
            }
        }
    }

    /// Deduplicated attendee ids, all of which must be members of the household
    pub async fn validate_attendees(&self, household_id: i64, attendee_ids: &[i64]) -> Result<Vec<i64>> {
        let mut seen = HashSet::new();
        let attendees: Vec<i64> = attendee_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if attendees.is_empty() {
            return Ok(attendees);
        }

        let members: HashSet<i64> = self.directory.member_ids(household_id).await?.into_iter().collect();
        if let Some(unknown) = attendees.iter().find(|id| !members.contains(id)) {
            warn!(household_id = household_id, member_id = *unknown, "Attendee is not a household member");
            return Err(PantryError::bad_request(format!(
                "Attendee {} is not a member of this household",
                unknown
            )));
        }

        Ok(attendees)
    }
}
