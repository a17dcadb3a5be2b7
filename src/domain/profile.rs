use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::store::Document;

/// How many delivery addresses a profile may keep.
pub const MAX_SAVED_ADDRESSES: usize = 3;

/// A delivery address saved against a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub label: String,
    pub address: String,
}

/// A customer profile keyed by the identity provider's user id.
///
/// Created on first login and mutated by profile edits; the system
/// never deletes profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub addresses: Vec<SavedAddress>,
    pub is_admin: bool,
}

/// Payload for the first-login profile bootstrap. `user_id` comes from
/// the identity provider and becomes the document id as-is.
#[derive(Debug, Clone)]
pub struct ProfileCreate {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Payload for profile edits.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub addresses: Option<Vec<SavedAddress>>,
}

impl Document for UserProfile {
    type Id = String;
    type CreatePayload = ProfileCreate;
    type Patch = ProfilePatch;
    type Filter = ();
    type SortKey = String;
    type Error = ProfileError;

    const COLLECTION: &'static str = "users";

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create(_id: String, payload: ProfileCreate) -> Result<Self, ProfileError> {
        if payload.user_id.trim().is_empty() {
            return Err(ProfileError::Validation("user id is required".into()));
        }
        Ok(Self {
            id: payload.user_id,
            name: payload.name,
            phone: payload.phone,
            email: payload.email,
            addresses: Vec::new(),
            is_admin: false,
        })
    }

    fn on_update(&mut self, patch: ProfilePatch) -> Result<(), ProfileError> {
        if let Some(addresses) = &patch.addresses {
            if addresses.len() > MAX_SAVED_ADDRESSES {
                return Err(ProfileError::Validation(format!(
                    "a profile keeps at most {MAX_SAVED_ADDRESSES} saved addresses"
                )));
            }
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(addresses) = patch.addresses {
            self.addresses = addresses;
        }
        Ok(())
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn sort_key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> ProfileCreate {
        ProfileCreate {
            user_id: "uid_abc".into(),
            name: "Alice".into(),
            phone: "9999999999".into(),
            email: "alice@example.com".into(),
        }
    }

    #[test]
    fn profile_keeps_identity_provider_id() {
        // The store-generated id is ignored; the auth uid wins.
        let profile = UserProfile::from_create("profile_1".into(), create()).unwrap();
        assert_eq!(profile.id, "uid_abc");
        assert!(!profile.is_admin);
        assert!(profile.addresses.is_empty());
    }

    #[test]
    fn patch_caps_saved_addresses_at_three() {
        let mut profile = UserProfile::from_create("profile_1".into(), create()).unwrap();
        let address = |label: &str| SavedAddress {
            label: label.into(),
            address: "somewhere".into(),
        };

        profile
            .on_update(ProfilePatch {
                addresses: Some(vec![address("home"), address("work"), address("hostel")]),
                ..ProfilePatch::default()
            })
            .unwrap();
        assert_eq!(profile.addresses.len(), 3);

        let err = profile
            .on_update(ProfilePatch {
                addresses: Some(vec![
                    address("a"),
                    address("b"),
                    address("c"),
                    address("d"),
                ]),
                ..ProfilePatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, ProfileError::Validation(_)));
        // The rejected patch left the profile untouched.
        assert_eq!(profile.addresses.len(), 3);
    }
}
