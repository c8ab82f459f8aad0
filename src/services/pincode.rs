//! Current-location (pincode) state and its persistence
//!
//! The active pincode is one optional value per visitor. Authenticated users keep
//! it on their profile; anonymous visitors keep it in the session store. Callers
//! switching to a new value run [`PincodeState::check_compatibility`] first so
//! that cart warnings describe the state as it was before the switch.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{cart::Cart, location::Locality, pincode::Pincode, user::Viewer},
    repository::Repository,
    services::directory::LocationDirectory,
};

/// Emitted by every accepted mutation; the caller reloads location-dependent
/// views (catalog, featured strip) when `changed()` is true
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PincodeChange {
    pub previous: Option<Pincode>,
    pub current: Option<Pincode>,
}

impl PincodeChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Effect a pincode switch would have on the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CompatibilityResult {
    /// Value before the switch
    pub previous: Option<Pincode>,
    pub changed: bool,
    /// True when every cart item is located in the new pincode
    pub all_items_compatible: bool,
    /// Cart items that would no longer match
    pub affected_items_count: usize,
}

/// The active location of one visitor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PincodeState {
    value: Option<Pincode>,
}

impl PincodeState {
    pub fn new(value: Option<Pincode>) -> Self {
        Self { value }
    }

    /// Profile pincode wins over the locally persisted one
    pub fn initialize(profile: Option<Pincode>, local: Option<Pincode>) -> Self {
        Self {
            value: profile.or(local),
        }
    }

    pub fn get(&self) -> Option<&Pincode> {
        self.value.as_ref()
    }

    /// Validate and store a raw submission; state is untouched on error
    pub fn set(&mut self, raw: &str) -> AppResult<PincodeChange> {
        let pincode = Pincode::parse(raw)?;
        Ok(self.apply(pincode))
    }

    pub fn apply(&mut self, pincode: Pincode) -> PincodeChange {
        let previous = self.value.replace(pincode);
        PincodeChange {
            previous,
            current: self.value.clone(),
        }
    }

    pub fn clear(&mut self) -> PincodeChange {
        PincodeChange {
            previous: self.value.take(),
            current: None,
        }
    }

    /// Compare the cart against `next` before switching to it.
    ///
    /// Clearing the location (`next = None`) affects no items: the cart becomes
    /// location-required rather than incompatible.
    pub fn check_compatibility(&self, next: Option<&Pincode>, cart: &Cart) -> CompatibilityResult {
        let affected_items_count = match next {
            None => 0,
            Some(next) => {
                let located_elsewhere: usize = cart
                    .pincode_groups()
                    .iter()
                    .filter(|g| &g.pincode != next)
                    .map(|g| g.item_count)
                    .sum();
                let unlocated = cart.items.iter().filter(|i| i.pincode.is_none()).count();
                located_elsewhere + unlocated
            }
        };

        CompatibilityResult {
            previous: self.value.clone(),
            changed: self.value.as_ref() != next,
            all_items_compatible: affected_items_count == 0,
            affected_items_count,
        }
    }
}

/// Loads and persists [`PincodeState`] for a viewer
#[derive(Clone)]
pub struct PincodeService {
    repository: Repository,
    directory: Arc<dyn LocationDirectory>,
}

impl PincodeService {
    pub fn new(repository: Repository, directory: Arc<dyn LocationDirectory>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Read the viewer's state: profile > session > absent
    pub async fn load(&self, viewer: &Viewer) -> AppResult<PincodeState> {
        let profile = match viewer.user_id() {
            Some(user_id) => self.repository.users.get(user_id).await?.pincode,
            None => None,
        };

        let local = match &viewer.session_id {
            Some(session_id) => match self.repository.sessions.get_pincode(session_id).await {
                Ok(local) => local,
                Err(e) => {
                    tracing::warn!("Session pincode unavailable, treating as unset: {}", e);
                    None
                }
            },
            None => None,
        };

        if let (Some(profile), Some(session_id)) = (&profile, &viewer.session_id) {
            if local.as_ref() != Some(profile) {
                if let Err(e) = self.repository.sessions.set_pincode(session_id, profile).await {
                    tracing::warn!("Failed to sync session pincode: {}", e);
                }
            }
        }

        Ok(PincodeState::initialize(profile, local))
    }

    /// The viewer's cart; anonymous visitors have none
    async fn cart_of(&self, viewer: &Viewer) -> AppResult<Option<Cart>> {
        match viewer.user_id() {
            Some(user_id) => Ok(Some(self.repository.carts.get(user_id).await?)),
            None => Ok(None),
        }
    }

    /// Compatibility of switching to `raw`, computed against the current state
    pub async fn preview_switch(&self, viewer: &Viewer, raw: &str) -> AppResult<CompatibilityResult> {
        let next = Pincode::parse(raw)?;
        let state = self.load(viewer).await?;
        let cart = self
            .cart_of(viewer)
            .await?
            .unwrap_or_else(|| Cart::empty(uuid::Uuid::nil()));
        Ok(state.check_compatibility(Some(&next), &cart))
    }

    /// Validate and persist a new pincode
    pub async fn set(&self, viewer: &Viewer, raw: &str) -> AppResult<PincodeChange> {
        let pincode = Pincode::parse(raw)?;
        self.switch_to(viewer, pincode).await.map(|(_, change)| change)
    }

    /// Run the pre-switch compatibility check, then persist `pincode`
    pub async fn switch_to(
        &self,
        viewer: &Viewer,
        pincode: Pincode,
    ) -> AppResult<(CompatibilityResult, PincodeChange)> {
        let mut state = self.load(viewer).await?;
        let cart = self
            .cart_of(viewer)
            .await?
            .unwrap_or_else(|| Cart::empty(uuid::Uuid::nil()));
        let compatibility = state.check_compatibility(Some(&pincode), &cart);

        let change = state.apply(pincode.clone());
        self.persist(viewer, Some(&pincode)).await?;

        if change.changed() {
            tracing::info!(
                previous = ?change.previous.as_ref().map(Pincode::as_str),
                current = %pincode,
                affected_items = compatibility.affected_items_count,
                "Pincode changed"
            );
        }

        Ok((compatibility, change))
    }

    /// Remove the stored pincode ("skip")
    pub async fn clear(&self, viewer: &Viewer) -> AppResult<PincodeChange> {
        let mut state = self.load(viewer).await?;
        let change = state.clear();
        self.persist(viewer, None).await?;
        if change.changed() {
            tracing::info!("Pincode cleared");
        }
        Ok(change)
    }

    async fn persist(&self, viewer: &Viewer, pincode: Option<&Pincode>) -> AppResult<()> {
        if viewer.user_id().is_none() && viewer.session_id.is_none() {
            return Err(AppError::Validation(
                "A session id is required to remember a location".to_string(),
            ));
        }

        if let Some(user_id) = viewer.user_id() {
            self.repository
                .users
                .set_pincode(user_id, pincode.cloned())
                .await?;
        }

        if let Some(session_id) = &viewer.session_id {
            let result = match pincode {
                Some(p) => self.repository.sessions.set_pincode(session_id, p).await,
                None => self.repository.sessions.clear_pincode(session_id).await,
            };
            match result {
                Ok(()) => {}
                // The profile already holds the value for logged-in users
                Err(e) if viewer.user_id().is_some() => {
                    tracing::warn!("Failed to mirror pincode into session: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Best-effort locality lookup; failures degrade to an empty list
    pub async fn localities(&self, raw: &str) -> AppResult<Vec<Locality>> {
        let pincode = Pincode::parse(raw)?;
        match self.directory.lookup(&pincode).await {
            Ok(localities) => Ok(localities),
            Err(e) => {
                tracing::warn!(pincode = %pincode, "Location lookup failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
