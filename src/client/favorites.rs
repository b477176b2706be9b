//! # Local Favorites State
//!
//! The in-memory favorites set for the signed-in user, and the single source
//! of truth for anything that renders favorites.
//!
//! The set lives inside a `tokio::sync::watch` channel. The sync coordinator
//! is the only writer; screens hold receivers obtained from
//! [`LocalFavoritesState::subscribe`] and drop them to unsubscribe. Every
//! mutation that changes the observable view notifies receivers before the
//! mutating call returns. Mutations that leave the view unchanged do not
//! notify, which keeps `initialize` idempotent from an observer's point of
//! view.
//!
//! ## Usage
//!
//! ```rust
//! use ardelyoum::client::favorites::LocalFavoritesState;
//! use ardelyoum::shared::{FavoriteSet, ItemId, UserId};
//!
//! let state = LocalFavoritesState::new();
//! let screen = state.subscribe();
//!
//! state.initialize(UserId::from("u1"), ["offerA"].into_iter().collect::<FavoriteSet>());
//! assert!(state.toggle(&ItemId::from("offerB")).unwrap());
//! assert!(screen.borrow().contains(&ItemId::from("offerB")));
//! ```

use crate::shared::error::{Result, SyncError};
use crate::shared::favorites::{FavoriteSet, ItemId, UserId};
use serde::Serialize;
use tokio::sync::watch;

/// Read-only snapshot handed to observers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FavoritesView {
    /// User the set is scoped to; `None` when signed out
    pub user_id: Option<UserId>,
    /// Favorite item ids
    pub ids: FavoriteSet,
}

impl FavoritesView {
    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.ids.contains(item_id)
    }
}

/// Optimistic favorites state for the current session
#[derive(Debug)]
pub struct LocalFavoritesState {
    view: watch::Sender<FavoritesView>,
}

impl LocalFavoritesState {
    /// Create an unscoped, empty state
    pub fn new() -> Self {
        let (view, _) = watch::channel(FavoritesView::default());
        Self { view }
    }

    /// Replace the set with `ids`, scoped to `user_id`
    pub fn initialize(&self, user_id: UserId, ids: FavoriteSet) {
        self.view.send_if_modified(|view| {
            if view.user_id.as_ref() == Some(&user_id) && view.ids == ids {
                return false;
            }
            view.user_id = Some(user_id);
            view.ids = ids;
            true
        });
    }

    /// Flip membership of `item_id` and return the resulting membership
    pub fn toggle(&self, item_id: &ItemId) -> Result<bool> {
        let mut outcome = Err(SyncError::NoActiveSession);
        self.view.send_if_modified(|view| {
            if view.user_id.is_none() {
                return false;
            }
            let member = if view.ids.remove(item_id) {
                false
            } else {
                view.ids.insert(item_id.clone());
                true
            };
            outcome = Ok(member);
            true
        });
        outcome
    }

    /// Swap in a reconciled set for the user already in scope
    ///
    /// Returns false, leaving the state untouched, when `user_id` is not the
    /// scoped user.
    pub fn replace_ids(&self, user_id: &UserId, ids: FavoriteSet) -> bool {
        let mut applied = false;
        self.view.send_if_modified(|view| {
            if view.user_id.as_ref() != Some(user_id) {
                return false;
            }
            applied = true;
            if view.ids == ids {
                return false;
            }
            view.ids = ids;
            true
        });
        applied
    }

    /// Empty the set and drop the user scope
    pub fn clear(&self) {
        self.view.send_if_modified(|view| {
            if view.user_id.is_none() && view.ids.is_empty() {
                return false;
            }
            *view = FavoritesView::default();
            true
        });
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.view.borrow().contains(item_id)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.view.borrow().user_id.clone()
    }

    /// Current view
    pub fn snapshot(&self) -> FavoritesView {
        self.view.borrow().clone()
    }

    /// Subscribe to changes; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> watch::Receiver<FavoritesView> {
        self.view.subscribe()
    }
}

impl Default for LocalFavoritesState {
    fn default() -> Self {
        Self::new()
    }
}
