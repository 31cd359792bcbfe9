// FollowDiff - core/reconcile.rs
//
// Owns the two canonical username sets and the derived non-follower list.
//
// The list is computed in full once both sides are present and then only
// re-sorted or filtered; UI interactions never redo the set difference.
// Replacing either side invalidates the list until the next recompute.

use crate::core::filter;
use crate::core::model::{Side, SortDirection, Statistics, Username, UsernameSet};
use crate::util::error::ReconcileError;

/// Canonical reconciliation state for one session.
#[derive(Debug, Default)]
pub struct Reconciler {
    followers: Option<UsernameSet>,
    following: Option<UsernameSet>,

    /// `None` until computed, and again after either side is replaced.
    non_followers: Option<Vec<Username>>,

    sort: SortDirection,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the follower set wholesale.
    pub fn set_followers(&mut self, set: UsernameSet) {
        self.set_side(Side::Followers, set);
    }

    /// Replace the following set wholesale.
    pub fn set_following(&mut self, set: UsernameSet) {
        self.set_side(Side::Following, set);
    }

    /// Replace one side wholesale, discarding everything from the prior set.
    pub fn set_side(&mut self, side: Side, set: UsernameSet) {
        tracing::debug!(side = %side, size = set.len(), "Replacing canonical set");
        match side {
            Side::Followers => self.followers = Some(set),
            Side::Following => self.following = Some(set),
        }
        self.non_followers = None;
    }

    pub fn is_loaded(&self, side: Side) -> bool {
        match side {
            Side::Followers => self.followers.is_some(),
            Side::Following => self.following.is_some(),
        }
    }

    /// True once both sides have been loaded.
    pub fn is_ready(&self) -> bool {
        self.followers.is_some() && self.following.is_some()
    }

    /// Compute `following - followers` and sort it by the current direction.
    ///
    /// O(|following|) membership checks against the follower set.
    pub fn recompute(&mut self) -> Result<&[Username], ReconcileError> {
        let followers = self
            .followers
            .as_ref()
            .ok_or(ReconcileError::SideNotLoaded {
                side: Side::Followers.label(),
            })?;
        let following = self
            .following
            .as_ref()
            .ok_or(ReconcileError::SideNotLoaded {
                side: Side::Following.label(),
            })?;

        let mut list: Vec<Username> = following
            .iter()
            .filter(|username| !followers.contains(*username))
            .cloned()
            .collect();
        sort_usernames(&mut list, self.sort);

        tracing::info!(
            followers = followers.len(),
            following = following.len(),
            non_followers = list.len(),
            "Non-follower list recomputed"
        );

        Ok(self.non_followers.insert(list).as_slice())
    }

    /// The computed list, if it is current.
    pub fn non_followers(&self) -> Option<&[Username]> {
        self.non_followers.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort
    }

    /// Change the sort direction and re-sort the computed list in place.
    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        if self.sort == direction {
            return;
        }
        self.sort = direction;
        if let Some(list) = self.non_followers.as_mut() {
            sort_usernames(list, direction);
            tracing::debug!(ascending = direction.is_ascending(), "Re-sorted non-followers");
        }
    }

    /// Entries of the computed list containing `substring`, in list order.
    /// Empty when the list has not been computed.
    pub fn filter(&self, substring: &str) -> Vec<&Username> {
        match self.non_followers.as_deref() {
            Some(list) => filter::filter_usernames(list, substring),
            None => Vec::new(),
        }
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            follower_count: self.followers.as_ref().map_or(0, |s| s.len()),
            following_count: self.following.as_ref().map_or(0, |s| s.len()),
            non_follower_count: self.non_followers.as_ref().map_or(0, |l| l.len()),
        }
    }

    /// Drop both sides and the computed list. The sort direction is kept.
    pub fn reset(&mut self) {
        self.followers = None;
        self.following = None;
        self.non_followers = None;
    }
}

/// Lexicographic sort on the lowercased form. Stored names are already
/// lowercase and unique, so no tie-break is needed.
fn sort_usernames(list: &mut [Username], direction: SortDirection) {
    match direction {
        SortDirection::Ascending => list.sort_unstable(),
        SortDirection::Descending => list.sort_unstable_by(|a, b| b.cmp(a)),
    }
}
