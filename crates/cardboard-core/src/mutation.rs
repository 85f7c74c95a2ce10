//! Local state mutations with explicit inverses
//!
//! A [`Mutation`] changes a piece of local state and hands back the mutation
//! that undoes it. [`optimistic`] applies first and undoes on a failed remote
//! commit; [`confirmed`] applies only after the commit succeeds.

use crate::error::CoreResult;
use crate::models::CheckState;
use crate::state::DashboardState;
use parking_lot::RwLock;
use std::future::Future;

pub trait Mutation<S>: Send {
    type Inverse: Mutation<S>;

    /// Apply to `state`, returning the inverse, or `None` if nothing changed
    fn apply(&self, state: &mut S) -> Option<Self::Inverse>;
}

/// Apply now, commit remotely, undo if the commit fails
///
/// The lock is released while the commit is in flight.
pub async fn optimistic<S, M, F, Fut, T>(state: &RwLock<S>, mutation: &M, commit: F) -> CoreResult<T>
where
    M: Mutation<S>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let inverse = mutation.apply(&mut state.write());

    match commit().await {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Some(inverse) = inverse {
                inverse.apply(&mut state.write());
            }
            Err(e)
        }
    }
}

/// Commit remotely, apply only on success
pub async fn confirmed<S, M, F, Fut, T>(state: &RwLock<S>, mutation: &M, commit: F) -> CoreResult<T>
where
    M: Mutation<S>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let value = commit().await?;
    mutation.apply(&mut state.write());
    Ok(value)
}

/// Put a card in another list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCard {
    pub card_id: String,
    pub list_id: String,
    pub list_name: String,
}

impl Mutation<DashboardState> for MoveCard {
    type Inverse = MoveCard;

    fn apply(&self, state: &mut DashboardState) -> Option<MoveCard> {
        let card = state.card_mut(&self.card_id)?;
        let previous = MoveCard {
            card_id: self.card_id.clone(),
            list_id: std::mem::replace(&mut card.id_list, self.list_id.clone()),
            list_name: card
                .list_name
                .replace(self.list_name.clone())
                .unwrap_or_default(),
        };
        Some(previous)
    }
}

/// Set one check item's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCheckItemState {
    pub card_id: String,
    /// Restricts the search to one checklist when known
    pub checklist_id: Option<String>,
    pub check_item_id: String,
    pub state: CheckState,
}

impl Mutation<DashboardState> for SetCheckItemState {
    type Inverse = SetCheckItemState;

    fn apply(&self, state: &mut DashboardState) -> Option<SetCheckItemState> {
        let item = state.check_item_mut(
            &self.card_id,
            self.checklist_id.as_deref(),
            &self.check_item_id,
        )?;
        let previous = std::mem::replace(&mut item.state, self.state);
        Some(SetCheckItemState {
            state: previous,
            ..self.clone()
        })
    }
}
