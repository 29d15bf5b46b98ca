//! Ordered membership of a container
//!
//! The head of the list is the unit whose turn it is; everyone behind it is
//! waiting. Order only changes by appending, removing, or rotating the head
//! to the back.

use std::collections::VecDeque;

use crate::unit::{ActorId, Member};

/// Result of removing a member from the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed<T> {
    pub member: T,
    /// Whether the removed member was the head
    pub was_head: bool,
}

/// FIFO of members with explicit rotation
#[derive(Debug, Clone)]
pub struct MembershipList<T> {
    members: VecDeque<T>,
}

impl<T: Member> MembershipList<T> {
    pub fn new() -> Self {
        Self {
            members: VecDeque::new(),
        }
    }

    /// Add a member at the tail
    pub fn append(&mut self, member: T) {
        self.members.push_back(member);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.members.pop_front()
    }

    /// Move the head to the tail. No-op with fewer than two members.
    pub fn rotate_to_back(&mut self) {
        if self.members.len() > 1 {
            self.members.rotate_left(1);
        }
    }

    /// Remove the first member with the given identity
    pub fn remove(&mut self, actor: ActorId) -> Option<Removed<T>> {
        let index = self.position(actor)?;
        self.members.remove(index).map(|member| Removed {
            member,
            was_head: index == 0,
        })
    }

    pub fn head(&self) -> Option<&T> {
        self.members.front()
    }

    pub fn is_head(&self, actor: ActorId) -> bool {
        self.head().is_some_and(|m| m.actor_id() == actor)
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.position(actor).is_some()
    }

    pub fn position(&self, actor: ActorId) -> Option<usize> {
        self.members.iter().position(|m| m.actor_id() == actor)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.iter()
    }

    /// Member identities in list order
    pub fn ids(&self) -> Vec<ActorId> {
        self.members.iter().map(Member::actor_id).collect()
    }
}

impl<T: Member> Default for MembershipList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(ids: &[u64]) -> MembershipList<ActorId> {
        let mut list = MembershipList::new();
        for id in ids {
            list.append(ActorId::new(*id));
        }
        list
    }

    fn raw(list: &MembershipList<ActorId>) -> Vec<u64> {
        list.ids().into_iter().map(ActorId::get).collect()
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let list = list(&[1, 2, 3]);
        assert_eq!(raw(&list), vec![1, 2, 3]);
        assert_eq!(list.head(), Some(&ActorId::new(1)));
    }

    #[test]
    fn test_rotate_moves_head_to_tail() {
        let mut list = list(&[1, 2, 3]);
        list.rotate_to_back();
        assert_eq!(raw(&list), vec![2, 3, 1]);
    }

    #[test]
    fn test_rotate_small_lists_is_noop() {
        let mut empty = list(&[]);
        empty.rotate_to_back();
        assert!(empty.is_empty());

        let mut single = list(&[4]);
        single.rotate_to_back();
        assert_eq!(raw(&single), vec![4]);
    }

    #[test]
    fn test_remove_reports_head() {
        let mut list = list(&[1, 2, 3]);
        let removed = list.remove(ActorId::new(1)).unwrap();
        assert!(removed.was_head);
        assert_eq!(list.head(), Some(&ActorId::new(2)));

        let removed = list.remove(ActorId::new(3)).unwrap();
        assert!(!removed.was_head);
        assert_eq!(raw(&list), vec![2]);
    }

    #[test]
    fn test_remove_missing() {
        let mut list = list(&[1]);
        assert!(list.remove(ActorId::new(9)).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_pop_front() {
        let mut list = list(&[5, 6]);
        assert_eq!(list.pop_front(), Some(ActorId::new(5)));
        assert!(list.is_head(ActorId::new(6)));
    }

    proptest! {
        #[test]
        fn rotating_len_times_restores_order(n in 0u64..16) {
            let ids: Vec<u64> = (0..n).collect();
            let mut list = list(&ids);
            for _ in 0..n {
                list.rotate_to_back();
            }
            prop_assert_eq!(raw(&list), ids);
        }

        #[test]
        fn heads_cycle_in_insertion_order(n in 1u64..12, turns in 0usize..40) {
            let ids: Vec<u64> = (0..n).collect();
            let mut list = list(&ids);
            for turn in 0..turns {
                prop_assert_eq!(list.head().map(|a| a.get()), Some(ids[turn % ids.len()]));
                list.rotate_to_back();
            }
        }

        #[test]
        fn remove_keeps_relative_order(n in 1u64..12, pick in 0u64..12) {
            let ids: Vec<u64> = (0..n).collect();
            let mut list = list(&ids);
            let target = pick % n;
            let removed = list.remove(ActorId::new(target)).unwrap();
            prop_assert_eq!(removed.was_head, target == 0);
            let expected: Vec<u64> = ids.into_iter().filter(|id| *id != target).collect();
            prop_assert_eq!(raw(&list), expected);
        }
    }
}
