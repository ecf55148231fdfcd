//! Lookups the dispatcher needs from the user/group service.

use std::collections::{HashMap, HashSet};

use qingliao_shared::{GroupId, User, UserId};

/// Read access to users, groups and the follow graph.
///
/// Implementations only answer questions; they never mutate messages.
pub trait Directory {
    fn user(&self, id: UserId) -> Option<User>;

    fn group_exists(&self, id: GroupId) -> bool;

    fn is_group_member(&self, group: GroupId, user: UserId) -> bool;

    /// Whether `follower` follows `followee`.
    fn is_following(&self, follower: UserId, followee: UserId) -> bool;

    /// `(follows, followers)` of `user`.
    fn follow_counts(&self, user: UserId) -> (u32, u32);
}

/// In-process directory, used by tests and single-node setups.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: HashMap<UserId, User>,
    groups: HashMap<GroupId, HashSet<UserId>>,
    // (follower, followee)
    follows: HashSet<(UserId, UserId)>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: User) -> UserId {
        let id = user.id;
        self.users.insert(id, user);
        id
    }

    pub fn create_group(&mut self, members: impl IntoIterator<Item = UserId>) -> GroupId {
        let id = GroupId::new();
        self.groups.insert(id, members.into_iter().collect());
        id
    }

    pub fn remove_member(&mut self, group: GroupId, user: UserId) -> bool {
        self.groups
            .get_mut(&group)
            .is_some_and(|members| members.remove(&user))
    }

    pub fn follow(&mut self, follower: UserId, followee: UserId) {
        self.follows.insert((follower, followee));
    }

    pub fn unfollow(&mut self, follower: UserId, followee: UserId) -> bool {
        self.follows.remove(&(follower, followee))
    }
}

impl Directory for MemoryDirectory {
    fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn group_exists(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    fn is_group_member(&self, group: GroupId, user: UserId) -> bool {
        self.groups
            .get(&group)
            .is_some_and(|members| members.contains(&user))
    }

    fn is_following(&self, follower: UserId, followee: UserId) -> bool {
        self.follows.contains(&(follower, followee))
    }

    fn follow_counts(&self, user: UserId) -> (u32, u32) {
        let (mut follows, mut followers) = (0u32, 0u32);
        for (from, to) in &self.follows {
            if *from == user {
                follows += 1;
            }
            if *to == user {
                followers += 1;
            }
        }
        (follows, followers)
    }
}
