use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contract::model::{NewUser, User};
use crate::domain::repo::UsersRepository;

/// Fixed records loaded into a fresh store, in insertion order.
pub const SEED_USERS: [(&str, &str); 3] = [
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
    ("Bob Johnson", "bob@example.com"),
];

/// Process-lifetime user store.
///
/// Every mutation goes through the write lock, which makes
/// "read length, assign `len + 1`, push" a single critical section.
/// Ids stay unique only because nothing is ever removed.
#[derive(Debug, Default)]
pub struct InMemoryUsersRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUsersRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the three seed users with ids 1, 2, 3.
    pub fn seeded() -> Self {
        let repo = Self::new();
        for (name, email) in SEED_USERS {
            repo.push(NewUser {
                name: name.to_string(),
                email: email.to_string(),
            });
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn push(&self, new_user: NewUser) -> User {
        let mut users = self.users.write();
        // Vec length always fits in i64 on supported targets.
        let id = users.len() as i64 + 1;
        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
        };
        users.push(user.clone());
        user
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().clone())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn append(&self, new_user: NewUser) -> anyhow::Result<User> {
        Ok(self.push(new_user))
    }
}
