//! In-memory persistence for users, sessions, franchises, menu and orders.
//!
//! Everything lives behind one `RwLock`; state is lost on restart.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Diner,
    Franchisee,
    Admin,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub roles: Vec<Role>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FranchiseAdmin {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Franchise {
    pub id: u64,
    pub name: String,
    pub admins: Vec<FranchiseAdmin>,
    pub stores: Vec<Store>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_id: u64,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub franchise_id: u64,
    pub store_id: u64,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
}

// ─── Internal state ──────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    users: HashMap<u64, User>,
    /// bearer token → user id
    sessions: HashMap<String, u64>,
    franchises: HashMap<u64, Franchise>,
    menu: Vec<MenuItem>,
    /// user id → orders placed by that user
    orders: HashMap<u64, Vec<Order>>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }
}

// ─── Database ────────────────────────────────────────────────────

#[derive(Default)]
pub struct Database {
    tables: RwLock<Tables>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users & sessions ────────────────────────────────────────

    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<User, DbError> {
        let mut t = self.tables.write();
        if t.user_by_email(email).is_some() {
            return Err(DbError::Conflict(format!("user '{email}' already exists")));
        }
        let user = User {
            id: t.next_id(),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            roles,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, DbError> {
        let t = self.tables.read();
        let user = t
            .user_by_email(email)
            .ok_or_else(|| DbError::NotFound("unknown user".into()))?;
        if user.password != password {
            return Err(DbError::InvalidCredentials);
        }
        Ok(user.clone())
    }

    pub fn open_session(&self, user_id: u64) -> String {
        let token = format!("tok_{}", uuid::Uuid::new_v4().simple());
        self.tables.write().sessions.insert(token.clone(), user_id);
        token
    }

    pub fn session_user(&self, token: &str) -> Option<User> {
        let t = self.tables.read();
        let id = t.sessions.get(token)?;
        t.users.get(id).cloned()
    }

    /// Returns false if the token was not an open session.
    pub fn close_session(&self, token: &str) -> bool {
        self.tables.write().sessions.remove(token).is_some()
    }

    // ── Franchises & stores ─────────────────────────────────────

    pub fn franchises(&self) -> Vec<Franchise> {
        let mut list: Vec<Franchise> = self.tables.read().franchises.values().cloned().collect();
        list.sort_by_key(|f| f.id);
        list
    }

    pub fn user_franchises(&self, user_id: u64) -> Vec<Franchise> {
        let mut list: Vec<Franchise> = self
            .tables
            .read()
            .franchises
            .values()
            .filter(|f| f.admins.iter().any(|a| a.id == user_id))
            .cloned()
            .collect();
        list.sort_by_key(|f| f.id);
        list
    }

    /// Every admin email must belong to an existing user, who becomes a
    /// franchisee.
    pub fn create_franchise(&self, name: &str, admin_emails: &[String]) -> Result<Franchise, DbError> {
        let mut t = self.tables.write();

        let mut admins = Vec::with_capacity(admin_emails.len());
        for email in admin_emails {
            let user = t
                .user_by_email(email)
                .ok_or_else(|| DbError::NotFound(format!("unknown user for franchise admin {email}")))?;
            admins.push(FranchiseAdmin {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            });
        }

        for admin in &admins {
            if let Some(user) = t.users.get_mut(&admin.id) {
                if !user.roles.contains(&Role::Franchisee) {
                    user.roles.push(Role::Franchisee);
                }
            }
        }

        let franchise = Franchise {
            id: t.next_id(),
            name: name.to_owned(),
            admins,
            stores: Vec::new(),
        };
        t.franchises.insert(franchise.id, franchise.clone());
        Ok(franchise)
    }

    pub fn delete_franchise(&self, franchise_id: u64) -> Result<(), DbError> {
        self.tables
            .write()
            .franchises
            .remove(&franchise_id)
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("franchise {franchise_id} not found")))
    }

    pub fn is_franchise_admin(&self, franchise_id: u64, user_id: u64) -> bool {
        self.tables
            .read()
            .franchises
            .get(&franchise_id)
            .is_some_and(|f| f.admins.iter().any(|a| a.id == user_id))
    }

    pub fn create_store(&self, franchise_id: u64, name: &str) -> Result<Store, DbError> {
        let mut t = self.tables.write();
        let id = t.next_id();
        let franchise = t
            .franchises
            .get_mut(&franchise_id)
            .ok_or_else(|| DbError::NotFound(format!("franchise {franchise_id} not found")))?;
        let store = Store {
            id,
            name: name.to_owned(),
        };
        franchise.stores.push(store.clone());
        Ok(store)
    }

    pub fn delete_store(&self, franchise_id: u64, store_id: u64) -> Result<(), DbError> {
        let mut t = self.tables.write();
        let franchise = t
            .franchises
            .get_mut(&franchise_id)
            .ok_or_else(|| DbError::NotFound(format!("franchise {franchise_id} not found")))?;
        let before = franchise.stores.len();
        franchise.stores.retain(|s| s.id != store_id);
        if franchise.stores.len() == before {
            return Err(DbError::NotFound(format!("store {store_id} not found")));
        }
        Ok(())
    }

    // ── Menu & orders ───────────────────────────────────────────

    pub fn menu(&self) -> Vec<MenuItem> {
        self.tables.read().menu.clone()
    }

    pub fn add_menu_item(&self, mut item: MenuItem) -> Vec<MenuItem> {
        let mut t = self.tables.write();
        item.id = t.next_id();
        t.menu.push(item);
        t.menu.clone()
    }

    pub fn orders_for(&self, user_id: u64) -> Vec<Order> {
        self.tables
            .read()
            .orders
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Fails if the store does not belong to the franchise.
    pub fn add_order(
        &self,
        user_id: u64,
        franchise_id: u64,
        store_id: u64,
        items: Vec<OrderItem>,
    ) -> Result<Order, DbError> {
        let mut t = self.tables.write();
        let store_exists = t
            .franchises
            .get(&franchise_id)
            .is_some_and(|f| f.stores.iter().any(|s| s.id == store_id));
        if !store_exists {
            return Err(DbError::NotFound(format!(
                "store {store_id} not found in franchise {franchise_id}"
            )));
        }

        let order = Order {
            id: t.next_id(),
            franchise_id,
            store_id,
            date: Utc::now(),
            items,
        };
        t.orders.entry(user_id).or_default().push(order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_conflicts() {
        let db = Database::new();
        db.add_user("a", "a@x.com", "pw", vec![Role::Diner]).unwrap();
        assert!(matches!(
            db.add_user("b", "a@x.com", "pw", vec![Role::Diner]),
            Err(DbError::Conflict(_))
        ));
    }

    #[test]
    fn authenticate_checks_password() {
        let db = Database::new();
        db.add_user("a", "a@x.com", "pw", vec![Role::Diner]).unwrap();
        assert!(db.authenticate("a@x.com", "pw").is_ok());
        assert_eq!(db.authenticate("a@x.com", "nope").unwrap_err(), DbError::InvalidCredentials);
        assert!(matches!(db.authenticate("b@x.com", "pw"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn sessions_open_and_close() {
        let db = Database::new();
        let user = db.add_user("a", "a@x.com", "pw", vec![Role::Diner]).unwrap();
        let token = db.open_session(user.id);
        assert_eq!(db.session_user(&token).unwrap().id, user.id);
        assert!(db.close_session(&token));
        assert!(db.session_user(&token).is_none());
        assert!(!db.close_session(&token));
    }

    #[test]
    fn franchise_admins_become_franchisees() {
        let db = Database::new();
        let user = db.add_user("f", "f@x.com", "pw", vec![Role::Diner]).unwrap();
        let franchise = db.create_franchise("pizzaPocket", &["f@x.com".to_string()]).unwrap();

        assert!(db.is_franchise_admin(franchise.id, user.id));
        assert_eq!(db.user_franchises(user.id).len(), 1);
        let token = db.open_session(user.id);
        assert!(db.session_user(&token).unwrap().roles.contains(&Role::Franchisee));
    }

    #[test]
    fn orders_require_existing_store() {
        let db = Database::new();
        let franchise = db.create_franchise("p", &[]).unwrap();
        let store = db.create_store(franchise.id, "SLC").unwrap();
        let item = OrderItem {
            menu_id: 1,
            description: "Veggie".into(),
            price: 0.05,
        };

        let order = db.add_order(7, franchise.id, store.id, vec![item.clone()]).unwrap();
        assert_eq!(order.total(), 0.05);
        assert_eq!(db.orders_for(7).len(), 1);

        assert!(db.add_order(7, franchise.id, 9_999, vec![item]).is_err());

        db.delete_store(franchise.id, store.id).unwrap();
        assert!(db.delete_store(franchise.id, store.id).is_err());
    }
}
