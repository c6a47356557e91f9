// SPDX-License-Identifier: BUSL-1.1
//! In-memory storage backend using DashMap.
//!
//! Users, login sessions and items each get their own map. Item and user
//! identifiers come from monotonically increasing counters.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Item lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    OnSale,
    Trading,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub account_name: String,
    pub password: String,
}

/// A login session, keyed by its cookie value.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user_id: i64,
    pub csrf_token: String,
}

impl LoginSession {
    /// Constant-time comparison against a presented token.
    pub fn csrf_matches(&self, presented: &str) -> bool {
        !self.csrf_token.is_empty()
            && bool::from(self.csrf_token.as_bytes().ct_eq(presented.as_bytes()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: i64,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub status: ItemStatus,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Inner storage holding all DashMaps.
struct Inner {
    users: DashMap<i64, User>,
    accounts: DashMap<String, i64>,
    sessions: DashMap<String, LoginSession>,
    items: DashMap<i64, Item>,
    next_user_id: AtomicI64,
    next_item_id: AtomicI64,
}

/// Shared application state holding all in-memory stores.
///
/// Cheaply cloneable via `Arc` — all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: DashMap::new(),
                accounts: DashMap::new(),
                sessions: DashMap::new(),
                items: DashMap::new(),
                next_user_id: AtomicI64::new(1),
                next_item_id: AtomicI64::new(1),
            }),
        }
    }

    /// Register an account, returning its user id. Re-registering a name
    /// returns the existing id and keeps the original password.
    pub fn register_user(&self, account_name: &str, password: &str) -> i64 {
        *self
            .inner
            .accounts
            .entry(account_name.to_string())
            .or_insert_with(|| {
                let id = self.inner.next_user_id.fetch_add(1, Ordering::SeqCst);
                self.inner.users.insert(
                    id,
                    User {
                        id,
                        account_name: account_name.to_string(),
                        password: password.to_string(),
                    },
                );
                id
            })
    }

    pub fn user_by_account(&self, account_name: &str) -> Option<User> {
        let id = *self.inner.accounts.get(account_name)?;
        self.user(id)
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.inner.users.get(&id).map(|u| u.value().clone())
    }

    /// Open a login session for `user_id`; returns the cookie value.
    pub fn open_session(&self, user_id: i64) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        let csrf_token = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        self.inner.sessions.insert(
            session_id.clone(),
            LoginSession {
                user_id,
                csrf_token,
            },
        );
        session_id
    }

    pub fn session(&self, session_id: &str) -> Option<LoginSession> {
        self.inner.sessions.get(session_id).map(|s| s.value().clone())
    }

    /// List a new item on sale.
    pub fn insert_item(
        &self,
        seller_id: i64,
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Item {
        let id = self.inner.next_item_id.fetch_add(1, Ordering::SeqCst);
        let item = Item {
            id,
            seller_id,
            buyer_id: 0,
            status: ItemStatus::OnSale,
            name: name.to_string(),
            price,
            description: description.to_string(),
            category_id,
            created_at: Utc::now(),
        };
        self.inner.items.insert(id, item.clone());
        item
    }

    pub fn item(&self, id: i64) -> Option<Item> {
        self.inner.items.get(&id).map(|i| i.value().clone())
    }

    pub fn items(&self) -> &DashMap<i64, Item> {
        &self.inner.items
    }

    pub fn item_count(&self) -> usize {
        self.inner.items.len()
    }
}
