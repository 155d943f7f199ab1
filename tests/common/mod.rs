//! Shared in-memory stand-in for the database collaborator.
//!
//! Implements the `SqlConnection`/`ConnectionFactory` seam over a single
//! `users` table and answers exactly the statements the test views declare.
//! Atomic knobs let tests break pings, idleness, statements, or connection
//! creation on demand, and counters expose what the pool did.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use viewgate::db::{ConnectError, ConnectionFactory, ResultSet, SqlConnection, SqlError};

pub const SELECT_USER: &str = "SELECT name, age FROM users WHERE id = $1";
pub const SELECT_ALL_USERS: &str = "SELECT name, age FROM users ORDER BY id";
pub const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

/// Shared state behind every fake connection.
#[derive(Default)]
pub struct FakeDb {
    /// Rows of the `users` table: (id, name, age). `None` models SQL NULL.
    pub users: Mutex<Vec<(i64, Option<String>, Option<i64>)>>,
    /// Parameters bound on the most recent statement.
    pub last_params: Mutex<Vec<String>>,
    /// Connections handed out so far.
    pub connects: AtomicUsize,
    /// Connections destroyed so far.
    pub drops: AtomicUsize,
    /// When set, every liveness probe fails.
    pub fail_ping: AtomicBool,
    /// When set, connections claim to be inside an open transaction.
    pub not_idle: AtomicBool,
    /// When set, every statement errors.
    pub fail_statements: AtomicBool,
}

impl FakeDb {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeDb::default())
    }

    pub fn insert_user(&self, id: i64, name: &str, age: i64) {
        self.users
            .lock()
            .unwrap()
            .push((id, Some(name.to_string()), Some(age)));
    }

    pub fn insert_user_nulls(&self, id: i64) {
        self.users.lock().unwrap().push((id, None, None));
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Vec<String> {
        self.last_params.lock().unwrap().clone()
    }
}

/// What `connect` should do.
pub enum ConnectBehavior {
    Ok,
    Unavailable,
    Misconfigured,
}

pub struct FakeFactory {
    db: Arc<FakeDb>,
    behavior: ConnectBehavior,
}

impl FakeFactory {
    pub fn new(db: Arc<FakeDb>) -> Self {
        FakeFactory {
            db,
            behavior: ConnectBehavior::Ok,
        }
    }

    pub fn failing(db: Arc<FakeDb>, behavior: ConnectBehavior) -> Self {
        FakeFactory { db, behavior }
    }
}

impl ConnectionFactory for FakeFactory {
    fn connect(&self) -> Result<Box<dyn SqlConnection>, ConnectError> {
        match self.behavior {
            ConnectBehavior::Ok => {}
            ConnectBehavior::Unavailable => {
                return Err(ConnectError::Unavailable("connection refused".to_string()));
            }
            ConnectBehavior::Misconfigured => {
                return Err(ConnectError::Configuration("bad credentials".to_string()));
            }
        }
        self.db.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConn {
            db: self.db.clone(),
        }))
    }
}

pub struct FakeConn {
    db: Arc<FakeDb>,
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.db.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl SqlConnection for FakeConn {
    fn ping(&mut self) -> bool {
        !self.db.fail_ping.load(Ordering::SeqCst)
    }

    fn is_idle(&self) -> bool {
        !self.db.not_idle.load(Ordering::SeqCst)
    }

    fn query(&mut self, sql: &str, params: &[&str]) -> Result<ResultSet, SqlError> {
        *self.db.last_params.lock().unwrap() = params.iter().map(|p| p.to_string()).collect();

        if self.db.fail_statements.load(Ordering::SeqCst) {
            return Err(SqlError("relation \"users\" does not exist".to_string()));
        }

        match sql {
            SELECT_USER => {
                let id: i64 = params
                    .first()
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| SqlError("invalid input syntax for integer".to_string()))?;
                let mut result = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
                for (uid, name, age) in self.db.users.lock().unwrap().iter() {
                    if *uid == id {
                        result.push_row(vec![name.clone(), age.map(|a| a.to_string())]);
                    }
                }
                Ok(result)
            }
            SELECT_ALL_USERS => {
                let mut result = ResultSet::new(vec!["name".to_string(), "age".to_string()]);
                let mut users = self.db.users.lock().unwrap().clone();
                users.sort_by_key(|(id, _, _)| *id);
                for (_, name, age) in users {
                    result.push_row(vec![name, age.map(|a| a.to_string())]);
                }
                Ok(result)
            }
            other => Err(SqlError(format!("unknown statement: {other}"))),
        }
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, SqlError> {
        *self.db.last_params.lock().unwrap() = params.iter().map(|p| p.to_string()).collect();

        if self.db.fail_statements.load(Ordering::SeqCst) {
            return Err(SqlError("relation \"users\" does not exist".to_string()));
        }

        match sql {
            DELETE_USER => {
                let id: i64 = params
                    .first()
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| SqlError("invalid input syntax for integer".to_string()))?;
                let mut users = self.db.users.lock().unwrap();
                let before = users.len();
                users.retain(|(uid, _, _)| *uid != id);
                Ok((before - users.len()) as u64)
            }
            other => Err(SqlError(format!("unknown statement: {other}"))),
        }
    }
}
