// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::ids::ExpenseId;
use crate::model::{ExpenseRecord, ExpenseUpdate, NewExpense};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GatewayOp {
    ListAll,
    Create,
    Update,
    Remove,
}

impl GatewayOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListAll => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of a store call: transport, permissions, or a missing record on
/// update.
#[derive(Debug, Error)]
#[error("store unavailable: {operation} failed")]
pub struct StoreUnavailable {
    operation: GatewayOp,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl StoreUnavailable {
    pub fn new(operation: GatewayOp, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    pub fn operation(&self) -> GatewayOp {
        self.operation
    }

    /// The full cause chain on one line, for status bars and logs.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut cause: Option<&(dyn StdError + 'static)> = Some(self.source.as_ref());
        while let Some(error) = cause {
            out.push_str(": ");
            out.push_str(&error.to_string());
            cause = error.source();
        }
        out
    }
}

/// Wraps a fallible store call so its error becomes [`StoreUnavailable`].
pub trait StoreResultExt<T> {
    fn during(self, operation: GatewayOp) -> Result<T, StoreUnavailable>;
}

impl<T> StoreResultExt<T> for anyhow::Result<T> {
    fn during(self, operation: GatewayOp) -> Result<T, StoreUnavailable> {
        self.map_err(|error| StoreUnavailable::new(operation, error))
    }
}

/// The four calls the controller needs from the authoritative store.
///
/// Each call is one round trip with no internal retry.
pub trait Gateway {
    fn list_all(&mut self) -> Result<Vec<ExpenseRecord>, StoreUnavailable>;
    fn create(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable>;
    /// Fails when `id` does not exist.
    fn update(&mut self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<(), StoreUnavailable>;
    /// Removing an id that does not exist succeeds unless the store reports
    /// an error.
    fn remove(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable>;
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn list_all(&mut self) -> Result<Vec<ExpenseRecord>, StoreUnavailable> {
        (**self).list_all()
    }

    fn create(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable> {
        (**self).create(expense)
    }

    fn update(&mut self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<(), StoreUnavailable> {
        (**self).update(id, update)
    }

    fn remove(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        (**self).remove(id)
    }
}
