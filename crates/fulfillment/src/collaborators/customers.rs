//! Customer directory contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::CustomerId;
use domain::Address;
use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;

/// A customer as seen by the fulfillment core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub default_address: Option<Address>,
}

/// Read-only customer lookup.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Loads a customer by id; `None` when unknown.
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, FulfillmentError>;
}

/// In-memory customer directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer.
    pub fn register(&self, customer: Customer) {
        self.customers
            .write()
            .unwrap()
            .insert(customer.id, customer);
    }

    /// Registers a customer with just a name and email, returning the id.
    pub fn register_new(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        default_address: Option<Address>,
    ) -> CustomerId {
        let customer = Customer {
            id: CustomerId::new(),
            name: name.into(),
            email: email.into(),
            default_address,
        };
        let id = customer.id;
        self.register(customer);
        id
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, FulfillmentError> {
        Ok(self.customers.read().unwrap().get(&id).cloned())
    }
}
