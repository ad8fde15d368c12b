use crate::domain::value_objects::{BarberId, CustomerId};
use crate::ports::user_directory::{Customer, Result, UserDirectory as UserDirectoryTrait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// インメモリのUserDirectory
pub struct UserDirectory {
    customers: Mutex<HashMap<CustomerId, Customer>>,
    calendar_identities: Mutex<HashMap<BarberId, String>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            customers: Mutex::new(HashMap::new()),
            calendar_identities: Mutex::new(HashMap::new()),
        }
    }

    /// 店舗のデモ顧客。カレンダー連携済みの理容師はまだいない。
    pub fn with_seed_data() -> Self {
        let directory = Self::new();
        directory.add_customer(Customer {
            id: CustomerId::new(3),
            name: "Pedro Usuario".to_string(),
            email: "usuario@barberia.com".to_string(),
        });
        directory
    }

    pub fn add_customer(&self, customer: Customer) {
        self.customers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(customer.id, customer);
    }

    pub fn link_calendar(&self, barber_id: BarberId, identity: impl Into<String>) {
        self.calendar_identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(barber_id, identity.into());
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectoryTrait for UserDirectory {
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&customer_id)
            .cloned())
    }

    async fn barber_calendar_identity(&self, barber_id: BarberId) -> Result<Option<String>> {
        Ok(self
            .calendar_identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&barber_id)
            .cloned())
    }
}
