//! Process-local repositories used for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envira_core::{ChatRecord, SensorReading, User};
use tokio::sync::RwLock;

use super::{ChatRepository, RepositoryError, SensorRepository, UserRepository};

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, name: &str, email: &str) -> Result<User, RepositoryError> {
        let user = User::new(name, email);
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn first(&self) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .min_by_key(|user| user.created_at)
            .cloned())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySensorRepository {
    readings: Arc<RwLock<Vec<SensorReading>>>,
}

#[async_trait]
impl SensorRepository for InMemorySensorRepository {
    async fn insert(&self, reading: SensorReading) -> Result<SensorReading, RepositoryError> {
        self.readings.write().await.push(reading.clone());
        Ok(reading)
    }

    async fn latest(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SensorReading>, RepositoryError> {
        let mut readings = self
            .readings
            .read()
            .await
            .iter()
            .filter(|reading| reading.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        readings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        readings.truncate(limit);
        Ok(readings)
    }

    async fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, RepositoryError> {
        let mut readings = self
            .readings
            .read()
            .await
            .iter()
            .filter(|reading| reading.user_id == user_id && reading.created_at >= since)
            .cloned()
            .collect::<Vec<_>>();
        readings.sort_by_key(|reading| reading.created_at);
        Ok(readings)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        Ok(self
            .readings
            .read()
            .await
            .iter()
            .filter(|reading| reading.user_id == user_id)
            .count())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.readings.read().await.len())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryChatRepository {
    records: Arc<RwLock<Vec<ChatRecord>>>,
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn insert(&self, record: ChatRecord) -> Result<ChatRecord, RepositoryError> {
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatRecord>, RepositoryError> {
        let mut records = self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.created_at);
        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}
