//! services/dashboard/src/adapters/herd.rs
//!
//! The `HerdDirectory` port over the remote cow and user-cow endpoints.

use super::remote::{Envelope, Numeric, RemoteClient};
use async_trait::async_trait;
use dairy_track_core::domain::{Cow, CowId, Farmer, UserId};
use dairy_track_core::ports::{HerdDirectory, PortResult};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct CowRow {
    id: CowId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    gender: Option<String>,
}

impl From<CowRow> for Cow {
    fn from(row: CowRow) -> Self {
        Cow {
            id: row.id,
            name: row.name,
            gender: row.gender,
        }
    }
}

/// Farmer rows carry `user_id` or `id`, and `name` or `username`.
#[derive(Debug, Deserialize)]
struct FarmerRow {
    #[serde(default)]
    user_id: Option<Numeric>,
    #[serde(default)]
    id: Option<Numeric>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl FarmerRow {
    fn to_domain(self) -> Option<Farmer> {
        let id = self
            .user_id
            .as_ref()
            .and_then(Numeric::as_i64)
            .or_else(|| self.id.as_ref().and_then(Numeric::as_i64))?;
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or(self.username)
            .unwrap_or_else(|| format!("Milker #{}", id));
        Some(Farmer { id, name })
    }
}

#[derive(Debug, Deserialize)]
struct CowListResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    cows: Vec<CowRow>,
}

#[derive(Debug, Deserialize)]
struct ManagersResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    managers: Vec<FarmerRow>,
}

#[derive(Debug, Deserialize)]
struct FarmersResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    farmers: Vec<FarmerRow>,
}

#[derive(Clone)]
pub struct HttpHerdAdapter {
    remote: Arc<RemoteClient>,
}

impl HttpHerdAdapter {
    pub fn new(remote: Arc<RemoteClient>) -> Self {
        Self { remote }
    }

    async fn cows_at(&self, path: &str, fallback: &str) -> PortResult<Vec<Cow>> {
        let response: CowListResponse = self.remote.get(path, fallback).await?;
        response.envelope.into_result(fallback)?;
        Ok(response.cows.into_iter().map(Cow::from).collect())
    }
}

#[async_trait]
impl HerdDirectory for HttpHerdAdapter {
    async fn list_cows(&self) -> PortResult<Vec<Cow>> {
        self.cows_at("cow/list", "Failed to fetch cows").await
    }

    async fn list_cows_by_user(&self, user_id: UserId) -> PortResult<Vec<Cow>> {
        let path = format!("user-cow/list/{}", user_id);
        self.cows_at(&path, "Failed to fetch managed cows").await
    }

    async fn get_cow_managers(&self, cow_id: CowId) -> PortResult<Vec<Farmer>> {
        const FAILED: &str = "Failed to fetch farmers for cow";
        let path = format!("user-cow/farmers/{}", cow_id);
        let response: ManagersResponse = self.remote.get(&path, FAILED).await?;
        response.envelope.into_result(FAILED)?;
        Ok(response.managers.into_iter().filter_map(FarmerRow::to_domain).collect())
    }

    async fn get_all_farmers(&self) -> PortResult<Vec<Farmer>> {
        const FAILED: &str = "Failed to fetch farmers";
        let response: FarmersResponse = self.remote.get("user-cow/farmers", FAILED).await?;
        response.envelope.into_result(FAILED)?;
        Ok(response.farmers.into_iter().filter_map(FarmerRow::to_domain).collect())
    }
}
