// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Angers open-data API client.
//!
//! Handles:
//! - Draining the offset-paginated `records` endpoint of a dataset
//! - Fetching the three datasets the app uses concurrently
//!
//! There is no cache: every call re-reads every page.

use crate::error::AppError;
use crate::models::{BikeParking, CarParking, DatasetPage, SportFacility};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

/// Records requested per page.
pub const PAGE_SIZE: u64 = 100;

/// Dataset identifiers in the Angers catalog.
pub mod datasets {
    pub const SPORT_FACILITIES: &str = "angers_stadium";
    pub const BIKE_PARKINGS: &str = "parking-velo-angers";
    pub const CAR_PARKINGS: &str = "angers_stationnement";
}

/// Read every page of a dataset.
///
/// `fetch_page(offset, limit)` is called with offsets 0, `PAGE_SIZE`,
/// `2 * PAGE_SIZE`, ... until the accumulated results reach the reported
/// `total_count` or a page comes back empty. The returned `total_count`
/// is the one reported by the last page.
pub async fn drain_pages<T, F, Fut>(mut fetch_page: F) -> Result<DatasetPage<T>, AppError>
where
    F: FnMut(u64, u64) -> Fut,
    Fut: Future<Output = Result<DatasetPage<T>, AppError>>,
{
    let mut results = Vec::new();
    let mut offset = 0;
    let mut total_count;

    loop {
        let page = fetch_page(offset, PAGE_SIZE).await?;
        total_count = page.total_count;

        let received = page.results.len();
        results.extend(page.results);

        if results.len() as u64 >= total_count || received == 0 {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(DatasetPage {
        results,
        total_count,
    })
}

/// The three datasets the map and linking screens need.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CityCatalog {
    pub facilities: Vec<SportFacility>,
    pub bike_parkings: Vec<BikeParking>,
    pub car_parkings: Vec<CarParking>,
}

/// Open-data API client.
#[derive(Clone)]
pub struct OpenDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenDataClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one page of a dataset.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        dataset: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DatasetPage<T>, AppError> {
        let url = format!("{}/{}/records", self.base_url, dataset);

        let response = self
            .http
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
            .map_err(|e| AppError::OpenData(format!("Failed to fetch {}: {}", dataset, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::OpenData(format!(
                "Failed to fetch {}: HTTP {}: {}",
                dataset, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OpenData(format!("JSON parse error for {}: {}", dataset, e)))
    }

    /// Fetch every record of a dataset.
    pub async fn fetch_all<T: DeserializeOwned>(&self, dataset: &str) -> Result<Vec<T>, AppError> {
        let page = drain_pages(|offset, limit| self.fetch_page(dataset, offset, limit)).await?;

        tracing::debug!(
            dataset,
            count = page.results.len(),
            total = page.total_count,
            "Fetched dataset"
        );
        Ok(page.results)
    }

    pub async fn facilities(&self) -> Result<Vec<SportFacility>, AppError> {
        self.fetch_all(datasets::SPORT_FACILITIES).await
    }

    pub async fn bike_parkings(&self) -> Result<Vec<BikeParking>, AppError> {
        self.fetch_all(datasets::BIKE_PARKINGS).await
    }

    pub async fn car_parkings(&self) -> Result<Vec<CarParking>, AppError> {
        self.fetch_all(datasets::CAR_PARKINGS).await
    }

    /// Fetch the three datasets concurrently; fails if any one fails.
    pub async fn catalog(&self) -> Result<CityCatalog, AppError> {
        let (facilities, bike_parkings, car_parkings) = tokio::try_join!(
            self.facilities(),
            self.bike_parkings(),
            self.car_parkings(),
        )?;

        tracing::info!(
            facilities = facilities.len(),
            bike_parkings = bike_parkings.len(),
            car_parkings = car_parkings.len(),
            "Loaded open-data catalog"
        );

        Ok(CityCatalog {
            facilities,
            bike_parkings,
            car_parkings,
        })
    }
}
