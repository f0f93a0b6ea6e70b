// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Open-data client tests against a local fake of the `records` API.

use serde_json::{json, Value};
use sport_spots::error::AppError;
use sport_spots::models::SportFacility;
use sport_spots::services::open_data::datasets;
use sport_spots::services::OpenDataClient;
use std::collections::HashMap;

mod common;

fn facilities(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "nom": format!("Salle {i}"),
                "type": "GYMNASE",
                "adresse": "Angers",
                "geo_point_2d": { "lat": 47.47, "lon": -0.55 }
            })
        })
        .collect()
}

#[tokio::test]
async fn test_drains_every_page() {
    let (base_url, log) = common::spawn_fake_open_data(
        HashMap::from([(datasets::SPORT_FACILITIES.to_string(), facilities(250))]),
        vec![],
    )
    .await;
    let client = OpenDataClient::new(&base_url);

    let results: Vec<SportFacility> = client.facilities().await.unwrap();

    assert_eq!(results.len(), 250);
    assert_eq!(results[249].name, "Salle 249");

    let requests = log.lock().unwrap().clone();
    let offsets: Vec<u64> = requests.iter().map(|(_, offset, _)| *offset).collect();
    assert_eq!(offsets, vec![0, 100, 200]);
    assert!(requests.iter().all(|(_, _, limit)| *limit == 100));
}

#[tokio::test]
async fn test_exact_multiple_of_page_size() {
    let (base_url, log) = common::spawn_fake_open_data(
        HashMap::from([(datasets::SPORT_FACILITIES.to_string(), facilities(200))]),
        vec![],
    )
    .await;

    let results = OpenDataClient::new(&base_url).facilities().await.unwrap();
    assert_eq!(results.len(), 200);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_dataset_takes_one_request() {
    let (base_url, log) = common::spawn_fake_open_data(HashMap::new(), vec![]).await;

    let results = OpenDataClient::new(&base_url).bike_parkings().await.unwrap();
    assert!(results.is_empty());
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_catalog_fetches_three_datasets() {
    let (base_url, log) = common::spawn_fake_open_data(
        HashMap::from([
            (datasets::SPORT_FACILITIES.to_string(), facilities(3)),
            (
                datasets::BIKE_PARKINGS.to_string(),
                vec![json!({ "id_box": "B1", "nom_parkng": "Abri Gare", "capacite": "12" })],
            ),
            (
                datasets::CAR_PARKINGS.to_string(),
                vec![json!({ "id": "P1", "nom": "Parking Mail", "gratuit": "FAUX",
                             "ylat": "47.4700", "xlong": -0.5500 })],
            ),
        ]),
        vec![],
    )
    .await;

    let catalog = OpenDataClient::new(&base_url).catalog().await.unwrap();

    assert_eq!(catalog.facilities.len(), 3);
    assert_eq!(catalog.bike_parkings[0].name, "Abri Gare");
    assert!(catalog.car_parkings[0].coordinates().is_some());

    let mut seen: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .map(|(dataset, _, _)| dataset.clone())
        .collect();
    seen.sort();

    let mut expected = vec![
        datasets::SPORT_FACILITIES.to_string(),
        datasets::BIKE_PARKINGS.to_string(),
        datasets::CAR_PARKINGS.to_string(),
    ];
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_catalog_fails_when_one_dataset_fails() {
    let (base_url, _log) = common::spawn_fake_open_data(
        HashMap::from([(datasets::SPORT_FACILITIES.to_string(), facilities(3))]),
        vec![datasets::CAR_PARKINGS.to_string()],
    )
    .await;

    let err = OpenDataClient::new(&base_url).catalog().await.unwrap_err();
    assert!(matches!(err, AppError::OpenData(msg) if msg.contains(datasets::CAR_PARKINGS)));
}

#[tokio::test]
async fn test_unreachable_api_is_open_data_error() {
    let err = OpenDataClient::new("http://127.0.0.1:9")
        .facilities()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OpenData(_)));
}
