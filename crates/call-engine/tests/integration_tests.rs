//! Integration tests for the call-engine
//!
//! These tests run the campaign pipeline end to end over the in-memory and
//! SQLite interaction sources, including data-source failures and timeouts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dimensioner_call_engine::prelude::*;
use dimensioner_call_engine::database::DatabaseConfig;
use serial_test::serial;
use sqlx::sqlite::SqlitePoolOptions;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

/// Two weeks of traffic peaking at 11h with longer calls at the peak
fn campaign_records() -> Vec<InteractionRecord> {
    let mut records = Vec::new();
    for d in 1..=14 {
        let date = day(d);
        for (hour, calls, talk) in [(9, 30, 180.0), (10, 45, 200.0), (11, 60, 260.0), (12, 40, 190.0), (13, 25, 170.0)] {
            for i in 0..calls {
                let minute = (i * 60 / calls) as u32;
                let wait = if i % 7 == 0 { 45.0 } else { 4.0 + (i % 5) as f64 * 3.0 };
                records.push(InteractionRecord::new(
                    date,
                    format!("agent-{:02}", i % 12),
                    date.and_hms_opt(hour, minute, 0).unwrap(),
                    Some(talk + (i % 3) as f64 * 10.0),
                    Some(wait),
                ));
            }
        }
    }
    records
}

struct FailingSource;

#[async_trait]
impl InteractionSource for FailingSource {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> std::result::Result<Vec<InteractionRecord>, DatabaseError> {
        Err(DatabaseError::Connection("server unreachable".to_string()))
    }

    async fn available_range(&self) -> std::result::Result<Option<AvailableRange>, DatabaseError> {
        Err(DatabaseError::Connection("server unreachable".to_string()))
    }
}

struct SlowSource;

#[async_trait]
impl InteractionSource for SlowSource {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> std::result::Result<Vec<InteractionRecord>, DatabaseError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(campaign_records())
    }

    async fn available_range(&self) -> std::result::Result<Option<AvailableRange>, DatabaseError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_complete_campaign_analysis() {
    let analyzer = CampaignAnalyzer::new(MemoryInteractionSource::new(campaign_records()));
    let request = CampaignRequest::new(day(1), day(14));

    let analysis = analyzer
        .analyze_campaign_complete(&request)
        .await
        .expect("campaign analysis should succeed");

    println!("Summary: {:?}", analysis.summary);

    assert_eq!(analysis.historical.total_calls, 14 * 200);
    assert_eq!(analysis.historical.period.days, 14);
    assert_eq!(analysis.historical.volume.peak_hour, 11);
    assert_eq!(analysis.scenarios.scenarios.len(), 4);

    let peak = analysis.scenarios.get(ScenarioKind::Peak).unwrap();
    let average = analysis.scenarios.get(ScenarioKind::Average).unwrap();
    assert!(peak.inputs.average_handle_time_seconds > average.inputs.average_handle_time_seconds);
    assert!(peak.results.agents_required >= average.results.agents_required);

    let best = analysis.validation.best_scenario.expect("a finite scenario exists");
    assert_eq!(analysis.summary.base_scenario, best.kind);
    assert_eq!(
        analysis.summary.recommended_agents,
        analysis.scenarios.get(best.kind).unwrap().results.agents_with_shrinkage
    );
    assert_eq!(analysis.summary.calls_analyzed, 14 * 200);
    assert!(!analysis.recommendations.operational.is_empty());

    let json = serde_json::to_value(&analysis).expect("analysis serializes");
    assert!(json["scenarios"]["scenarios"]["peak"]["results"]["average_wait"]["state"].is_string());
}

#[tokio::test]
async fn test_range_outside_data_is_empty_dataset() {
    let analyzer = CampaignAnalyzer::new(MemoryInteractionSource::new(campaign_records()));
    let request = CampaignRequest::new(day(20), day(25));

    let err = analyzer.analyze_campaign_complete(&request).await.unwrap_err();
    assert!(matches!(err, CallCenterError::EmptyDataset(_)));
}

#[tokio::test]
async fn test_inverted_range_is_invalid_input() {
    let analyzer = CampaignAnalyzer::new(MemoryInteractionSource::new(campaign_records()));
    let request = CampaignRequest::new(day(10), day(2));

    let err = analyzer.analyze_campaign_complete(&request).await.unwrap_err();
    assert!(matches!(err, CallCenterError::InvalidInput(_)));
}

#[tokio::test]
async fn test_source_failure_is_data_source_error() {
    let analyzer = CampaignAnalyzer::new(FailingSource);
    let request = CampaignRequest::new(day(1), day(7));

    match analyzer.analyze_campaign_complete(&request).await {
        Err(CallCenterError::DataSource { start, end, source }) => {
            assert_eq!(start, day(1));
            assert_eq!(end, day(7));
            assert!(matches!(source, DatabaseError::Connection(_)));
        }
        other => panic!("expected DataSource error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_source_timeout_is_data_source_error() {
    let analyzer = CampaignAnalyzer::new(SlowSource).with_fetch_timeout(Duration::from_millis(100));
    let request = CampaignRequest::new(day(1), day(7));

    let err = analyzer.analyze_campaign_complete(&request).await.unwrap_err();
    assert!(matches!(
        err,
        CallCenterError::DataSource {
            source: DatabaseError::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_standalone_erlang_and_historical_entry_points() {
    let analyzer = CampaignAnalyzer::new(MemoryInteractionSource::default());

    let results = analyzer
        .calculate_erlang_c(&ErlangInputs::new(450.0, 240.0, 0.90, 20).with_shrinkage(15.0))
        .unwrap();
    assert!((results.traffic_intensity_erlangs - 30.0).abs() < 1e-9);
    assert!(results.agents_required >= 31);

    let historical = analyzer.analyze_historical(&campaign_records()).unwrap();
    assert_eq!(historical.total_calls, 14 * 200);
    assert!(matches!(
        analyzer.analyze_historical(&[]),
        Err(CallCenterError::EmptyDataset(_))
    ));
}

#[tokio::test]
async fn test_configured_analyzer_uses_actual_handle_time() {
    let mut config = DimensionerConfig::default();
    config.solver.search_handle_time = SearchHandleTime::Actual;
    let analyzer = CampaignAnalyzer::from_config(MemoryInteractionSource::new(campaign_records()), &config);

    let analysis = analyzer
        .analyze_records(&campaign_records(), &CampaignRequest::new(day(1), day(14)))
        .unwrap();
    for scenario in analysis.scenarios.iter() {
        assert!(scenario.results.meets_target());
        assert!(scenario.results.service_level >= config.targets.sla_target);
    }
}

async fn sqlite_source() -> SqliteInteractionSource {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::query(
        "CREATE TABLE interactions (
            fecha TEXT NOT NULL,
            usuarios TEXT NOT NULL,
            fecha_hora TEXT NOT NULL,
            tmo REAL,
            tme TEXT
        )",
    )
    .execute(&pool)
    .await
    .expect("create table");

    let rows = [
        ("2025-05-02", "a1", "2025-05-02 10:05:00", Some(200.0), Some("12")),
        ("2025-05-01", "a2", "2025-05-01 09:30:00", Some(180.0), Some("8.5")),
        ("2025-05-01", "a1", "2025-05-01 09:10:00", None, Some("n/a")),
        ("2025-05-03", "a3", "2025-05-03T11:00:00", Some(240.0), None),
        ("2025-06-10", "a1", "2025-06-10 09:00:00", Some(100.0), Some("5")),
    ];
    for (date, agent, start, talk, wait) in rows {
        sqlx::query("INSERT INTO interactions (fecha, usuarios, fecha_hora, tmo, tme) VALUES (?, ?, ?, ?, ?)")
            .bind(date)
            .bind(agent)
            .bind(start)
            .bind(talk)
            .bind(wait)
            .execute(&pool)
            .await
            .expect("insert row");
    }

    SqliteInteractionSource::with_pool(pool, DatabaseConfig::default()).expect("valid mapping")
}

#[tokio::test]
#[serial]
async fn test_sqlite_source_fetches_and_coerces() {
    let source = sqlite_source().await;

    let records = source.fetch(day(1), day(3)).await.expect("fetch");
    assert_eq!(records.len(), 4);

    // ordered by date then start time
    assert_eq!(records[0].agent_id, "a1");
    assert_eq!(records[0].date, day(1));
    assert_eq!(records[1].agent_id, "a2");
    assert_eq!(records[3].date, day(3));

    // missing and non-numeric values become None
    assert_eq!(records[0].talk_time_seconds, None);
    assert_eq!(records[0].wait_time_seconds, None);
    assert_eq!(records[1].wait_time_seconds, Some(8.5));
    assert_eq!(records[3].wait_time_seconds, None);
    assert_eq!(records[3].hour(), 11);
}

#[tokio::test]
#[serial]
async fn test_sqlite_source_includes_last_day_of_datetime_dates() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::query("CREATE TABLE interactions (fecha TEXT, usuarios TEXT, fecha_hora TEXT, tmo REAL, tme REAL)")
        .execute(&pool)
        .await
        .expect("create table");
    for (date, start) in [
        ("2025-05-01 00:00:00", "2025-05-01 09:00:00"),
        ("2025-05-02 00:00:00", "2025-05-02 10:00:00"),
        ("2025-05-03T00:00:00", "2025-05-03T11:00:00"),
    ] {
        sqlx::query("INSERT INTO interactions VALUES (?, 'a1', ?, 120.0, 6.0)")
            .bind(date)
            .bind(start)
            .execute(&pool)
            .await
            .expect("insert row");
    }
    let source = SqliteInteractionSource::with_pool(pool, DatabaseConfig::default()).unwrap();

    let records = source.fetch(day(1), day(2)).await.expect("fetch");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].date, day(2));

    let single_day = source.fetch(day(2), day(2)).await.expect("fetch");
    assert_eq!(single_day.len(), 1);
    assert_eq!(single_day[0].hour(), 10);

    let last = source.fetch(day(3), day(3)).await.expect("fetch");
    assert_eq!(last.len(), 1);

    let analysis = CampaignAnalyzer::new(source)
        .analyze_campaign_complete(&CampaignRequest::new(day(2), day(2)))
        .await
        .expect("single-day analysis");
    assert_eq!(analysis.historical.total_calls, 1);
}

#[tokio::test]
#[serial]
async fn test_sqlite_source_available_range_and_cap() {
    let source = sqlite_source().await;

    let range = source.available_range().await.expect("range").expect("non-empty");
    assert_eq!(range.start, day(1));
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    assert_eq!(range.total_records, 5);
    assert_eq!(range.total_agents, 3);

    let mut config = source.config().clone();
    config.max_records = 2;
    let capped = SqliteInteractionSource::with_pool(source.pool().clone(), config).unwrap();
    assert_eq!(capped.fetch(day(1), day(3)).await.unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_sqlite_source_rejects_unsafe_mapping() {
    let source = sqlite_source().await;
    let mut config = DatabaseConfig::default();
    config.table_name = "interactions; DROP TABLE interactions".to_string();

    let err = SqliteInteractionSource::with_pool(source.pool().clone(), config).unwrap_err();
    assert!(matches!(err, DatabaseError::Validation(_)));
}

#[tokio::test]
#[serial]
async fn test_sqlite_backed_campaign_analysis() {
    let source = sqlite_source().await;
    let analyzer = CampaignAnalyzer::new(source);

    let analysis = analyzer
        .analyze_campaign_complete(&CampaignRequest::new(day(1), day(3)))
        .await
        .expect("analysis over sqlite");
    assert_eq!(analysis.historical.total_calls, 4);
    assert_eq!(analysis.validation.observed.wait_samples, 2);
}
