//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Configuration and analysis JSON contracts
//! - Full match orchestration over the in-memory store, with delayed
//!   visibility, file-backed records and concurrent matches

#[cfg(test)]
mod fixtures {
    use contracts::TrackingRun;
    use serde_json::{json, Value};

    pub const FPS: f64 = 25.0;
    pub const FRAMES: usize = 250;

    /// Ten seconds at 25 fps: `top_left` walks along x at `speed` units/s,
    /// `bottom_right` stands still, the ball drifts at 0.5 units/s.
    /// Every 50th frame the ball is not detected.
    pub fn steady_run(speed: f64) -> TrackingRun {
        let frames: Vec<Value> = (0..FRAMES)
            .map(|i| {
                let t = i as f64 / FPS;
                let ball = if i % 50 == 25 {
                    json!({"x": -1, "y": -1})
                } else {
                    json!({"x": 1.0 + 0.5 * t, "y": 12.0, "bote": i32::from(i % 100 == 0)})
                };
                json!({
                    "players": {
                        "top_left": {"x": 0.5 + speed * t, "y": 5.0},
                        "bottom_right": {"x": 7.0, "y": 15.0},
                    },
                    "ball": ball,
                })
            })
            .collect();

        let body = json!({"fps": FPS, "frames": frames}).to_string();
        ingestion::parse_payload(&body).unwrap()
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{PipelineConfig, RecordsBackend, StoreBackend};

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.gate.max_retries = 7;
        config.analytics.court.cell_size = 0.5;

        let text = ConfigLoader::to_toml(&config).unwrap();
        let back = ConfigLoader::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(back.gate.max_retries, 7);
        assert_eq!(back.analytics.court.cell_size, 0.5);
        assert_eq!(back.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ConfigLoader::load_from_str(
            r#"
            [store]
            visibility_delay_ms = 250

            [records]
            backend = "file"
            path = "/var/lib/statpadel"
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.store.visibility_delay_ms, 250);
        assert_eq!(config.records.backend, RecordsBackend::File);
        assert_eq!(config.gate.retry_delay_ms, 500);
        assert_eq!(config.analytics.player_speed_cap, 9.0);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        AnalysisResult, Entity, MatchId, MatchRecordStore, MatchStatus, PipelineConfig,
        PlayerSlot,
    };
    use match_store::{FileMatchStore, Records};
    use observability::Stage;
    use pipeline::{AnalyticsOrchestrator, PipelineError};
    use tsdb::Store;

    use crate::fixtures::{steady_run, FRAMES};

    const TOP_LEFT: Entity = Entity::Player(PlayerSlot::TopLeft);
    const BOTTOM_RIGHT: Entity = Entity::Player(PlayerSlot::BottomRight);

    fn orchestrator(config: PipelineConfig) -> AnalyticsOrchestrator<Store, Records> {
        let store = Store::from_config(&config.store).unwrap();
        let records = Records::from_config(&config.records).unwrap();
        AnalyticsOrchestrator::new(Arc::new(store), Arc::new(records), config)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    /// End-to-end: config -> write -> delayed visibility -> aggregates -> record
    #[tokio::test(start_paused = true)]
    async fn test_e2e_memory_pipeline() {
        let config = ConfigLoader::load_from_str(
            r#"
            [store]
            backend = "memory"
            visibility_delay_ms = 1200
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let orchestrator = orchestrator(config);
        let id = MatchId::from("e2e-1");

        let outcome = orchestrator
            .finalize_match(&id, &steady_run(0.8))
            .await
            .unwrap();
        let analysis = &outcome.analysis;

        // 249 steps of 40 ms
        assert_close(analysis.distances[&TOP_LEFT], 0.8 * 9.96);
        assert_close(analysis.avg_speeds[&TOP_LEFT], 0.8);
        assert_close(analysis.max_speeds[&TOP_LEFT], 0.8);
        assert_close(analysis.distances[&BOTTOM_RIGHT], 0.0);
        assert_close(analysis.max_speeds[&BOTTOM_RIGHT], 0.0);
        assert_close(analysis.max_speeds[&Entity::Ball], 0.5);

        let frames = FRAMES as u64;
        assert_eq!(analysis.heatmap.total_visits(PlayerSlot::TopLeft), frames);
        assert_eq!(analysis.heatmap.total_visits(PlayerSlot::BottomRight), frames);
        assert_eq!(analysis.heatmap.heatmap[&PlayerSlot::BottomRight].len(), 1);

        // 500 player points * 2 + 245 ball points * 3
        assert_eq!(outcome.stats.units_written, 1000 + 245 * 3);
        assert_eq!(outcome.stats.gate_attempts, 4);
        assert!(outcome.stats.stage(Stage::Aggregate).is_some());

        let record = orchestrator.records().load(&id).await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Analyzed);
        assert_eq!(record.analysis.as_ref(), Some(analysis));
    }

    /// A speed above the player cap is reported at the cap
    #[tokio::test]
    async fn test_e2e_speed_cap() {
        let orchestrator = orchestrator(PipelineConfig::default());
        let id = MatchId::from("sprinter");

        let outcome = orchestrator
            .finalize_match(&id, &steady_run(12.0))
            .await
            .unwrap();
        assert_close(outcome.analysis.max_speeds[&TOP_LEFT], 9.0);
        assert_close(outcome.analysis.avg_speeds[&TOP_LEFT], 12.0);
    }

    /// Records survive the store instance and keep every float bit
    #[tokio::test]
    async fn test_e2e_file_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.records.backend = contracts::RecordsBackend::File;
        config.records.path = Some(dir.path().to_path_buf());
        let orchestrator = orchestrator(config);
        let id = MatchId::from("file/match 1");

        let outcome = orchestrator
            .finalize_match(&id, &steady_run(0.8))
            .await
            .unwrap();

        let reopened = FileMatchStore::new(dir.path()).unwrap();
        let record = reopened.load(&id).await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Analyzed);

        let stored: &AnalysisResult = record.analysis.as_ref().unwrap();
        assert_eq!(stored, &outcome.analysis);
        for (entity, distance) in &outcome.analysis.distances {
            assert_eq!(stored.distances[entity].to_bits(), distance.to_bits());
        }
    }

    /// Matches spawned on separate tasks share one store without interference
    #[tokio::test]
    async fn test_e2e_concurrent_matches() {
        let orchestrator = Arc::new(orchestrator(PipelineConfig::default()));
        let speeds = [0.2, 0.4, 0.6, 0.8];

        let handles: Vec<_> = speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    let id = MatchId::from(format!("concurrent-{i}"));
                    orchestrator.finalize_match(&id, &steady_run(speed)).await
                })
            })
            .collect();

        for (handle, speed) in handles.into_iter().zip(speeds) {
            let outcome = handle.await.unwrap().unwrap();
            assert_close(outcome.analysis.avg_speeds[&TOP_LEFT], speed);
        }
    }

    /// Writes that never become visible fail only that match
    #[tokio::test(start_paused = true)]
    async fn test_e2e_gate_timeout() {
        let mut config = PipelineConfig::default();
        config.store.visibility_delay_ms = 60_000;
        config.gate.max_retries = 5;
        config.gate.retry_delay_ms = 100;
        let orchestrator = orchestrator(config);
        let id = MatchId::from("slow");

        let err = orchestrator
            .finalize_match(&id, &steady_run(0.8))
            .await
            .unwrap_err();
        assert!(err.is_visibility_timeout());
        assert!(matches!(err, PipelineError::Ingestion(_)));

        let record = orchestrator.records().load(&id).await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Failed);
        assert!(record.error.unwrap().contains("visibility timeout"));
    }
}
