use rand::{rngs::StdRng, SeedableRng};
use tglsim_engine::{reset, Engine, Settings};
use tglsim_metrics::{compare_runs, RunSummary};

#[test]
fn fresh_networks_are_not_comparable() {
    let settings = Settings::default();
    let mut rng = StdRng::seed_from_u64(1);
    let (flood, tgl) = reset(&settings, &mut rng).unwrap();
    assert!(compare_runs(&flood, &tgl).is_none());
}

#[test]
fn completed_runs_match_raw_totals() {
    let settings = Settings::default();
    let engine = Engine::from_settings(&settings);
    let mut rng = StdRng::seed_from_u64(2);
    let (flood, tgl) = reset(&settings, &mut rng).unwrap();

    let flood = engine.run_to_completion(&flood, &mut rng);
    let tgl = engine.run_to_completion(&tgl, &mut rng);

    let metrics = compare_runs(&flood, &tgl).unwrap();
    let f = flood.total_messages_sent as f64;
    let h = tgl.total_messages_sent as f64;
    assert_eq!(metrics.message_reduction, (f - h) / f * 100.0);
    assert_eq!(
        metrics.round_difference,
        i64::from(flood.round) - i64::from(tgl.round)
    );

    let summary = RunSummary::from_state(&flood);
    assert_eq!(summary.messages, flood.total_messages_sent);
    assert_eq!(summary.rounds, flood.round);
    assert!(summary.is_complete);
}
