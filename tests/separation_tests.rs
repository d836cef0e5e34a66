//! Sines/transients/noise separation on a synthetic mixture.
//!
//! The fixture is a 440 Hz sine, a 10 Hz impulse train and quiet noise.
//! Because masking is linear once the masks are fixed, each ingredient is
//! projected through the masks computed for the mixture to see which
//! stream it ended up in.
//!
//! Run with:
//! ```bash
//! cargo test -p trisect --test separation_tests
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use approx::assert_abs_diff_eq;
use helpers::tolerances::*;
use helpers::{
    energy, energy_share, init_tracing, peak, ratio_db, standard_fixture, TEST_SAMPLE_RATE,
};
use trisect::analysis::{StnAnalysis, StnSeparator};
use trisect::prelude::*;

fn analyze_fixture() -> (helpers::Fixture, StnAnalysis) {
    init_tracing();
    let fixture = standard_fixture();
    let analysis = StnSeparator::new(trisect::StnConfig::default())
        .unwrap()
        .analyze(&fixture.mix)
        .unwrap();
    (fixture, analysis)
}

#[test]
fn test_sine_lands_in_sines_stream() {
    let (fixture, analysis) = analyze_fixture();
    let [sines, transients, noise] = analysis.apply(&fixture.sine).unwrap();

    let share = energy_share(&sines, &fixture.sine);
    assert!(
        share > SEPARATION_SHARE,
        "sine share in sines stream: {share:.4}"
    );
    assert!(energy_share(&transients, &fixture.sine) < 1.0 - SEPARATION_SHARE);
    assert!(energy_share(&noise, &fixture.sine) < 1.0 - SEPARATION_SHARE);
}

#[test]
fn test_impulses_land_in_transients_stream() {
    let (fixture, analysis) = analyze_fixture();
    let [sines, transients, _noise] = analysis.apply(&fixture.impulses).unwrap();

    let share = energy_share(&transients, &fixture.impulses);
    assert!(
        share > SEPARATION_SHARE,
        "impulse share in transients stream: {share:.4}"
    );
    assert!(energy_share(&sines, &fixture.impulses) < 1.0 - SEPARATION_SHARE);
}

#[test]
fn test_fixture_noise_stays_quiet() {
    // The impulse share above only holds with the noise this far down.
    let fixture = standard_fixture();
    assert!(peak(&fixture.noise) <= 0.005);
    let level = 20.0 * (peak(&fixture.noise) / peak(&fixture.sine)).log10();
    assert!(level < -39.5, "noise peak {level:.1} dB relative to the sine");
}

#[test]
fn test_streams_sum_back_to_input() {
    let (fixture, analysis) = analyze_fixture();
    let components = analysis.components();
    let rebuilt = components.sum();
    let input = fixture.mix.samples();

    assert_eq!(rebuilt.len(), input.len());
    let error: Vec<f64> = rebuilt.iter().zip(input).map(|(a, b)| a - b).collect();
    let db = ratio_db(energy(&error), energy(input));
    assert!(db < RECONSTRUCTION_DB, "reconstruction error {db:.1} dB");
}

#[test]
fn test_projection_of_mixture_matches_components() {
    let (fixture, analysis) = analyze_fixture();
    let [sines, transients, noise] = analysis.apply(fixture.mix.samples()).unwrap();
    let components = analysis.components();

    for (projected, stored) in [
        (&sines, components.sines.samples()),
        (&transients, components.transients.samples()),
        (&noise, components.noise.samples()),
    ] {
        let max_diff = projected
            .iter()
            .zip(stored)
            .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
        assert!(max_diff < RECONSTRUCTION_EPSILON, "max diff {max_diff}");
    }
}

#[test]
fn test_masks_partition_unity_on_real_mixture() {
    let (_fixture, analysis) = analyze_fixture();
    for masks in [analysis.coarse_masks(), analysis.fine_masks()] {
        masks.check_partition().unwrap();
        let bins = masks.sines.bins();
        let frames = masks.sines.frames();
        for frame in 0..frames {
            for bin in 0..bins {
                let s = masks.sines.get(bin, frame);
                let t = masks.transients.get(bin, frame);
                let n = masks.noise.get(bin, frame);
                assert_abs_diff_eq!(s + t + n, 1.0, epsilon = MASK_SUM_EPSILON);
                assert!((0.0..=1.0).contains(&s));
                assert!((0.0..=1.0).contains(&t));
            }
        }
    }
}

#[test]
fn test_filter_lengths_follow_resolution() {
    let (_fixture, analysis) = analyze_fixture();
    let (coarse, fine) = analysis.filter_lengths();
    assert_eq!((coarse.horizontal, coarse.vertical), (9, 93));
    assert_eq!((fine.horizontal, fine.vertical), (139, 7));
}

#[test]
fn test_free_separate_matches_separator() {
    init_tracing();
    let fixture = standard_fixture();
    let direct = trisect::separate(&fixture.mix, 8192, 512, 0.8, 0.7).unwrap();
    let via_engine = TrisectEngine::builder()
        .build()
        .unwrap()
        .separate(&fixture.mix)
        .unwrap();
    assert_eq!(direct, via_engine);
}

#[test]
fn test_short_input_is_rejected() {
    let short = Signal::new(vec![0.1; 4096], TEST_SAMPLE_RATE).unwrap();
    let result = trisect::separate(&short, 8192, 512, 0.8, 0.7);
    assert!(matches!(result, Err(Error::Precondition(_))));
}

#[test]
fn test_invalid_thresholds_are_rejected() {
    let fixture = standard_fixture();
    for (upper, lower) in [(0.7, 0.8), (1.0, 0.5), (0.5, 0.0), (0.6, 0.6)] {
        let result = trisect::separate(&fixture.mix, 8192, 512, upper, lower);
        assert!(
            matches!(result, Err(Error::InvalidParameter(_))),
            "({upper}, {lower}) accepted"
        );
    }
}
