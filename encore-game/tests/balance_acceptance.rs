use encore_game::{
    CompatibilityRating, DiceBest, DiceResult, Grade, RngBundle, RollDomain, Roller, ScoreInputs,
    ScoringMode, StreamRoller, VenueId, VenueTable, die_faces, diminish_factor, realized_bonus,
    roll_check, score_release, venue_payout,
};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;

fn ratio(hits: usize, total: usize) -> f64 {
    let hits = u32::try_from(hits).expect("hits fit u32");
    let total = u32::try_from(total).expect("total fits u32");
    f64::from(hits) / f64::from(total)
}

#[test]
fn risky_pairing_wins_a_quarter_of_releases() {
    let mut bundle = RngBundle::from_user_seed(2024);
    let wins = (0..SAMPLE_SIZE)
        .filter(|_| realized_bonus(CompatibilityRating::Risky, &mut bundle) == 12)
        .count();
    let observed = ratio(wins, SAMPLE_SIZE);
    assert!(
        (observed - 0.25).abs() < TOLERANCE,
        "risky win rate {observed:.3}"
    );
    assert_eq!(bundle.draws(RollDomain::Dice), 0);
}

#[test]
fn skill_checks_are_uniform_over_the_die() {
    let mut roller = StreamRoller::small(77);
    let mut counts = [0usize; 12];
    for _ in 0..SAMPLE_SIZE {
        let result = roll_check(6.0, &mut roller);
        assert_eq!(result.faces, 12);
        counts[result.value as usize - 1] += 1;
    }
    for count in counts {
        let observed = ratio(count, SAMPLE_SIZE);
        assert!((observed - 1.0 / 12.0).abs() < TOLERANCE, "face share {observed:.3}");
    }
}

#[test]
fn die_tiers_cover_stat_range() {
    let mut rng = SmallRng::seed_from_u64(9);
    for _ in 0..SAMPLE_SIZE {
        let stat: f64 = rng.gen_range(0.0..=10.0);
        assert!([6, 8, 10, 12, 20].contains(&die_faces(stat)));
    }
}

#[test]
fn scores_and_charts_stay_in_bounds() {
    let venues = VenueTable::default_table();
    let mut rng = SmallRng::seed_from_u64(31);
    let mut roller = StreamRoller::small(32);
    for _ in 0..SAMPLE_SIZE {
        let faces = [6, 8, 10, 12, 20][rng.gen_range(0..5)];
        let mut dice = DiceBest::default();
        if rng.gen_bool(0.9) {
            dice.sing = Some(DiceResult {
                faces,
                value: rng.gen_range(1..=faces),
            });
        }
        dice.write = Some(DiceResult {
            faces,
            value: rng.gen_range(1..=faces),
        });
        let (id, venue) = venues
            .iter()
            .nth(rng.gen_range(0..5))
            .expect("five venues");
        let rating = CompatibilityRating::from_signum(rng.gen_range(-1..=1));
        let mode = if rng.gen_bool(0.5) {
            ScoringMode::Dice
        } else {
            ScoringMode::Legacy
        };
        let inputs = ScoreInputs {
            mode,
            dice: &dice,
            triad_total: rng.gen_range(0.0..30.0),
            week: rng.gen_range(1..=52),
            rating,
            venue,
            fans: rng.gen_range(0..50_000),
        };
        let breakdown = score_release(&inputs, &mut roller);
        assert!((0.0..=100.0).contains(&breakdown.score), "{id}: {breakdown:?}");
        assert!((1..=100).contains(&breakdown.chart_pos));
        assert_eq!(breakdown.grade, Grade::from_score(breakdown.score));
    }
}

#[test]
fn economic_floors_hold_for_any_score() {
    let venues = VenueTable::default_table();
    let mut rng = SmallRng::seed_from_u64(55);
    for _ in 0..SAMPLE_SIZE {
        let score: f64 = rng.gen_range(0.0..=100.0);
        let week = rng.gen_range(1..=52);
        let fans = rng.gen_range(0..10_000);
        for (id, venue) in venues.iter() {
            let payout = venue_payout(venue, score, Grade::from_score(score), fans, week);
            if venue.is_no_risk() {
                assert!(payout.money >= venue.tip_floor.unwrap_or(0), "{id} below tip floor");
            }
            if week <= 3 {
                assert!(payout.money >= -20, "{id} broke onboarding guardrail");
            }
        }
    }
}

#[test]
fn reference_club_release_nets_twelve() {
    let venues = VenueTable::default_table();
    let club = venues.get(VenueId::Club).expect("club");
    let payout = venue_payout(club, 85.0, Grade::A, 0, 10);
    assert_eq!(payout.money, 12);
    assert_eq!(payout.fans, 52);
}

#[test]
fn training_curve_reference_values() {
    let gains: f64 = (1..=7).map(|n| 0.15 * diminish_factor(n)).sum();
    assert!((gains - (1.0 - 0.85_f64.powi(7))).abs() < 1e-12);
    assert!((gains - 0.6794).abs() < 1e-4);
    assert!((diminish_factor(9) - 0.3).abs() < 1e-12);
}

#[test]
fn domain_streams_do_not_interfere() {
    let mut quiet = RngBundle::from_user_seed(404);
    let mut busy = RngBundle::from_user_seed(404);
    for _ in 0..25 {
        busy.roll(RollDomain::Dice, 1, 20);
    }
    let a: Vec<i32> = (0..10).map(|_| quiet.roll(RollDomain::Chart, -3, 3)).collect();
    let b: Vec<i32> = (0..10).map(|_| busy.roll(RollDomain::Chart, -3, 3)).collect();
    assert_eq!(a, b);
}
