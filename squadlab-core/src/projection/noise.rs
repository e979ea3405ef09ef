//! Multiplicative normal noise on projected points, for randomized runs.

use rand::Rng;
use rand_distr::StandardNormal;

use super::table::ProjectionTable;

/// Return a copy of `table` where every projected point value is scaled by
/// `1 + magnitude * z`, `z ~ N(0, 1)`, clamped at zero.
///
/// Minutes and column coverage are left untouched.
pub fn perturb<R: Rng>(table: &ProjectionTable, rng: &mut R, magnitude: f64) -> ProjectionTable {
    if magnitude <= 0.0 {
        return table.clone();
    }
    table.map_points(|_, _, xp| {
        let z: f64 = rng.sample(StandardNormal);
        (xp * (1.0 + magnitude * z)).max(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlayerId, Position};
    use crate::projection::PlayerProjection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table() -> ProjectionTable {
        let players = (1..=20)
            .map(|i| PlayerProjection {
                id: PlayerId(i),
                name: format!("P{i}"),
                position: Position::Defender,
                club: "AAA".into(),
                price: 45.0,
                points: [(1, 4.0), (2, 5.0)].into_iter().collect(),
                minutes: [(1, 90.0), (2, 90.0)].into_iter().collect(),
            })
            .collect();
        ProjectionTable::new(players)
    }

    #[test]
    fn zero_magnitude_is_identity() {
        let t = table();
        let mut rng = StdRng::seed_from_u64(1);
        let out = perturb(&t, &mut rng, 0.0);
        assert_eq!(out.players(), t.players());
    }

    #[test]
    fn same_seed_same_noise() {
        let t = table();
        let a = perturb(&t, &mut StdRng::seed_from_u64(9), 0.2);
        let b = perturb(&t, &mut StdRng::seed_from_u64(9), 0.2);
        assert_eq!(a.players(), b.players());
    }

    #[test]
    fn noise_changes_points_but_not_minutes() {
        let t = table();
        let out = perturb(&t, &mut StdRng::seed_from_u64(3), 0.3);
        let changed = out
            .players()
            .iter()
            .zip(t.players())
            .any(|(a, b)| a.points != b.points);
        assert!(changed);
        for (a, b) in out.players().iter().zip(t.players()) {
            assert_eq!(a.minutes, b.minutes);
        }
    }

    #[test]
    fn points_never_negative() {
        let t = table();
        let out = perturb(&t, &mut StdRng::seed_from_u64(5), 5.0);
        assert!(out
            .players()
            .iter()
            .flat_map(|p| p.points.values())
            .all(|&xp| xp >= 0.0));
    }
}
