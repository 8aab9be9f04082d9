use crate::{GameId, GameStats};

/// Movement of one game between two rankings.
/// Deltas are `None` for games without an old entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub game_id: GameId,
    pub name: String,
    pub rank_new: usize,
    pub rank_old: Option<usize>,
    pub rank_delta: Option<i64>,
    pub rating_count_new: u32,
    pub rating_count_delta: Option<i64>,
    pub mean_new: f64,
    pub mean_delta: Option<f64>,
    pub stdev_new: f64
}

impl DiffEntry {
    pub fn is_new(&self) -> bool {
        self.rank_old.is_none()
    }
}

/// One entry per game of `new`, in `new`'s order. Ranks are 0-based positions.
pub fn diff(old: &[GameStats], new: &[GameStats]) -> Vec<DiffEntry> {
    new.iter().enumerate().map(|(i, game)| {
        // first match wins if old has duplicate ids
        let prior = old.iter().enumerate().find(|(_, o)| o.game_id == game.game_id);
        let mut entry = DiffEntry {
            game_id: game.game_id,
            name: game.display_name(),
            rank_new: i,
            rank_old: None,
            rank_delta: None,
            rating_count_new: game.rating_count,
            rating_count_delta: None,
            mean_new: game.mean_rating,
            mean_delta: None,
            stdev_new: game.stdev_rating
        };
        if let Some((j, o)) = prior {
            entry.rank_old = Some(j);
            entry.rank_delta = Some(j as i64 - i as i64);
            entry.rating_count_delta = Some(i64::from(game.rating_count) - i64::from(o.rating_count));
            entry.mean_delta = Some(game.mean_rating - o.mean_rating);
        }
        entry
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(name: &str, game_id: GameId, rating_count: u32, mean_rating: f64, stdev_rating: f64) -> GameStats {
        GameStats { game_id, name: Some(name.to_string()), rating_count, mean_rating, stdev_rating }
    }

    #[test]
    fn test_diff_moves_and_new_entries() {
        let old = vec![game("GameA", 1, 10, 8.5, 1.2), game("GameB", 2, 8, 8.0, 0.9)];
        let new = vec![
            game("GameB", 2, 9, 8.2, 0.85),
            game("GameA", 1, 11, 8.4, 1.1),
            game("GameC", 3, 5, 9.0, 0.5),
        ];
        let entries = diff(&old, &new);
        assert_eq!(entries.len(), 3);

        let b = &entries[0];
        assert_eq!(b.name, "GameB");
        assert_eq!(b.rank_old, Some(1));
        assert_eq!(b.rank_delta, Some(1));
        assert_eq!(b.rating_count_delta, Some(1));
        assert!((b.mean_delta.unwrap() - 0.2).abs() < 1e-9);

        let a = &entries[1];
        assert_eq!(a.rank_delta, Some(-1));
        assert_eq!(a.rating_count_delta, Some(1));
        assert!((a.mean_delta.unwrap() + 0.1).abs() < 1e-9);

        let c = &entries[2];
        assert!(c.is_new());
        assert_eq!(c.rank_delta, None);
        assert_eq!(c.rating_count_delta, None);
        assert_eq!(c.mean_delta, None);
        assert_eq!(c.stdev_new, 0.5);
    }

    #[test]
    fn test_duplicate_old_ids_use_first() {
        let old = vec![game("X", 5, 3, 7.0, 0.0), game("X", 5, 4, 6.0, 0.0)];
        let new = vec![game("X", 5, 6, 7.5, 0.0)];
        let entries = diff(&old, &new);
        assert_eq!(entries[0].rank_old, Some(0));
        assert_eq!(entries[0].rating_count_delta, Some(3));
    }

    #[test]
    fn test_diff_against_empty_old() {
        let new = vec![game("X", 5, 6, 7.5, 0.0)];
        assert!(diff(&[], &new).iter().all(|e| e.is_new()));
        assert!(diff(&new, &[]).is_empty());
    }

    #[test]
    fn test_diff_is_repeatable() {
        let old = vec![game("A", 1, 10, 8.5, 1.2)];
        let new = vec![game("A", 1, 12, 8.1, 1.0), game("B", 2, 4, 7.0, 0.3)];
        assert_eq!(diff(&old, &new), diff(&old, &new));
    }
}
