use crate::{GameId, GameStats, Member};
use serde_derive::{Serialize, Deserialize};
use std::collections::{BTreeMap, HashMap};

/// Ratings of one member: game id -> rating.
pub type MemberRatings = HashMap<GameId, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub member_count: usize,
    pub total_distinct_games: usize,
    pub generation_time: String
}

/// Raw aggregate of one guild run, games sorted by mean rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub summary: Summary,
    pub members: Vec<Member>,
    pub ranked_games: Vec<GameStats>
}

impl Snapshot {
    pub fn new(members: Vec<Member>, ratings: &BTreeMap<Member, MemberRatings>,
            generation_time: String) -> Snapshot {
        let per_game = collapse(ratings);
        let ranked_games = reduce(&per_game);
        Snapshot {
            summary: Summary {
                member_count: members.len(),
                total_distinct_games: per_game.len(),
                generation_time
            },
            members,
            ranked_games
        }
    }

    pub fn member_count(&self) -> usize {
        self.summary.member_count
    }
}

/// Folds every member's ratings into one list of ratings per game.
pub fn collapse<'a, I>(members: I) -> HashMap<GameId, Vec<f64>>
        where I: IntoIterator<Item = (&'a Member, &'a MemberRatings)> {
    let mut per_game: HashMap<GameId, Vec<f64>> = HashMap::new();
    for (_, ratings) in members {
        for (game, rating) in ratings {
            per_game.entry(*game).or_insert_with(Vec::new).push(*rating);
        }
    }
    per_game
}

/// Reduces per-game ratings to stats, best mean first.
/// Ties are ordered by game id to keep snapshots reproducible.
pub fn reduce(per_game: &HashMap<GameId, Vec<f64>>) -> Vec<GameStats> {
    let mut games: Vec<GameStats> = per_game.iter()
        .filter(|(_, ratings)| !ratings.is_empty())
        .map(|(id, ratings)| stats_of(*id, ratings))
        .collect();
    games.sort_by(|a, b| b.mean_rating.total_cmp(&a.mean_rating)
        .then(a.game_id.cmp(&b.game_id)));
    games
}

pub fn stats_of(game_id: GameId, ratings: &[f64]) -> GameStats {
    let stdev_rating = if ratings.len() > 1 {
        round3(sample_stdev(ratings))
    } else {
        0.0
    };
    GameStats {
        game_id,
        name: None,
        rating_count: ratings.len() as u32,
        mean_rating: round3(mean(ratings)),
        stdev_rating
    }
}

fn mean(ratings: &[f64]) -> f64 {
    ratings.iter().sum::<f64>() / ratings.len() as f64
}

fn sample_stdev(ratings: &[f64]) -> f64 {
    let m = mean(ratings);
    let sq: f64 = ratings.iter().map(|r| (r - m) * (r - m)).sum();
    (sq / (ratings.len() - 1) as f64).sqrt()
}

/// Three decimal places, rounding the exact binary value with ties to even.
pub fn round3(val: f64) -> f64 {
    format!("{:.3}", val).parse().unwrap_or(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(ratings: &[(GameId, f64)]) -> MemberRatings {
        ratings.iter().cloned().collect()
    }

    #[test]
    fn test_stats_single_rating() {
        let s = stats_of(7, &[6.5]);
        assert_eq!(s.rating_count, 1);
        assert_eq!(s.mean_rating, 6.5);
        assert_eq!(s.stdev_rating, 0.0);
    }

    #[test]
    fn test_stats_rounded_to_three_places() {
        let s = stats_of(1, &[7.0, 8.0, 10.0]);
        assert_eq!(s.rating_count, 3);
        assert_eq!(s.mean_rating, 8.333);
        // sample stdev of 7, 8, 10 is 1.5275...
        assert_eq!(s.stdev_rating, 1.528);
    }

    #[test]
    fn test_stats_ties_round_to_even() {
        let mut ratings = vec![8.0; 15];
        ratings.push(9.0);
        // mean is exactly 8.0625
        assert_eq!(stats_of(1, &ratings).mean_rating, 8.062);
        assert_eq!(round3(8.1875), 8.188);
        // 1.0005 sits just below the tie in binary
        assert_eq!(round3(1.0005), 1.0);
        assert_eq!(round3(2.0005), 2.001);
    }

    #[test]
    fn test_collapse_and_reduce() {
        let mut ratings = BTreeMap::new();
        ratings.insert("ann".to_string(), member(&[(1, 8.0), (2, 5.0)]));
        ratings.insert("bob".to_string(), member(&[(1, 6.0)]));
        ratings.insert("cid".to_string(), member(&[(3, 9.0), (1, 7.0)]));

        let per_game = collapse(&ratings);
        assert_eq!(per_game.len(), 3);
        assert_eq!(per_game[&1].len(), 3);

        let games = reduce(&per_game);
        let ids: Vec<GameId> = games.iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(games[1].rating_count, 3);
        assert_eq!(games[1].mean_rating, 7.0);
        assert_eq!(games[1].stdev_rating, 1.0);
    }

    #[test]
    fn test_reduce_ties_by_id() {
        let mut per_game = HashMap::new();
        per_game.insert(9, vec![7.0]);
        per_game.insert(4, vec![7.0]);
        per_game.insert(6, vec![7.0]);
        let ids: Vec<GameId> = reduce(&per_game).iter().map(|g| g.game_id).collect();
        assert_eq!(ids, vec![4, 6, 9]);
    }

    #[test]
    fn test_single_member_guild_has_no_spread() {
        let mut ratings = BTreeMap::new();
        ratings.insert("solo".to_string(), member(&[(1, 8.0), (2, 3.0), (3, 6.5)]));
        let snapshot = Snapshot::new(vec!["solo".to_string()], &ratings, "now".to_string());
        assert_eq!(snapshot.member_count(), 1);
        assert_eq!(snapshot.summary.total_distinct_games, 3);
        assert!(snapshot.ranked_games.iter().all(|g| g.stdev_rating == 0.0));
    }

    #[test]
    fn test_snapshot_json_uses_named_fields() {
        let mut ratings = BTreeMap::new();
        ratings.insert("ann".to_string(), member(&[(13, 7.0)]));
        let snapshot = Snapshot::new(vec!["ann".to_string()], &ratings, "t".to_string());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"rating_count\":1"));
        assert!(!json.contains("\"name\""));
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
