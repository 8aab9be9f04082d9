use crate::{GameId, GameInfo, GameStats};
use failure::{Error, ResultExt, bail};
use serde_derive::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::path::Path;

/// Share of the guild that must rate a game for the general lists.
pub const RANKED_SHARE: f64 = 0.1;
/// Lower share bound for sleepers.
pub const SLEEPER_SHARE: f64 = 0.02;
pub const SLEEPER_MIN_MEAN: f64 = 7.5;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Top,
    Bottom,
    MostVariable,
    LeastVariable,
    MostRated,
    Sleepers
}

impl Category {
    pub fn all() -> [Category; 6] {
        [Category::Top, Category::Bottom, Category::MostVariable,
         Category::LeastVariable, Category::MostRated, Category::Sleepers]
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::MostVariable => "most-variable",
            Category::LeastVariable => "least-variable",
            Category::MostRated => "most-rated",
            Category::Sleepers => "sleepers"
        }
    }

    pub fn from_key(key: &str) -> Result<Category, Error> {
        match Category::all().iter().find(|c| c.key() == key) {
            Some(c) => Ok(*c),
            None => bail!("Unknown category: {}", key)
        }
    }

    /// English headline, also the message id for translations.
    pub fn headline(self) -> &'static str {
        match self {
            Category::Top => "Top",
            Category::Bottom => "Bottom",
            Category::MostVariable => "Most Varied",
            Category::LeastVariable => "Most Similar",
            Category::MostRated => "Most Rated",
            Category::Sleepers => "Sleepers"
        }
    }

    fn order(self, a: &GameStats, b: &GameStats) -> Ordering {
        match self {
            Category::Top | Category::Sleepers => b.mean_rating.total_cmp(&a.mean_rating),
            Category::Bottom => a.mean_rating.total_cmp(&b.mean_rating),
            Category::MostVariable => b.stdev_rating.total_cmp(&a.stdev_rating),
            Category::LeastVariable => a.stdev_rating.total_cmp(&b.stdev_rating),
            Category::MostRated => b.rating_count.cmp(&a.rating_count)
        }
    }

    /// Stable sort, ties keep their current order.
    pub fn sort(self, games: &mut [GameStats]) {
        games.sort_by(|a, b| self.order(a, b));
    }

    pub fn qualifies(self, game: &GameStats, member_count: usize) -> bool {
        let count = f64::from(game.rating_count);
        let members = member_count as f64;
        match self {
            Category::Sleepers => SLEEPER_SHARE * members <= count
                && count < RANKED_SHARE * members
                && game.mean_rating >= SLEEPER_MIN_MEAN,
            _ => count >= RANKED_SHARE * members
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    pub category: Category,
    pub count: usize,
    pub games: Vec<GameStats>
}

/// Every list of one run, as written to the lists file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCollection {
    pub generation_time: String,
    pub lists: Vec<RankedList>
}

impl ListCollection {
    pub fn get(&self, category: Category) -> Option<&RankedList> {
        self.lists.iter().find(|l| l.category == category)
    }
}

/// Builds one ranked table out of the raw aggregate.
/// Game info is looked up only for games walked until `limit` non-expansions are found.
pub fn rank<F>(games: &[GameStats], category: Category, limit: usize, member_count: usize,
        mut lookup: F) -> Result<RankedList, Error>
        where F: FnMut(GameId) -> Result<GameInfo, Error> {
    let mut candidates: Vec<GameStats> = games.iter()
        .filter(|g| category.qualifies(g, member_count))
        .cloned()
        .collect();
    category.sort(&mut candidates);

    let mut ranked = Vec::new();
    for game in candidates {
        if ranked.len() >= limit {
            break;
        }
        let info = lookup(game.game_id)?;
        if !info.is_expansion {
            ranked.push(game.named(&info.name));
        }
    }
    Ok(RankedList { category, count: limit, games: ranked })
}

/// Restricts the aggregate to the games of a `game_id,name` csv file.
pub fn prune(games: &[GameStats], path: &Path) -> Result<Vec<GameStats>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|_| format!("Can't open: {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = match record.get(0) {
            Some(id) => id.parse::<GameId>()
                .with_context(|_| format!("Bad game id in prune list: {}", id))?,
            None => bail!("Empty row in prune list")
        };
        let name = record.get(1).unwrap_or("").to_string();
        rows.push((id, name));
    }
    prune_rows(games, &rows)
}

pub fn prune_rows(games: &[GameStats], rows: &[(GameId, String)]) -> Result<Vec<GameStats>, Error> {
    let mut pruned = Vec::new();
    for (id, name) in rows {
        let matches: Vec<&GameStats> = games.iter().filter(|g| g.game_id == *id).collect();
        let game = match matches.as_slice() {
            [single] => single.named(name),
            [] => GameStats {
                game_id: *id,
                name: Some(name.clone()),
                rating_count: 0,
                mean_rating: 0.0,
                stdev_rating: 0.0
            },
            _ => bail!("Game {} matches {} entries of the aggregate", id, matches.len())
        };
        pruned.push(game);
    }
    Category::Top.sort(&mut pruned);
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn game(game_id: GameId, rating_count: u32, mean_rating: f64, stdev_rating: f64) -> GameStats {
        GameStats { game_id, name: None, rating_count, mean_rating, stdev_rating }
    }

    fn sample() -> Vec<GameStats> {
        vec![
            game(1, 40, 8.9, 1.1),
            game(2, 12, 8.1, 2.4),
            game(3, 60, 7.2, 0.6),
            game(4, 25, 6.0, 1.9),
            game(5, 9, 7.6, 0.8),
            game(6, 1, 9.5, 0.0),
        ]
    }

    fn infos() -> HashMap<GameId, GameInfo> {
        (1..=6).map(|id| (id, GameInfo {
            name: format!("Game {}", id),
            is_expansion: id == 2
        })).collect()
    }

    fn ranked(category: Category, limit: usize) -> Vec<GameId> {
        let infos = infos();
        rank(&sample(), category, limit, 100, |id| Ok(infos[&id].clone()))
            .unwrap()
            .games.iter().map(|g| g.game_id).collect()
    }

    #[test]
    fn test_category_orders() {
        assert_eq!(ranked(Category::Top, 10), vec![1, 3, 4]);
        assert_eq!(ranked(Category::Bottom, 10), vec![4, 3, 1]);
        assert_eq!(ranked(Category::MostVariable, 10), vec![4, 1, 3]);
        assert_eq!(ranked(Category::LeastVariable, 10), vec![3, 1, 4]);
        assert_eq!(ranked(Category::MostRated, 10), vec![3, 1, 4]);
    }

    #[test]
    fn test_top_is_non_increasing() {
        let mut games = sample();
        Category::Top.sort(&mut games);
        for pair in games.windows(2) {
            assert!(pair[0].mean_rating >= pair[1].mean_rating);
        }
    }

    #[test]
    fn test_threshold_excludes_lightly_rated() {
        // 9 of 100 members is below the 10% line
        assert!(!Category::Top.qualifies(&game(5, 9, 7.6, 0.8), 100));
        assert!(Category::Top.qualifies(&game(5, 10, 7.6, 0.8), 100));
        assert!(Category::Sleepers.qualifies(&game(5, 9, 7.6, 0.8), 100));
        assert!(!Category::Sleepers.qualifies(&game(5, 9, 7.4, 0.8), 100));
        assert!(!Category::Sleepers.qualifies(&game(6, 1, 9.5, 0.0), 100));
        assert_eq!(ranked(Category::Sleepers, 10), vec![5]);
    }

    #[test]
    fn test_limit_stops_lookups() {
        let infos = infos();
        let mut asked = Vec::new();
        let list = rank(&sample(), Category::Top, 1, 100, |id| {
            asked.push(id);
            Ok(infos[&id].clone())
        }).unwrap();
        assert_eq!(list.games.len(), 1);
        assert_eq!(list.games[0].name, Some("Game 1".to_string()));
        assert_eq!(asked, vec![1]);
    }

    #[test]
    fn test_lookup_failure_is_fatal() {
        let res = rank(&sample(), Category::Top, 5, 100, |_| Err(failure::err_msg("down")));
        assert!(res.is_err());
    }

    #[test]
    fn test_prune_rows() {
        let rows = vec![
            (3, "Three".to_string()),
            (99, "Missing".to_string()),
            (1, "One".to_string()),
        ];
        let pruned = prune_rows(&sample(), &rows).unwrap();
        let names: Vec<String> = pruned.iter().map(|g| g.display_name()).collect();
        assert_eq!(names, vec!["One", "Three", "Missing"]);
        assert_eq!(pruned[2].rating_count, 0);
        assert_eq!(pruned[2].mean_rating, 0.0);
    }

    #[test]
    fn test_prune_duplicate_is_error() {
        let mut games = sample();
        games.push(game(3, 1, 1.0, 0.0));
        let rows = vec![(3, "Three".to_string())];
        assert!(prune_rows(&games, &rows).is_err());
    }

    #[test]
    fn test_prune_reads_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.csv");
        std::fs::write(&path, "3 , Three \n1,\"One, the game\"\n99,Missing\n").unwrap();
        let pruned = prune(&sample(), &path).unwrap();
        let names: Vec<String> = pruned.iter().map(|g| g.display_name()).collect();
        // first row is data, not a header
        assert_eq!(names, vec!["One, the game", "Three", "Missing"]);
        assert_eq!(pruned[0].rating_count, 40);
        assert_eq!(pruned[2].rating_count, 0);
    }

    #[test]
    fn test_prune_bad_id_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.csv");
        std::fs::write(&path, "1,One\nabc,Letters\n").unwrap();
        assert!(prune(&sample(), &path).is_err());
        assert!(prune(&sample(), &dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_category_keys() {
        for c in Category::all().iter() {
            assert_eq!(Category::from_key(c.key()).unwrap(), *c);
            let json = serde_json::to_string(c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.key()));
        }
        assert!(Category::from_key("middle").is_err());
    }
}
