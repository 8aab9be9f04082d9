use crate::aggregate::{MemberRatings, Snapshot};
use crate::bgg::RatingsSource;
use crate::cache::GameInfoCache;
use crate::db::{self, DbConn};
use crate::diff;
use crate::locale::{Locale, LOCALE_DIR};
use crate::ranking::{self, Category, ListCollection};
use crate::report::{self, Style};
use crate::{GameId, Member};
use chrono::Local;
use failure::{Error, ResultExt, bail, ensure, format_err};
use serde::de::DeserializeOwned;
use serde_derive::{Serialize, Deserialize};
use serde_json::{from_str, to_string_pretty};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "app.config";

// guild ids
pub const HEAVY_CARDBOARD: u32 = 2044;
pub const PUNCHING_CARDBOARD: u32 = 1805;
pub const UNKNOWNS: u32 = 3422;

pub fn create_structure() -> Result<(), Error> {
    // create config file
    let new_conf = to_string_pretty(&Config::new(PUNCHING_CARDBOARD, 2, 2000, 50, 10, 10))?;
    fs::write(CONFIG_FILE_NAME, new_conf)?;
    // create db file
    DbConn::open(Path::new(db::DB_FILE_NAME))?;
    Ok(())
}

pub fn config() -> Result<Config, Error> {
    let conf = fs::read_to_string(CONFIG_FILE_NAME)
        .with_context(|_| format!("Can't open: {}", CONFIG_FILE_NAME))?;
    let conf: Config = from_str(&conf)?;
    ensure!(conf.attempts > 0, "Config needs at least one attempt per request.");
    Ok(conf)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub guild: u32, // guild used when none is given
    pub attempts: u32, // number of failed requests for one game before stop
    pub delay: u32, // ms, delay increase after every failure
    pub top: usize, // size of the top list
    pub others: usize, // size of bottom, variable, similar and most rated lists
    pub sleepers: usize, // size of the sleepers list
    #[serde(default)]
    pub token: Option<String> // bgg api token
}

impl Config {
    fn new(guild: u32, attempts: u32, delay: u32, top: usize, others: usize, sleepers: usize) -> Config {
        Config {guild, attempts, delay, top, others, sleepers, token: None}
    }

    pub fn delay_step(&self) -> Duration {
        Duration::from_millis(u64::from(self.delay))
    }

    pub fn regulation_token(&self) -> RegulationToken {
        RegulationToken::new(self.attempts, self.delay_step())
    }

    /// `top` overrides the configured top list size.
    pub fn list_size(&self, category: Category, top: Option<usize>) -> usize {
        match category {
            Category::Top => top.unwrap_or(self.top),
            Category::Sleepers => self.sleepers,
            _ => self.others
        }
    }
}

/// Guild id out of a number or a known alias.
pub fn guild_id(arg: &str) -> Result<u32, Error> {
    let id = match arg {
        "hc" => HEAVY_CARDBOARD,
        "pc" => PUNCHING_CARDBOARD,
        "uk" => UNKNOWNS,
        _ => arg.parse::<u32>()
            .with_context(|_| format!("Guild must be an id or one of [pc, hc, uk]: {}", arg))?
    };
    Ok(id)
}

pub fn load_members_from_file(path: &Path) -> Result<Vec<Member>, Error> {
    let text = fs::read_to_string(path)
        .with_context(|_| format!("Can't open: {}", path.display()))?;
    Ok(text.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Lowercased, deduplicated and sorted.
pub fn normalize_members(members: Vec<Member>) -> Vec<Member> {
    let mut members: Vec<Member> = members.into_iter().map(|m| m.to_lowercase()).collect();
    members.sort();
    members.dedup();
    members
}

#[derive(Debug)]
pub enum Message {
    NoteMembers(usize),
    NoteMemberProgress(Member, usize), // member, members left in the pass
    NoteRetry(Member), // first attempt failed, will try again
    NoteFailed(Member), // no data for that member
    NoteErr(Error),
    NoteGameLookup(GameId),
    NoteFile(PathBuf)
}

/// Ratings of every member that answered, and who did not.
#[derive(Debug, Default)]
pub struct Harvest {
    pub ratings: BTreeMap<Member, MemberRatings>,
    pub failed: Vec<Member>
}

/// Two passes over the members: everyone once, then the failures once more.
/// Members failing twice are left out, only an interrupt is an error.
pub fn fetch_all_ratings<S: RatingsSource + ?Sized>(source: &S, members: &[Member], delay: Duration,
        running: &AtomicBool, progress: &mut impl FnMut(Message)) -> Result<Harvest, Error> {
    let mut harvest = Harvest::default();
    let mut retries = Vec::new();
    for (i, member) in members.iter().enumerate() {
        ensure!(running.load(Ordering::SeqCst), "Interrupted.");
        progress(Message::NoteMemberProgress(member.clone(), members.len() - i));
        match source.member_ratings(member) {
            Ok(ratings) => { harvest.ratings.insert(member.clone(), ratings); },
            Err(e) => {
                progress(Message::NoteErr(e));
                progress(Message::NoteRetry(member.clone()));
                retries.push(member.clone());
            }
        }
    }
    for (i, member) in retries.iter().enumerate() {
        ensure!(running.load(Ordering::SeqCst), "Interrupted.");
        progress(Message::NoteMemberProgress(member.clone(), retries.len() - i));
        // give bgg some time before asking again
        thread::sleep(delay);
        match source.member_ratings(member) {
            Ok(ratings) => { harvest.ratings.insert(member.clone(), ratings); },
            Err(e) => {
                progress(Message::NoteErr(e));
                progress(Message::NoteFailed(member.clone()));
                harvest.failed.push(member.clone());
            }
        }
    }
    Ok(harvest)
}

/// Every category list of a snapshot, names and expansions resolved through the cache.
pub fn build_lists<S: RatingsSource + ?Sized>(snapshot: &Snapshot, source: &S, cache: &mut GameInfoCache,
        config: &Config, top: Option<usize>, running: &AtomicBool,
        progress: &mut impl FnMut(Message)) -> Result<ListCollection, Error> {
    let mut lists = Vec::new();
    for category in Category::all().iter() {
        let limit = config.list_size(*category, top);
        let list = ranking::rank(&snapshot.ranked_games, *category, limit, snapshot.member_count(), |id| {
            ensure!(running.load(Ordering::SeqCst), "Interrupted.");
            if cache.get(id).is_none() {
                progress(Message::NoteGameLookup(id));
            }
            cache.resolve(id, source, config.regulation_token(), |e| progress(Message::NoteErr(e)))
        })?;
        lists.push(list);
    }
    Ok(ListCollection { generation_time: Local::now().to_string(), lists })
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub guild: Option<String>,
    pub users: Option<PathBuf>,
    pub concat: bool,
    pub raw: Option<PathBuf>,
    pub prune: Option<PathBuf>,
    pub top: Option<usize>,
    pub style: Style,
    pub lang: String
}

/// Fetches or loads a snapshot, then writes either the lists file or the pruned report.
/// Returns the last file written.
/// Every file goes to `dir`, game info is cached in `db`.
pub fn generate<S: RatingsSource + ?Sized>(config: &Config, opts: &GenerateOptions, source: &S,
        db: &mut DbConn, dir: &Path, running: &AtomicBool,
        progress: &mut impl FnMut(Message)) -> Result<PathBuf, Error> {
    let date = date_stamp();
    let snapshot = match &opts.raw {
        Some(path) => load_json::<Snapshot>(path)?,
        None => {
            let members = gather_members(config, opts, source, dir, &date, progress)?;
            progress(Message::NoteMembers(members.len()));
            let harvest = fetch_all_ratings(source, &members, config.delay_step(), running, progress)?;
            let snapshot = Snapshot::new(members, &harvest.ratings, Local::now().to_string());
            let file = dir.join(format!("guild_data_{}.json", date));
            write_json(&file, &snapshot)?;
            progress(Message::NoteFile(file));
            let file = dir.join(format!("member_data_{}.json", date));
            write_json(&file, &harvest.ratings)?;
            progress(Message::NoteFile(file));
            snapshot
        }
    };

    if let Some(path) = &opts.prune {
        let games = ranking::prune(&snapshot.ranked_games, path)?;
        let locale = Locale::load(Path::new(LOCALE_DIR), &opts.lang)?;
        let (file, mut out) = create_report(dir, "pruned", &date, opts.style)?;
        report::write_preamble(&mut out, opts.style)?;
        report::render_table(&mut out, &locale, opts.style, "selection", locale.tr("Selection"), &games)?;
        out.flush()?;
        return Ok(file);
    }

    let mut cache = db.load_cache()?;
    let lists = build_lists(&snapshot, source, &mut cache, config, opts.top, running, progress);
    // keep whatever was looked up, even when ranking failed
    db.save_cache(&cache)?;
    let file = dir.join(format!("lists_{}.json", date));
    write_json(&file, &lists?)?;
    Ok(file)
}

fn gather_members<S: RatingsSource + ?Sized>(config: &Config, opts: &GenerateOptions, source: &S,
        dir: &Path, date: &str, progress: &mut impl FnMut(Message)) -> Result<Vec<Member>, Error> {
    let guild = match &opts.guild {
        Some(g) => guild_id(g)?,
        None => config.guild
    };
    let members = match (&opts.users, opts.concat) {
        (Some(path), false) => return Ok(normalize_members(load_members_from_file(path)?)),
        (Some(path), true) => {
            let mut members = load_members_from_file(path)?;
            members.extend(source.group_members(guild)?);
            normalize_members(members)
        },
        (None, true) => bail!("Concatenation needs a file of users."),
        (None, false) => source.group_members(guild)?
    };
    let file = dir.join(format!("members_{}.txt", date));
    let mut out = BufWriter::new(File::create(&file)
        .with_context(|_| format!("Can't create: {}", file.display()))?);
    for member in members.iter() {
        writeln!(out, "{}", member)?;
    }
    out.flush()?;
    progress(Message::NoteFile(file));
    Ok(members)
}

/// Renders every list of a lists file.
pub fn print_lists(path: &Path, style: Style, lang: &str) -> Result<PathBuf, Error> {
    let lists = load_json::<ListCollection>(path)?;
    let locale = Locale::load(Path::new(LOCALE_DIR), lang)?;
    let (file, mut out) = create_report(Path::new("."), "output", &date_stamp(), style)?;
    report::render_lists(&mut out, &locale, style, &lists.lists)?;
    out.flush()?;
    Ok(file)
}

/// Renders how one category moved between two lists files.
pub fn diff_lists(old: &Path, new: &Path, category: Category, style: Style, lang: &str)
        -> Result<PathBuf, Error> {
    let old_lists = load_json::<ListCollection>(old)?;
    let new_lists = load_json::<ListCollection>(new)?;
    let locale = Locale::load(Path::new(LOCALE_DIR), lang)?;
    let entries = category_diff(&old_lists, &new_lists, category)?;
    let headline = format!("{} {}", locale.tr(category.headline()), locale.tr("Diff"));
    let id = format!("{}-diff", category.key());
    let prefix = format!("{}diff", category.key().replace('-', ""));
    let (file, mut out) = create_report(Path::new("."), &prefix, &date_stamp(), style)?;
    report::render_diff(&mut out, &locale, style, &id, &headline, &entries)?;
    out.flush()?;
    Ok(file)
}

pub fn category_diff(old: &ListCollection, new: &ListCollection, category: Category)
        -> Result<Vec<diff::DiffEntry>, Error> {
    let missing = || format_err!("No `{}` list to compare.", category.key());
    let old = old.get(category).ok_or_else(missing)?;
    let new = new.get(category).ok_or_else(missing)?;
    Ok(diff::diff(&old.games, &new.games))
}

fn date_stamp() -> String {
    Local::now().format("%Y%m%d").to_string()
}

fn create_report(dir: &Path, prefix: &str, date: &str, style: Style)
        -> Result<(PathBuf, BufWriter<File>), Error> {
    let file = dir.join(format!("{}_{}.{}", prefix, date, style.extension()));
    let out = File::create(&file)
        .with_context(|_| format!("Can't create: {}", file.display()))?;
    Ok((file, BufWriter::new(out)))
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let text = fs::read_to_string(path)
        .with_context(|_| format!("Can't open: {}", path.display()))?;
    let value = from_str(&text)
        .with_context(|_| format!("Can't parse: {}", path.display()))?;
    Ok(value)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    fs::write(path, to_string_pretty(value)?)
        .with_context(|_| format!("Can't write: {}", path.display()))?;
    Ok(())
}

/// Wait between requests, growing with every failure.
#[derive(Debug, Clone, Copy)]
pub struct RegulationToken {
    limit: u32,
    delay_step: Duration,
    i: u32,
}

impl RegulationToken {
    pub fn new(limit: u32, delay_step: Duration) -> RegulationToken {
        RegulationToken { limit, delay_step, i: 0 }
    }
    pub fn delay(&self) -> Duration {
        self.delay_step * self.i
    }
    pub fn is_stopped(&self) -> bool {
        self.i >= self.limit
    }
    pub fn harden(&mut self) -> () {
        self.i += 1;
    }
}
