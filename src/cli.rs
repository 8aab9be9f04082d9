use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
/// Ranks the games of a bgg guild
/// and tracks how the ranking moves.
pub enum Cli {
    #[structopt(name = "new")]
    /// Creates new .config and .db files.
    New { },
    #[structopt(name = "generate")]
    /// Pulls ratings of every guild member and
    /// writes ranked lists. Takes list sizes from config file.
    Generate {
        #[structopt(short = "g", long = "guild")]
        /// Guild id or one of [pc, hc, uk]. Defaults to the config.
        guild: Option<String>,
        #[structopt(short = "u", long = "users", parse(from_os_str))]
        /// Uses provided list of users instead of pulling a new one.
        users: Option<PathBuf>,
        #[structopt(short = "c", long = "concat")]
        /// Concatenates the list of users and guild members.
        concat: bool,
        #[structopt(short = "r", long = "raw", parse(from_os_str))]
        /// Regenerates lists out of a guild data file, no ratings are pulled.
        raw: Option<PathBuf>,
        #[structopt(short = "p", long = "prune", parse(from_os_str))]
        /// Prunes data to the games of a `id,name` csv file.
        prune: Option<PathBuf>,
        #[structopt(short = "n")]
        /// Size of the top list.
        top: Option<usize>,
        #[structopt(long = "style", default_value = "html")]
        /// Output format of pruned lists: bbcode|bgg|html.
        style: String,
        #[structopt(long = "lang", default_value = "en")]
        /// Language for headlines and table headers.
        lang: String
    },
    #[structopt(name = "print")]
    /// Prints a lists file in a pretty format.
    Print {
        #[structopt(parse(from_os_str))]
        /// Lists file to format.
        file: PathBuf,
        #[structopt(long = "style", default_value = "html")]
        /// Output format: bbcode|bgg|html.
        style: String,
        #[structopt(long = "lang", default_value = "en")]
        /// Language for headlines and table headers.
        lang: String
    },
    #[structopt(name = "diff")]
    /// Prints a list with its moves since an older lists file.
    Diff {
        #[structopt(parse(from_os_str))]
        /// Old lists file.
        old: PathBuf,
        #[structopt(parse(from_os_str))]
        /// New lists file.
        new: PathBuf,
        #[structopt(long = "category", default_value = "top")]
        /// top|bottom|most-variable|least-variable|most-rated|sleepers
        category: String,
        #[structopt(long = "style", default_value = "html")]
        /// Output format: bbcode|bgg|html.
        style: String,
        #[structopt(long = "lang", default_value = "en")]
        /// Language for headlines and table headers.
        lang: String
    }
}
