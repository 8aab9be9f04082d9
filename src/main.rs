mod cli;

use guild_top::bgg::BggClient;
use guild_top::core::{self as app, GenerateOptions, Message};
use guild_top::db::{self, DbConn};
use guild_top::ranking::Category;
use guild_top::report::Style;
use cli::Cli;
use structopt::StructOpt;
use failure::Error;
use exitfailure::ExitFailure;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::io::Write;
use std::path::Path;
use ctrlc;

fn main() -> Result<(), ExitFailure> {
    let cli = Cli::from_args();
    match cli {
        Cli::New { } => create_structure()?,
        Cli::Generate { guild, users, concat, raw, prune, top, style, lang } => {
            let opts = GenerateOptions {
                guild, users, concat, raw, prune, top,
                style: Style::from_name(&style),
                lang
            };
            generate(opts)?
        },
        Cli::Print { file, style, lang } => {
            let out = app::print_lists(&file, Style::from_name(&style), &lang)?;
            println!("Written {}.", out.display());
        },
        Cli::Diff { old, new, category, style, lang } => {
            let category = Category::from_key(&category)?;
            let out = app::diff_lists(&old, &new, category, Style::from_name(&style), &lang)?;
            println!("Written {}.", out.display());
        }
    }
    Ok(())
}

fn create_structure() -> Result<(), Error> {
    app::create_structure()?;
    println!("Created initial structure files.");
    Ok(())
}

fn note(stdout: &mut StandardStream, color: Color, text: &str) {
    stdout.set_color(ColorSpec::new().set_fg(Some(color))).unwrap();
    writeln!(stdout, "{}", text).unwrap();
    stdout.reset().unwrap();
}

fn generate(opts: GenerateOptions) -> Result<(), Error> {
    // Cancellation token
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    // Bind cancellation token with ctrl+c command
    ctrlc::set_handler(move || {
         r.store(false, Ordering::SeqCst);
    })?;
    // Load config
    let config = app::config()?;
    let client = BggClient::new(config.token.clone());
    let mut db = DbConn::open(Path::new(db::DB_FILE_NAME))?;
    println!("Start generating.");
    // Prettify output a bit
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut failed = Vec::new();
    let mut lookups: u32 = 0;
    let mut num_errs: u32 = 0;
    let file = app::generate(&config, &opts, &client, &mut db, Path::new("."), &running, &mut |m| match m {
        Message::NoteMembers(n) => {
            note(&mut stdout, Color::Green, &format!("Members list loaded: {} members.", n));
        },
        Message::NoteMemberProgress(member, left) => {
            note(&mut stdout, Color::Green, &format!("{} members to process, fetching {}.", left, member));
        },
        Message::NoteRetry(member) => {
            note(&mut stdout, Color::Yellow, &format!("Will ask again for {}.", member));
        },
        Message::NoteFailed(member) => {
            note(&mut stdout, Color::Red, &format!("No data available for {}.", member));
            failed.push(member);
        },
        Message::NoteErr(error) => {
            num_errs += 1;
            note(&mut stdout, Color::Red, &format!("{}", error));
        },
        Message::NoteGameLookup(id) => {
            lookups += 1;
            note(&mut stdout, Color::Green, &format!("About to ask BGG about game {}.", id));
        },
        Message::NoteFile(path) => {
            println!("Written {}.", path.display());
        }
    })?;
    if !failed.is_empty() {
        println!("Ratings retrieved for all users except {}.", failed.join(", "));
    }
    println!("{} errors, {} game requests.", num_errs, lookups);
    println!("Written {}.", file.display());
    println!("Finished.");
    Ok(())
}
