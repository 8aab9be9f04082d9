use crate::diff::DiffEntry;
use crate::locale::Locale;
use crate::ranking::RankedList;
use crate::GameStats;
use failure::Error;
use std::io::Write;

const HEADLINE_LEVEL: &str = "h3";
const STYLE_BLOCK: &str = "<style>\n.text-right {text-align: right; padding: 0 5px;}\n</style>";

const LIST_HEADERS: [&str; 5] = ["No.", "Game", "Ratings", "Mean", "Stdev"];
const DIFF_HEADERS: [&str; 8] = ["No.", "+/-", "Game", "Ratings", "+/-", "Mean", "+/-", "SD"];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Style {
    Html,
    BBCode,
    Bgg
}

impl Style {
    /// Unknown names fall back to html.
    pub fn from_name(name: &str) -> Style {
        match name {
            "bbcode" => Style::BBCode,
            "bgg" => Style::Bgg,
            _ => Style::Html
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Style::Html => "html",
            _ => "txt"
        }
    }
}

/// Document preamble, written once before any table.
pub fn write_preamble<W: Write>(out: &mut W, style: Style) -> Result<(), Error> {
    if style == Style::Html {
        writeln!(out, "{}", STYLE_BLOCK)?;
    }
    Ok(())
}

pub fn render_lists<W: Write>(out: &mut W, locale: &Locale, style: Style,
        lists: &[RankedList]) -> Result<(), Error> {
    write_preamble(out, style)?;
    for list in lists {
        render_table(out, locale, style, list.category.key(),
            locale.tr(list.category.headline()), &list.games)?;
    }
    Ok(())
}

/// One ranked table: rank, name, ratings, mean, stdev.
pub fn render_table<W: Write>(out: &mut W, locale: &Locale, style: Style, id: &str,
        headline: &str, games: &[GameStats]) -> Result<(), Error> {
    let headers: Vec<&str> = LIST_HEADERS.iter().map(|h| locale.tr(h)).collect();
    match style {
        Style::Html => {
            html_head(out, id, headline, &headers)?;
            for (idx, game) in games.iter().enumerate() {
                writeln!(out, "<tr><td class=\"text-right\">{:>2}</td><td>{}</td>\
                    <td class=\"text-right\">{:>2}</td><td class=\"text-right\">{:5.3}</td>\
                    <td class=\"text-right\">{:5.3}</td></tr>",
                    idx + 1, escape(&game.display_name()), game.rating_count,
                    game.mean_rating, game.stdev_rating)?;
            }
            writeln!(out, "</tbody></table>")?;
        },
        Style::BBCode => {
            bbcode_head(out, headline, &headers)?;
            for (idx, game) in games.iter().enumerate() {
                writeln!(out, "[tr][td]{:>2}[/td][td]{}[/td][td]{:>2}[/td]\
                    [td]{:5.3}[/td][td]{:5.3}[/td][/tr]",
                    idx + 1, game.display_name(), game.rating_count,
                    game.mean_rating, game.stdev_rating)?;
            }
            writeln!(out, "[/table]")?;
        },
        Style::Bgg => {
            let names: Vec<String> = games.iter().map(|g| g.display_name()).collect();
            let w = name_width(&names, headers[1]);
            writeln!(out)?;
            writeln!(out, "[b]{}[/b]", headline)?;
            writeln!(out, "[c]")?;
            for (idx, (game, name)) in games.iter().zip(names.iter()).enumerate() {
                writeln!(out, "{:>2} {:<w$} {:>3} {:5.3} {:5.3}",
                    idx + 1, name, game.rating_count, game.mean_rating, game.stdev_rating, w = w)?;
            }
            writeln!(out, "[/c]")?;
        }
    }
    Ok(())
}

/// Ranking with rank, rating count and mean movements.
pub fn render_diff<W: Write>(out: &mut W, locale: &Locale, style: Style, id: &str,
        headline: &str, entries: &[DiffEntry]) -> Result<(), Error> {
    let headers: Vec<&str> = DIFF_HEADERS.iter().map(|h| locale.tr(h)).collect();
    let new_mark = locale.tr("new");
    write_preamble(out, style)?;
    match style {
        Style::Html => {
            html_head(out, id, headline, &headers)?;
            for e in entries {
                let (rank, count, mean) = deltas(e, new_mark);
                writeln!(out, "<tr><td class=\"text-right\">{}</td><td class=\"text-right\">{}</td>\
                    <td>{}</td><td class=\"text-right\">{:4}</td><td class=\"text-right\">{}</td>\
                    <td class=\"text-right\">{:6.3}</td><td class=\"text-right\">{}</td>\
                    <td class=\"text-right\">{:6.3}</td></tr>",
                    e.rank_new + 1, rank, escape(&e.name), e.rating_count_new, count,
                    e.mean_new, mean, e.stdev_new)?;
            }
            writeln!(out, "</tbody></table>")?;
        },
        Style::BBCode => {
            bbcode_head(out, headline, &headers)?;
            for e in entries {
                let (rank, count, mean) = deltas(e, new_mark);
                writeln!(out, "[tr][td]{}[/td][td]{}[/td][td]{}[/td][td]{:4}[/td][td]{}[/td]\
                    [td]{:5.3}[/td][td]{}[/td][td]{:5.3}[/td][/tr]",
                    e.rank_new + 1, rank, e.name, e.rating_count_new, count,
                    e.mean_new, mean, e.stdev_new)?;
            }
            writeln!(out, "[/table]")?;
        },
        Style::Bgg => {
            let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
            let w = name_width(&names, headers[2]);
            let rw = width_of(headers[3]).max(4);
            let mw = width_of(headers[5]).max(5);
            let sw = width_of(headers[7]).max(5);
            writeln!(out, "[b]{}[/b]", headline)?;
            writeln!(out, "[c]")?;
            writeln!(out, "{:<3} {:<5} {:<w$} {:<rw$} {:<6}  {:<mw$} {:<8}  {:<sw$}",
                headers[0], headers[1], headers[2], headers[3], headers[4],
                headers[5], headers[6], headers[7], w = w, rw = rw, mw = mw, sw = sw)?;
            for e in entries {
                let (rank, count, mean) = deltas(e, new_mark);
                writeln!(out, "{:>3} {:<5} {:<w$} {:>rw$} {:<6}  {:>mw$.3} {:<8}  {:>sw$.3}",
                    e.rank_new + 1, rank, e.name, e.rating_count_new, count,
                    e.mean_new, mean, e.stdev_new, w = w, rw = rw, mw = mw, sw = sw)?;
            }
            writeln!(out, "[/c]")?;
        }
    }
    Ok(())
}

/// Rank, count and mean delta cells. A game without history shows `new_mark` and blanks.
fn deltas(e: &DiffEntry, new_mark: &str) -> (String, String, String) {
    match (e.rank_delta, e.rating_count_delta, e.mean_delta) {
        (Some(rank), Some(count), Some(mean)) => (
            format!("{:>+3}", rank),
            format!("{:>+3}", count),
            format!("{:+.3}", mean)
        ),
        _ => (new_mark.to_string(), String::new(), String::new())
    }
}

fn html_head<W: Write>(out: &mut W, id: &str, headline: &str, headers: &[&str]) -> Result<(), Error> {
    writeln!(out, "<{}>{}</{}>", HEADLINE_LEVEL, escape(headline), HEADLINE_LEVEL)?;
    writeln!(out, "<table id={}><thead><tr>", id)?;
    for th in headers {
        writeln!(out, "<th>{}</th>", escape(th))?;
    }
    writeln!(out, "</tr></thead><tbody>")?;
    Ok(())
}

fn bbcode_head<W: Write>(out: &mut W, headline: &str, headers: &[&str]) -> Result<(), Error> {
    writeln!(out, "[{}]{}[/{}]", HEADLINE_LEVEL, headline, HEADLINE_LEVEL)?;
    writeln!(out, "[table][tr]")?;
    for th in headers {
        writeln!(out, "[th]{}[/th]", th)?;
    }
    writeln!(out, "[/tr]")?;
    Ok(())
}

fn width_of(s: &str) -> usize {
    s.chars().count()
}

/// Longest name, or the column header for an empty table.
fn name_width(names: &[String], header: &str) -> usize {
    match names.iter().map(|n| width_of(n)).max() {
        Some(w) => w,
        None => width_of(header)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
