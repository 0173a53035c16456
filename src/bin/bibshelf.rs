use std::error;
use std::path::{Path, PathBuf};

use bibshelf::{
    attach_files_with_progress, filter_papers, sort_by_title, FileIndex, Paper, Parser,
    Preferences, StatusFlags, StatusKind, StatusStore,
};

use clap::Parser as CLIParser;

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Directory holding prefs.json and status.json (defaults to the
    /// platform config directory)
    #[clap(long, global = true)]
    config_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Parse a bibliography, match it against a PDF folder, print the shelf
    Scan {
        /// Filepath to the .bib file to parse
        #[clap(short, long)]
        bib: PathBuf,

        /// Folder containing the PDF files
        #[clap(short, long)]
        pdf_dir: PathBuf,

        /// Keep only papers matching this query
        #[clap(short, long)]
        query: Option<String>,

        /// Print the records as JSON instead of the shelf listing
        #[clap(long)]
        json: bool,
    },

    /// Print the shelf from the remembered bibliography and folder
    List {
        /// Keep only papers matching this query
        #[clap(short, long)]
        query: Option<String>,

        /// Print the records as JSON instead of the shelf listing
        #[clap(long)]
        json: bool,
    },

    /// Toggle one reading-status flag for one paper id
    Status {
        /// Citation key of the paper
        id: String,

        /// Toggle the read flag
        #[clap(long)]
        read: bool,

        /// Toggle the to-read flag
        #[clap(long)]
        to_read: bool,

        /// Toggle the favorite flag
        #[clap(long)]
        favorite: bool,

        /// Clear the flag instead of setting it
        #[clap(long)]
        off: bool,
    },

    /// Forget every stored reading-status flag
    ClearStatus,
}

fn state_dir(settings: &Settings) -> Result<PathBuf, Box<dyn error::Error>> {
    if let Some(dir) = &settings.config_dir {
        return Ok(dir.clone());
    }
    match dirs::config_dir() {
        Some(base) => Ok(base.join("bibshelf")),
        None => Err("no config directory on this platform; pass --config-dir".into()),
    }
}

fn status_marks(flags: &StatusFlags) -> String {
    format!(
        "[{}{}{}]",
        if flags.read { 'R' } else { '-' },
        if flags.to_read { 'T' } else { '-' },
        if flags.favorite { 'F' } else { '-' }
    )
}

fn print_shelf(
    bib: &Path,
    pdf_dir: &Path,
    query: Option<&str>,
    json: bool,
    status: &StatusStore,
) -> Result<(), Box<dyn error::Error>> {
    let folder_token = pdf_dir.display().to_string();
    let mut papers = Parser::from_file(bib)?.papers(&folder_token);
    let records: Vec<Paper> = (&mut papers).collect::<Result<_, _>>()?;
    let stats = papers.skip_stats();

    let index = FileIndex::scan_dir(pdf_dir)?;
    let total_pdfs = index.len();
    let show_progress = !json && !records.is_empty();
    let mut records = attach_files_with_progress(records, &index, |done, total| {
        if show_progress {
            eprint!("\rmatching files {done}/{total}");
        }
    });
    if show_progress {
        eprintln!();
    }
    sort_by_title(&mut records);
    let visible = filter_papers(&records, query.unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string(&visible)?);
        return Ok(());
    }

    for paper in &visible {
        let marks = status_marks(&status.flags(&paper.id));
        let file_mark = if paper.file_name.is_empty() { ' ' } else { '*' };
        let year = if paper.year == 0 {
            "----".to_owned()
        } else {
            paper.year.to_string()
        };
        let authors = if paper.authors.is_empty() {
            "unknown authors".to_owned()
        } else {
            paper.authors.join(", ")
        };
        println!("{marks}{file_mark} {year:>4}  {}  ({authors})", paper.title);
    }
    println!(
        "{} of {} papers shown, {} matched against {} PDFs, {} entries skipped",
        visible.len(),
        records.len(),
        records.iter().filter(|p| !p.file_name.is_empty()).count(),
        total_pdfs,
        stats.skipped(),
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn error::Error>> {
    env_logger::init();
    let settings = Settings::parse();
    let dir = state_dir(&settings)?;

    match &settings.command {
        Command::Scan {
            bib,
            pdf_dir,
            query,
            json,
        } => {
            let status = StatusStore::load(dir.join("status.json"))?;
            print_shelf(bib, pdf_dir, query.as_deref(), *json, &status)?;
            let mut prefs = Preferences::load(dir.join("prefs.json"))?;
            prefs.bib_file = Some(bib.clone());
            prefs.pdf_folder = Some(pdf_dir.clone());
            prefs.save(dir.join("prefs.json"))?;
        }
        Command::List { query, json } => {
            let prefs = Preferences::load(dir.join("prefs.json"))?;
            let (bib, pdf_dir) = match (&prefs.bib_file, &prefs.pdf_folder) {
                (Some(bib), Some(pdf_dir)) => (bib, pdf_dir),
                _ => {
                    return Err(
                        "no remembered shelf; run `bibshelf scan --bib ... --pdf-dir ...` first"
                            .into(),
                    )
                }
            };
            let status = StatusStore::load(dir.join("status.json"))?;
            print_shelf(bib, pdf_dir, query.as_deref(), *json, &status)?;
        }
        Command::Status {
            id,
            read,
            to_read,
            favorite,
            off,
        } => {
            let kind = match (*read, *to_read, *favorite) {
                (true, false, false) => StatusKind::Read,
                (false, true, false) => StatusKind::ToRead,
                (false, false, true) => StatusKind::Favorite,
                _ => return Err("pass exactly one of --read, --to-read, --favorite".into()),
            };
            let mut store = StatusStore::load(dir.join("status.json"))?;
            let flags = store.toggle(id, kind, !*off)?;
            println!("{id}: {}", status_marks(&flags));
        }
        Command::ClearStatus => {
            let mut store = StatusStore::load(dir.join("status.json"))?;
            store.clear_all()?;
            println!("cleared all reading-status flags");
        }
    }

    Ok(())
}
