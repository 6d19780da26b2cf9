mod args;
mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, Utc};
use notemark::{render, RenderMode};
use notestore::{
    backup, restore, DataPath, DataPathType, DirectoryRemote, Error, Folder, FolderId, Note,
    NoteFilter, NoteId, NoteStore, Result, Session, SettingsHandler,
};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, CliOptions, Command, ListTarget, USAGE};
use crate::display::to_ansi;

/// Characters of a note id shown in listings; any unique prefix resolves.
const SHORT_ID_LEN: usize = 8;

fn setup_logging(path: &DataPath) -> Option<WorkerGuard> {
    use tracing_appender::{
        non_blocking,
        rolling::{RollingFileAppender, Rotation},
    };
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("notes-{}", env!("CARGO_PKG_VERSION")))
        .filename_suffix("log")
        .build(path.path(DataPathType::Log));

    let file_appender = match file_appender {
        Ok(appender) => appender,
        Err(err) => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            warn!("file logging disabled: {err}");
            return None;
        }
    };

    let (non_blocking_writer, guard) = non_blocking(file_appender);

    // command output owns stdout, diagnostics go to stderr
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notestore=info,notemark=info,notes=info")),
        );

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Some(guard)
}

fn short_id(id: NoteId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// Resolve a full note id or a unique prefix of one.
fn resolve_note(store: &NoteStore, needle: &str) -> Result<NoteId> {
    if let Ok(id) = needle.parse::<NoteId>() {
        return Ok(id);
    }

    let mut matches = store
        .notes()
        .map(|n| n.id)
        .filter(|id| id.to_string().starts_with(needle));

    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(Error::Generic(format!("no note matches '{needle}'"))),
        (Some(_), Some(_)) => Err(Error::Generic(format!("'{needle}' matches several notes"))),
    }
}

fn resolve_folder(store: &NoteStore, name: &str) -> Result<FolderId> {
    store
        .folder_by_name(name)
        .map(|f| f.id)
        .ok_or_else(|| Error::Generic(format!("no folder named '{name}'")))
}

fn print_listing(store: &NoteStore, notes: &[&Note], preview_chars: usize, color: bool) {
    if notes.is_empty() {
        println!("(no notes)");
        return;
    }

    for note in notes {
        let star = if note.favorite { "*" } else { " " };
        let updated = note.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!("{} {star} {updated}  {}", short_id(note.id), note.display_title());

        if let Ok(preview) = store.preview(note.id, preview_chars) {
            if !preview.is_empty() {
                for line in to_ansi(&preview, color).lines() {
                    println!("      {line}");
                }
            }
        }
    }
}

fn print_folders(store: &NoteStore, folders: &[&Folder]) {
    if folders.is_empty() {
        println!("(no folders)");
        return;
    }

    for folder in folders {
        let count = store.list(NoteFilter::Folder(folder.id), Default::default()).len();
        println!("{} ({count})", folder.name);
    }
}

fn session_for(args: &Args, settings: &SettingsHandler) -> Session {
    if args.options.contains(CliOptions::Guest) {
        Session::Guest
    } else if let Some(user) = &args.user {
        Session::account(user.as_str())
    } else {
        settings.session()
    }
}

fn run(path: &DataPath, args: Args) -> Result<()> {
    info!("using data path {:?}", path.base());
    let mut settings = SettingsHandler::new(path).load();
    let session = session_for(&args, &settings);
    if session.is_guest() {
        info!("running as guest, backup disabled");
    }
    let color = args.options.contains(CliOptions::Color);
    let prefs = settings.settings();

    let mut store = NoteStore::load(path)?;
    let purged = store.purge_expired(Utc::now(), prefs.trash_retention());
    if purged > 0 {
        info!("purged {purged} expired notes from trash");
    }

    match args.command {
        Command::Help => println!("{USAGE}"),

        Command::New { title, content } => {
            let id = store.create_note(&title, &content, None)?;
            println!("{}", short_id(id));
        }

        Command::Edit { id, content } => {
            let id = resolve_note(&store, &id)?;
            let title = store.note(id)?.title.clone();
            store.update_note(id, title, content)?;
        }

        Command::List(target) => {
            let filter = match target {
                ListTarget::All => NoteFilter::All,
                ListTarget::Favorites => NoteFilter::Favorites,
                ListTarget::Unfiled => NoteFilter::Unfiled,
                ListTarget::Trash => NoteFilter::Trash,
                ListTarget::Folder(name) => NoteFilter::Folder(resolve_folder(&store, &name)?),
            };
            let notes = store.list(filter, prefs.sort_order());
            print_listing(&store, &notes, settings.preview_chars(), color);
        }

        Command::Show(id) => {
            let note = store.note(resolve_note(&store, &id)?)?;
            let mode = if args.options.contains(CliOptions::Preview) {
                RenderMode::Preview
            } else {
                RenderMode::Full
            };
            if !note.title.is_empty() {
                println!("{}\n", note.title);
            }
            println!("{}", to_ansi(&render(&note.content, mode), color));
        }

        Command::Strip(id) => {
            let note = store.note(resolve_note(&store, &id)?)?;
            println!("{}", notemark::strip(&note.content));
        }

        Command::Favorite { id, favorite } => {
            let id = resolve_note(&store, &id)?;
            store.set_favorite(id, favorite)?;
        }

        Command::Trash(id) => {
            let id = resolve_note(&store, &id)?;
            store.trash(id)?;
        }

        Command::Restore(id) => {
            let id = resolve_note(&store, &id)?;
            store.restore(id)?;
        }

        Command::Delete(id) => {
            let id = resolve_note(&store, &id)?;
            let note = store.delete_forever(id)?;
            println!("deleted '{}'", note.display_title());
        }

        Command::EmptyTrash => {
            let removed = store.empty_trash();
            println!("removed {removed} notes");
        }

        Command::Folders => print_folders(&store, &store.folders()),

        Command::NewFolder(name) => {
            store.create_folder(&name)?;
        }

        Command::Move { id, folder } => {
            let id = resolve_note(&store, &id)?;
            let folder = match folder {
                Some(name) => Some(resolve_folder(&store, &name)?),
                None => None,
            };
            store.move_to_folder(id, folder)?;
        }

        Command::Search(query) => {
            let notes = store.search(&query);
            print_listing(&store, &notes, settings.preview_chars(), color);
        }

        Command::Backup => {
            let mut remote = DirectoryRemote::from_data_path(path);
            let report = backup(&store, &mut remote, &session)?;
            println!(
                "backed up {} notes and {} folders",
                report.notes, report.folders
            );
        }

        Command::Pull => {
            let remote = DirectoryRemote::from_data_path(path);
            let report = restore(&mut store, &remote, &session)?;
            println!(
                "{} added, {} updated, {} unchanged",
                report.added, report.updated, report.skipped
            );
        }

        Command::Login(user) => {
            settings.sign_in(user.as_str())?;
            println!("signed in as {user}");
        }

        Command::Logout => {
            settings.sign_out()?;
            println!("signed out");
        }
    }

    store.save()
}

fn data_path(args: &Args) -> DataPath {
    let base = args
        .datapath
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(DataPath::default_base_or_cwd);
    DataPath::new(base)
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&raw);

    let path = data_path(&args);
    let _guard = setup_logging(&path);

    for arg in &unrecognized {
        warn!("unrecognized argument: {arg}");
    }
    if !unrecognized.is_empty() && args.command == Command::Help {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    match run(&path, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("notes: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_note_by_prefix() {
        let mut store = NoteStore::in_memory();
        let a = store.create_note("a", "", None).unwrap();
        let b = store.create_note("b", "", None).unwrap();

        assert_eq!(resolve_note(&store, &a.to_string()).unwrap(), a);
        assert_eq!(resolve_note(&store, &short_id(b)).unwrap(), b);
        assert!(resolve_note(&store, "zzzz").is_err());
        // every id matches the empty prefix
        assert!(resolve_note(&store, "").is_err());
    }

    #[test]
    fn test_guest_flag_overrides_account() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = DataPath::new(tmp.path());
        let mut settings = SettingsHandler::new(&path).load();
        settings.sign_in("alice").unwrap();

        let raw: Vec<String> = vec!["--guest".into(), "backup".into()];
        let (args, _) = Args::parse(&raw);
        let session = session_for(&args, &settings);
        assert_eq!(session, Session::Guest);
        assert!(session.is_guest());

        let raw: Vec<String> = vec!["backup".into()];
        let (args, _) = Args::parse(&raw);
        let session = session_for(&args, &settings);
        assert_eq!(session, Session::account("alice"));
        assert!(!session.is_guest());
    }

    #[test]
    fn test_guest_backup_fails_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = DataPath::new(tmp.path());

        let raw: Vec<String> = vec!["--guest".into(), "backup".into()];
        let (args, _) = Args::parse(&raw);
        assert!(matches!(run(&path, args), Err(Error::GuestSession)));
        assert!(!path.path(DataPathType::Backup).exists());
    }

    #[test]
    fn test_run_creates_and_persists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = DataPath::new(tmp.path());

        let raw: Vec<String> = ["new", "Groceries", "*", "milk"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (args, _) = Args::parse(&raw);
        run(&path, args).unwrap();

        let store = NoteStore::load(&path).unwrap();
        let notes: Vec<&Note> = store.notes().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].content, "* milk");
    }
}
