use std::collections::BTreeSet;

use bitflags::bitflags;
use tracing::error;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CliOptions: u32 {
        /// Ignore any signed-in account for this run
        const Guest = 1 << 0;

        /// Emit ANSI styling
        const Color = 1 << 1;

        /// Render `show` in preview mode
        const Preview = 1 << 2;
    }
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions::Color
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    All,
    Favorites,
    Unfiled,
    Trash,
    Folder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New { title: String, content: String },
    Edit { id: String, content: String },
    List(ListTarget),
    Show(String),
    Strip(String),
    Favorite { id: String, favorite: bool },
    Trash(String),
    Restore(String),
    Delete(String),
    EmptyTrash,
    Folders,
    NewFolder(String),
    Move { id: String, folder: Option<String> },
    Search(String),
    Backup,
    Pull,
    Login(String),
    Logout,
    Help,
}

impl Command {
    /// Parse a command and its operands. `None` means the words don't form a command.
    pub fn parse(words: &[String]) -> Option<Self> {
        let (name, rest) = words.split_first()?;
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        let cmd = match (name.as_str(), rest.as_slice()) {
            ("new", [title]) => Command::New {
                title: title.to_string(),
                content: String::new(),
            },
            ("new", [title, content @ ..]) => Command::New {
                title: title.to_string(),
                content: content.join(" "),
            },
            ("edit", [id, content @ ..]) if !content.is_empty() => Command::Edit {
                id: id.to_string(),
                content: content.join(" "),
            },
            ("list" | "ls", []) | ("list" | "ls", ["all"]) => Command::List(ListTarget::All),
            ("list" | "ls", ["favorites"]) => Command::List(ListTarget::Favorites),
            ("list" | "ls", ["unfiled"]) => Command::List(ListTarget::Unfiled),
            ("list" | "ls", ["trash"]) => Command::List(ListTarget::Trash),
            ("list" | "ls", ["folder", name @ ..]) if !name.is_empty() => {
                Command::List(ListTarget::Folder(name.join(" ")))
            }
            ("show", [id]) => Command::Show(id.to_string()),
            ("strip", [id]) => Command::Strip(id.to_string()),
            ("fav", [id]) => Command::Favorite {
                id: id.to_string(),
                favorite: true,
            },
            ("unfav", [id]) => Command::Favorite {
                id: id.to_string(),
                favorite: false,
            },
            ("trash", [id]) => Command::Trash(id.to_string()),
            ("restore", [id]) => Command::Restore(id.to_string()),
            ("delete", [id]) => Command::Delete(id.to_string()),
            ("empty-trash", []) => Command::EmptyTrash,
            ("folders", []) => Command::Folders,
            ("folder", name) if !name.is_empty() => Command::NewFolder(name.join(" ")),
            ("move", [id]) => Command::Move {
                id: id.to_string(),
                folder: None,
            },
            ("move", [id, folder @ ..]) => Command::Move {
                id: id.to_string(),
                folder: Some(folder.join(" ")),
            },
            ("search", query) if !query.is_empty() => Command::Search(query.join(" ")),
            ("backup", []) => Command::Backup,
            ("pull", []) => Command::Pull,
            ("login", [user]) => Command::Login(user.to_string()),
            ("logout", []) => Command::Logout,
            ("help", _) => Command::Help,
            _ => return None,
        };

        Some(cmd)
    }
}

pub struct Args {
    pub datapath: Option<String>,
    pub user: Option<String>,
    pub options: CliOptions,
    pub command: Command,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args {
            datapath: None,
            user: None,
            options: CliOptions::default(),
            command: Command::Help,
        };
        let mut words = Vec::new();

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--" {
                words.extend(args[i + 1..].iter().cloned());
                break;
            } else if arg == "--guest" {
                res.options.set(CliOptions::Guest, true);
            } else if arg == "--no-color" {
                res.options.set(CliOptions::Color, false);
            } else if arg == "--preview" {
                res.options.set(CliOptions::Preview, true);
            } else if arg == "--datapath" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("datapath argument missing?");
                    continue;
                };
                res.datapath = Some(path.clone());
            } else if arg == "--user" {
                i += 1;
                let Some(user) = args.get(i) else {
                    error!("user argument missing?");
                    continue;
                };
                res.user = Some(user.clone());
            } else if arg.starts_with("--") {
                unrecognized_args.insert(arg.clone());
            } else {
                words.push(arg.clone());
            }

            i += 1;
        }

        if !words.is_empty() {
            match Command::parse(&words) {
                Some(command) => res.command = command,
                None => {
                    unrecognized_args.insert(words.join(" "));
                }
            }
        }

        (res, unrecognized_args)
    }
}

pub const USAGE: &str = "\
usage: notes [--datapath DIR] [--user ID | --guest] [--no-color] [--preview] <command>

commands:
  new <title> [content...]      create a note
  edit <id> <content...>        replace a note's content
  list [all|favorites|unfiled|trash|folder <name>]
  show <id>                     render a note
  strip <id>                    print a note without markup
  fav <id> | unfav <id>
  trash <id> | restore <id> | delete <id> | empty-trash
  folders | folder <name> | move <id> [folder]
  search <query...>
  backup | pull                 sync with the backup store
  login <user> | logout";
