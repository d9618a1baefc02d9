//! Query command implementation.

use crate::cli::args::QueryArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::note::{Note, NoteKind};
use crate::query::{filter_notes, group_by, parse_expression, sort_notes, Direction, Filters};
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NoteSummary {
    pub path: String,
    pub name: String,
    pub address: String,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            path: note.rel_path.clone(),
            name: note.name.clone(),
            address: note.web_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub notes: Vec<NoteSummary>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<NoteSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupSummary>>,
}

pub fn run(config: &BuildConfig, args: &QueryArgs, output: &Output) -> Result<()> {
    // Filters treat a bad expression as false; on the command line it is an error
    for expr in args.exprs.iter().chain(&args.any).chain(&args.none) {
        parse_expression(expr)?;
    }

    let vault = Vault::scan(config)?;
    let filters = Filters {
        and: args.exprs.clone(),
        or: args.any.clone(),
        not: args.none.clone(),
    };
    let markdown = vault.notes.iter().filter(|n| n.kind == NoteKind::Markdown);
    let mut notes = filter_notes(markdown, &filters);

    let direction = if args.desc {
        Direction::Desc
    } else {
        Direction::Asc
    };
    if let Some(ref field) = args.sort {
        sort_notes(&mut notes, field, direction);
    }

    let response = match args.group_by {
        Some(ref field) => QueryResponse {
            count: notes.len(),
            notes: None,
            groups: Some(
                group_by(&notes, field, direction)
                    .into_iter()
                    .map(|g| GroupSummary {
                        key: g.key,
                        notes: g.notes.into_iter().map(NoteSummary::from).collect(),
                    })
                    .collect(),
            ),
        },
        None => QueryResponse {
            count: notes.len(),
            notes: Some(notes.into_iter().map(NoteSummary::from).collect()),
            groups: None,
        },
    };
    output.print(&response)
}
