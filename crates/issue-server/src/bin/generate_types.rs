//! Writes TypeScript declarations for the API types and the issue route
//! table. Prints to stdout unless an output path is given.

use std::{env, fs};

use anyhow::Context;
use api_types::{
    Activity, ActivityType, Comment, CommentEntity, CommentList, CommentType, Extra, IssueUrl,
    Meta, Project, Reference, Severity, Target, TargetIssue, TargetIssueEntity, TargetIssueList,
    TargetSummary, User,
};
use ts_rs::TS;

fn declarations() -> Vec<String> {
    vec![
        Severity::decl(),
        IssueUrl::decl(),
        Extra::decl(),
        Reference::decl(),
        ActivityType::decl(),
        Activity::decl(),
        TargetIssue::decl(),
        TargetIssueEntity::decl(),
        Meta::decl(),
        TargetIssueList::decl(),
        CommentType::decl(),
        Comment::decl(),
        CommentEntity::decl(),
        CommentList::decl(),
        TargetSummary::decl(),
        Target::decl(),
        Project::decl(),
        User::decl(),
    ]
}

fn main() -> anyhow::Result<()> {
    let mut output = String::from("// Generated by issue-server-generate-types. Do not edit.\n\n");
    for decl in declarations() {
        output.push_str("export ");
        output.push_str(&decl);
        output.push_str("\n\n");
    }

    let routes = serde_json::to_string_pretty(issue_server::routes::issues::service().docs())
        .context("failed to serialize route table")?;
    output.push_str(&format!("export const ISSUE_ROUTES = {routes} as const;\n"));

    match env::args().nth(1) {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("failed to write {path}"))?;
            eprintln!("wrote {path}");
        }
        None => print!("{output}"),
    }
    Ok(())
}
