//! Subcommand handlers. Output goes to stdout; diagnostics go through `tracing`.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use prep_core::metrics::{ProgressSummary, SYLLABUS_SUBJECTS, important_chapter_ids};
use prep_core::model::{
    ChapterId, ChapterProgress, ChapterProgressPatch, CredentialsDraft, Understanding,
    UserIdentity,
};
use services::{AppServices, ResetOutcome};

use crate::cli::{Command, CredentialArgs, MarkArgs};
use crate::CliError;

pub async fn execute(command: Command, app: &AppServices) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Status { subjects } => {
            let summary = if subjects.is_empty() {
                app.progress().summary(&SYLLABUS_SUBJECTS)
            } else {
                app.progress().summary(subjects.as_slice())
            };
            print_summary(&summary);
            let today = app.study_log().today_total_secs().await?;
            println!("Studied today:  {}", format_duration(today));
        }
        Command::Show { chapter } => {
            let progress = app.progress().chapter(&chapter);
            print_chapter(&chapter, &progress);
        }
        Command::Mark(args) => {
            let (chapter, patch) = mark_patch(args)?;
            let stored = app.progress().update(chapter.clone(), &patch).await?;
            print_chapter(&chapter, &stored);
        }
        Command::Subtopic {
            chapter,
            index,
            done,
        } => {
            let stored = app
                .progress()
                .set_subtopic(chapter.clone(), index, done)
                .await?;
            print_chapter(&chapter, &stored);
        }
        Command::Important => {
            let important = important_chapter_ids(&app.progress().snapshot());
            if important.is_empty() {
                println!("No chapters marked important.");
            }
            for chapter in important {
                println!("{chapter}");
            }
        }
        Command::Export { path } => {
            let written = app.progress().export_to_file(&path)?;
            println!("Exported progress to {}", written.display());
        }
        Command::Import { path } => {
            let chapters = app.progress().import_file(&path).await?;
            println!("Imported {chapters} chapters.");
        }
        Command::Reset { yes } => {
            let outcome = if yes {
                app.progress().reset(&|_: &str| true).await?
            } else {
                app.progress().reset(&confirm_on_stdin).await?
            };
            match outcome {
                ResetOutcome::Cleared => println!("Progress reset."),
                ResetOutcome::Declined => println!("Reset cancelled."),
            }
        }
        Command::SignIn(credentials) => {
            let identity = app.auth().sign_in(credentials_draft(credentials)).await?;
            print_identity(&identity);
        }
        Command::SignUp { credentials, name } => {
            let draft = credentials_draft(credentials).with_name(name);
            let identity = app.auth().sign_up(draft).await?;
            print_identity(&identity);
        }
        Command::SignOut => {
            app.auth().sign_out().await?;
            println!("Signed out.");
        }
        Command::Whoami => match app.auth().current_user().await? {
            Some(identity) => print_identity(&identity),
            None => println!("Not signed in."),
        },
        Command::LogSession { subject, minutes } => {
            let id = app
                .study_log()
                .record(&subject, Duration::from_secs(u64::from(minutes) * 60))
                .await?;
            println!("Logged session {id}: {subject}, {minutes} min.");
        }
        Command::Sessions { limit, week } => {
            let study_log = app.study_log();
            for session in study_log.recent(limit).await? {
                println!(
                    "{}  {:<12} {}",
                    session.session_date(),
                    session.subject(),
                    format_duration(u64::from(session.duration_secs()))
                );
            }
            println!(
                "Studied today: {}",
                format_duration(study_log.today_total_secs().await?)
            );
            if week {
                for day in study_log.weekly_breakdown().await? {
                    let subjects: Vec<String> = day
                        .per_subject
                        .iter()
                        .map(|(subject, secs)| format!("{subject} {}", format_duration(*secs)))
                        .collect();
                    println!("{}  {}", day.date, subjects.join(", "));
                }
            }
        }
    }
    Ok(())
}

fn mark_patch(args: MarkArgs) -> Result<(ChapterId, ChapterProgressPatch), Box<dyn Error>> {
    let mut patch = ChapterProgressPatch::new();
    if let Some(value) = args.completed {
        patch = patch.completed(value);
    }
    if let Some(value) = args.revised {
        patch = patch.revised(value);
    }
    if let Some(level) = args.understanding {
        patch = patch.understanding(Understanding::new(level)?);
    }
    if let Some(value) = args.important {
        patch = patch.important(value);
    }
    if patch.is_empty() {
        return Err(CliError::NothingToUpdate.into());
    }
    Ok((args.chapter, patch))
}

fn credentials_draft(args: CredentialArgs) -> CredentialsDraft {
    CredentialsDraft::new(args.email, args.password)
}

fn confirm_on_stdin(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_summary(summary: &ProgressSummary) {
    println!(
        "Overall:        {:.1}% ({}/{} chapters)",
        summary.overall_percent, summary.completed_chapters, summary.total_chapters
    );
    for subject in &summary.subjects {
        println!("  {:<12} {:.1}%", subject.subject, subject.percent);
    }
    println!("Important:      {}", summary.important_chapters.len());
}

fn print_chapter(chapter: &ChapterId, progress: &ChapterProgress) {
    println!("{chapter}");
    println!("  completed:     {}", progress.completed);
    println!("  revised:       {}", progress.revised);
    println!(
        "  understanding: {} ({})",
        progress.understanding.value(),
        progress.understanding.label()
    );
    println!("  important:     {}", progress.important);
    if !progress.subtopics.is_empty() {
        println!(
            "  subtopics:     {}/{} done",
            progress.completed_subtopics(),
            progress.subtopics.len()
        );
    }
}

fn print_identity(identity: &UserIdentity) {
    let mode = if identity.is_local() { "local" } else { "remote" };
    println!("{} <{}> [{mode}]", identity.name, identity.email);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter() -> ChapterId {
        "Physics-11-1".parse().unwrap()
    }

    #[test]
    fn mark_without_fields_is_rejected() {
        let args = MarkArgs {
            chapter: chapter(),
            completed: None,
            revised: None,
            understanding: None,
            important: None,
        };
        assert!(mark_patch(args).is_err());
    }

    #[test]
    fn mark_builds_partial_patch() {
        let args = MarkArgs {
            chapter: chapter(),
            completed: Some(true),
            revised: None,
            understanding: Some(3),
            important: None,
        };
        let (id, patch) = mark_patch(args).unwrap();
        assert_eq!(id, chapter());
        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.revised, None);
        assert_eq!(patch.understanding, Some(Understanding::new(3).unwrap()));
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(25 * 60), "25m");
        assert_eq!(format_duration(3600 + 5 * 60), "1h 05m");
    }
}
