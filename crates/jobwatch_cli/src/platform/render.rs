use std::fmt::Write as _;

use jobwatch_core::{AppViewModel, ArchiveCategory, ArchiveView, JobRowView, JobStatus};

const BAR_WIDTH: usize = 20;

/// Renders the whole dashboard as plain text, one frame per call.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();

    if view.loading {
        out.push_str("Loading job progress...\n");
    } else if view.jobs.is_empty() {
        out.push_str("No jobs.\n");
    } else {
        let _ = writeln!(out, "Jobs ({} running)", view.running_jobs);
        for job in &view.jobs {
            let _ = writeln!(out, "  {}", format_job_row(job));
        }
    }

    if !view.notices.is_empty() {
        out.push('\n');
        for notice in &view.notices {
            let _ = writeln!(out, "! [{}] {}", notice.id, notice.message);
        }
    }

    out.push('\n');
    out.push_str(&tab_strip(view.active_tab));
    out.push('\n');
    out.push_str(&format_archive(&view.archive));
    out
}

fn format_job_row(job: &JobRowView) -> String {
    let progress = match (job.processed, job.total) {
        (Some(processed), Some(total)) => {
            let bar = progress_bar(job.percent.unwrap_or(0));
            format!("{bar} {processed}/{total}")
        }
        (Some(processed), None) => format!("{processed} processed"),
        _ => String::new(),
    };
    let mut row = format!(
        "{:<8} {:<40} {:<9} {progress}",
        job.kind.label(),
        job.job_id,
        status_label(job.status)
    );
    if job.error_count > 0 {
        let _ = write!(row, " ({} doc errors)", job.error_count);
    }
    if let Some(error) = &job.error {
        let _ = write!(row, " - {error}");
    }
    row.trim_end().to_string()
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Running => "running",
        JobStatus::Completed => "done",
        JobStatus::Failed => "FAILED",
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

fn tab_strip(active: ArchiveCategory) -> String {
    ArchiveCategory::ALL
        .iter()
        .map(|category| {
            if *category == active {
                format!("[{category}]")
            } else {
                format!(" {category} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_archive(archive: &ArchiveView) -> String {
    let mut out = String::new();
    for row in &archive.rows {
        let _ = writeln!(out, "  {row}");
    }
    let shown = archive.rows.len();
    let footer = match (archive.loading, archive.has_more, archive.total) {
        (true, _, _) => "loading...".to_string(),
        (false, true, Some(total)) => format!("{shown} of {total} - type 'more' for the next page"),
        (false, true, None) => "type 'more' to load".to_string(),
        (false, false, _) if shown == 0 => "no entries".to_string(),
        (false, false, _) => format!("{shown} entries"),
    };
    let _ = writeln!(out, "  -- {footer}");
    if let Some(error) = &archive.error {
        let _ = writeln!(out, "  !! {error}");
    }
    out
}
