use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::datetime::format_due;
use crate::due::DueNotice;
use crate::task::{Task, TaskList};
use crate::view::ViewContext;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, tasks, now))]
    pub fn write_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[&Task],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Due".to_string(),
            "Pri".to_string(),
            "Title".to_string(),
            "Description".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let done = if task.completed { "[x]" } else { "[ ]" };
            let due = format_due(task.due_date);
            let due = if task.is_due(now) {
                self.paint(&due, "31")
            } else {
                due
            };
            let title = if task.completed {
                self.paint(&task.title, "2")
            } else {
                task.title.clone()
            };

            rows.push(vec![
                self.paint(&task.id, "33"),
                done.to_string(),
                due,
                task.priority.to_string(),
                title,
                task.description.clone().unwrap_or_default(),
            ]);
        }

        write_table(out, headers, rows)
    }

    pub fn write_list_bar<W: Write>(
        &self,
        out: &mut W,
        lists: &[TaskList],
        ctx: &ViewContext,
    ) -> anyhow::Result<()> {
        let cells: Vec<String> = lists
            .iter()
            .map(|list| {
                if list.id == ctx.active_list {
                    self.paint(&format!("*{} ({})", list.name, list.id), "1")
                } else {
                    format!(" {} ({})", list.name, list.id)
                }
            })
            .collect();
        writeln!(out, "{}", cells.join("  "))?;

        let search = if ctx.search.is_empty() {
            "-".to_string()
        } else {
            format!("{:?}", ctx.search)
        };
        writeln!(
            out,
            "sort: {}  completed: {}  search: {}",
            ctx.sort_by,
            if ctx.show_completed { "shown" } else { "hidden" },
            search
        )?;
        Ok(())
    }

    pub fn write_notice<W: Write>(&self, out: &mut W, notice: &DueNotice) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&notice.message(), "1;31"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| format!("{:width$}", header, width = widths[idx]))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            line.push_str(cell);
            line.push_str(&" ".repeat(padding));
            line.push(' ');
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
