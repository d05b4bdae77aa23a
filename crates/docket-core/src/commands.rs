mod modifiers;

use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

pub use modifiers::split_words;

use crate::due::DueNotice;
use crate::error::{InputError, StoreError};
use crate::input::{parse_on_off, validate_list_name};
use crate::reminder::Clock;
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::{Priority, Task};
use crate::view::{SortKey, ViewContext, derive_view};

const HELP: &str = "\
commands (unique prefixes work):
  add <title...> [due:X] [pri:X] [list:X] [desc:X]
  edit <id> [title:X] [due:X] [pri:X] [list:X] [desc:X]
  done <id>               toggle completion
  delete <id>
  newlist <name...>
  lists
  use <list id or name>
  search [term...]        no term clears the search
  sort <due|priority>
  completed <on|off>
  show
  due                     check for due tasks now
  export                  current view as JSON
  help
  quit | exit";

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "edit",
        "done",
        "delete",
        "newlist",
        "lists",
        "use",
        "search",
        "sort",
        "completed",
        "show",
        "due",
        "export",
        "help",
        "quit",
        "exit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Store plus the transient view state of one interactive session.
pub struct Session {
    store: TaskStore,
    ctx: ViewContext,
    renderer: Renderer,
    default_priority: Priority,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(
        store: TaskStore,
        ctx: ViewContext,
        renderer: Renderer,
        default_priority: Priority,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ctx,
            renderer,
            default_priority,
            clock,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The derived view for the current state.
    pub fn view(&self) -> Vec<Task> {
        let tasks = self.store.tasks();
        derive_view(&tasks, &self.ctx).into_iter().cloned().collect()
    }

    #[instrument(skip(self, out))]
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Outcome> {
        let words = split_words(line)?;
        let Some((head, args)) = words.split_first() else {
            return Ok(Outcome::Continue);
        };

        let known = known_command_names();
        let command = expand_command_abbrev(head, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {head} (try help)"))?;
        let now = self.clock.now();
        debug!(command, ?args, "dispatching command");

        match command {
            "add" => self.cmd_add(out, args, now)?,
            "edit" => self.cmd_edit(out, args, now)?,
            "done" => self.cmd_done(out, args, now)?,
            "delete" => self.cmd_delete(out, args, now)?,
            "newlist" => self.cmd_newlist(out, args)?,
            "lists" => self.renderer.write_list_bar(out, &self.store.lists(), &self.ctx)?,
            "use" => self.cmd_use(out, args, now)?,
            "search" => {
                self.ctx.search = args.join(" ");
                self.write_view(out, now)?;
            }
            "sort" => {
                let raw = single_arg("sort", args)?;
                self.ctx.sort_by = raw.parse::<SortKey>()?;
                self.write_view(out, now)?;
            }
            "completed" => {
                let raw = single_arg("completed", args)?;
                self.ctx.show_completed = parse_on_off(raw)?;
                self.write_view(out, now)?;
            }
            "show" => self.write_view(out, now)?,
            "due" => match DueNotice::evaluate(&self.store.tasks(), now) {
                Some(notice) => self.renderer.write_notice(out, &notice)?,
                None => writeln!(out, "No tasks due.")?,
            },
            "export" => {
                let tasks = self.store.tasks();
                let view = derive_view(&tasks, &self.ctx);
                writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
            }
            "help" => writeln!(out, "{HELP}")?,
            "quit" | "exit" => return Ok(Outcome::Quit),
            other => return Err(anyhow!("unhandled command: {other}")),
        }

        Ok(Outcome::Continue)
    }

    fn cmd_add<W: Write>(
        &mut self,
        out: &mut W,
        args: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let input = modifiers::parse_task_input(args)?;
        let draft = input.into_draft(&self.store.lists(), now, self.default_priority)?;
        let task = self.store.add_task(draft);
        writeln!(out, "Created task {}.", task.id)?;
        self.write_view(out, now)
    }

    fn cmd_edit<W: Write>(
        &mut self,
        out: &mut W,
        args: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some((id, rest)) = args.split_first() else {
            return Err(anyhow!("edit: task id is required"));
        };
        let patch = modifiers::parse_patch(rest)?;
        if patch.is_empty() {
            return Err(anyhow!("edit: nothing to change"));
        }

        let task = self
            .store
            .find_task(id)
            .ok_or_else(|| StoreError::task_not_found(id))?;
        let next = patch.apply(&task, &self.store.lists(), now)?;
        self.store.update_task(next)?;
        writeln!(out, "Updated task {id}.")?;
        self.write_view(out, now)
    }

    fn cmd_done<W: Write>(
        &mut self,
        out: &mut W,
        args: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let id = single_arg("done", args)?;
        let completed = self.store.toggle_complete(id)?;
        let state = if completed { "completed" } else { "reopened" };
        writeln!(out, "Task {id} {state}.")?;
        self.write_view(out, now)
    }

    fn cmd_delete<W: Write>(
        &mut self,
        out: &mut W,
        args: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let id = single_arg("delete", args)?;
        let removed = self.store.delete_task(id)?;
        writeln!(out, "Deleted task {} ({}).", removed.id, removed.title)?;
        self.write_view(out, now)
    }

    fn cmd_newlist<W: Write>(&mut self, out: &mut W, args: &[String]) -> anyhow::Result<()> {
        let name = validate_list_name(&args.join(" "))?;
        let list = self.store.add_list(&name);
        info!(id = %list.id, name = %list.name, "created list");
        writeln!(out, "Created list {} ({}).", list.name, list.id)?;
        Ok(())
    }

    fn cmd_use<W: Write>(
        &mut self,
        out: &mut W,
        args: &[String],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let wanted = args.join(" ");
        let list = self
            .store
            .find_list(&wanted)
            .ok_or_else(|| InputError::UnknownList(wanted.clone()))?;
        self.ctx.active_list = list.id;
        self.write_view(out, now)
    }

    fn write_view<W: Write>(&self, out: &mut W, now: DateTime<Utc>) -> anyhow::Result<()> {
        let tasks = self.store.tasks();
        let view = derive_view(&tasks, &self.ctx);
        self.renderer.write_list_bar(out, &self.store.lists(), &self.ctx)?;
        self.renderer.write_task_table(out, &view, now)
    }
}

fn single_arg<'a>(command: &str, args: &'a [String]) -> anyhow::Result<&'a str> {
    match args {
        [one] => Ok(one.as_str()),
        _ => Err(anyhow!("{command}: expected exactly one argument")),
    }
}
