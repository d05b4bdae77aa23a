use anyhow::anyhow;
use tracing::{
  instrument,
  trace
};

use crate::input::{
  TaskInput,
  TaskPatch
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mod {
  Title(String),
  Description(String),
  Due(String),
  Priority(String),
  List(String)
}

/// Splits a command line into words.
/// Double quotes group words and may
/// appear inside a token, so
/// `desc:"two words"` is one word.
pub fn split_words(
  line: &str
) -> anyhow::Result<Vec<String>> {
  let mut words = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut quoted = false;

  for ch in line.chars() {
    match ch {
      | '"' => {
        quoted = !quoted;
        in_word = true;
      }
      | c if c.is_whitespace()
        && !quoted =>
      {
        if in_word {
          words.push(std::mem::take(
            &mut current
          ));
          in_word = false;
        }
      }
      | c => {
        current.push(c);
        in_word = true;
      }
    }
  }

  if quoted {
    return Err(anyhow!(
      "unterminated quote in: {line}"
    ));
  }
  if in_word {
    words.push(current);
  }

  Ok(words)
}

fn parse_one_mod(
  tok: &str
) -> Option<Mod> {
  let (key, value) =
    tok.split_once(':')?;
  let value = value.to_string();

  match key
    .to_ascii_lowercase()
    .as_str()
  {
    | "title" => Some(Mod::Title(value)),
    | "desc" | "description" => {
      Some(Mod::Description(value))
    }
    | "due" => Some(Mod::Due(value)),
    | "pri" | "priority" => {
      Some(Mod::Priority(value))
    }
    | "list" => Some(Mod::List(value)),
    | _ => None
  }
}

/// `add` arguments: free words form the
/// title, `key:value` words set fields.
/// Everything after `--` is title text.
#[instrument(skip(args))]
pub(super) fn parse_task_input(
  args: &[String]
) -> anyhow::Result<TaskInput> {
  let mut title_parts = Vec::new();
  let mut input = TaskInput::default();

  let mut literal = false;
  for arg in args {
    if arg == "--" && !literal {
      literal = true;
      continue;
    }

    let one_mod = if literal {
      None
    } else {
      parse_one_mod(arg)
    };

    match one_mod {
      | Some(Mod::Title(title)) => {
        title_parts.push(title)
      }
      | Some(Mod::Description(text)) => {
        input.description = Some(text)
      }
      | Some(Mod::Due(raw)) => {
        input.due = Some(raw)
      }
      | Some(Mod::Priority(raw)) => {
        input.priority = Some(raw)
      }
      | Some(Mod::List(raw)) => {
        input.list = Some(raw)
      }
      | None => {
        title_parts.push(arg.clone())
      }
    }
  }

  if title_parts.is_empty() {
    return Err(anyhow!(
      "add: title is required"
    ));
  }

  input.title = title_parts.join(" ");
  trace!(?input, "parsed task input");
  Ok(input)
}

/// `edit` arguments: only `key:value`
/// words are accepted.
#[instrument(skip(args))]
pub(super) fn parse_patch(
  args: &[String]
) -> anyhow::Result<TaskPatch> {
  let mut patch = TaskPatch::default();

  for arg in args {
    let one_mod = parse_one_mod(arg)
      .ok_or_else(|| {
        anyhow!(
          "edit: unrecognized \
           modifier {arg:?}"
        )
      })?;

    match one_mod {
      | Mod::Title(title) => {
        patch.title = Some(title)
      }
      | Mod::Description(text) => {
        patch.description = Some(text)
      }
      | Mod::Due(raw) => {
        patch.due = Some(raw)
      }
      | Mod::Priority(raw) => {
        patch.priority = Some(raw)
      }
      | Mod::List(raw) => {
        patch.list = Some(raw)
      }
    }
  }

  Ok(patch)
}
