use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::ids::{
  IdSource,
  TimestampIds,
  UuidIds
};
use crate::reminder::MAX_REMINDER_INTERVAL;
use crate::task::Priority;
use crate::view::SortKey;

const RC_ENV_VAR: &str = "DOCKETRC";
const RC_FILE_NAME: &str = ".docketrc";
pub const MAX_REMINDER_INTERVAL_SECS: u64 =
  MAX_REMINDER_INTERVAL.as_secs();

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (k, v) in [
      ("reminder.interval", "60"),
      ("reminder.enabled", "on"),
      ("default.sort", "due"),
      ("default.showcompleted", "on"),
      ("default.priority", "medium"),
      ("id.source", "timestamp"),
      ("color", "on")
    ] {
      map.insert(
        k.to_string(),
        v.to_string()
      );
    }

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading docketrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no docketrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<bool> {
    let raw = self.require(key)?;
    crate::input::parse_on_off(&raw)
      .with_context(|| {
        format!(
          "config {key} must be on \
           or off"
        )
      })
  }

  pub fn reminder_interval(
    &self
  ) -> anyhow::Result<Duration> {
    let raw =
      self.require("reminder.interval")?;
    let secs: u64 = raw
      .trim()
      .parse()
      .with_context(|| {
        format!(
          "reminder.interval must be \
           whole seconds, got {raw:?}"
        )
      })?;
    if secs == 0 {
      return Err(anyhow!(
        "reminder.interval must be \
         greater than zero"
      ));
    }
    if secs > MAX_REMINDER_INTERVAL_SECS {
      return Err(anyhow!(
        "reminder.interval must be at \
         most {MAX_REMINDER_INTERVAL_SECS} \
         seconds (one day), got {secs}"
      ));
    }
    Ok(Duration::from_secs(secs))
  }

  pub fn reminders_enabled(
    &self
  ) -> anyhow::Result<bool> {
    self.get_bool("reminder.enabled")
  }

  pub fn default_sort(
    &self
  ) -> anyhow::Result<SortKey> {
    let raw =
      self.require("default.sort")?;
    raw
      .parse::<SortKey>()
      .context("invalid default.sort")
  }

  pub fn default_show_completed(
    &self
  ) -> anyhow::Result<bool> {
    self.get_bool(
      "default.showcompleted"
    )
  }

  pub fn default_priority(
    &self
  ) -> anyhow::Result<Priority> {
    let raw =
      self.require("default.priority")?;
    raw
      .parse::<Priority>()
      .context("invalid default.priority")
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    self.get_bool("color")
  }

  pub fn id_source(
    &self
  ) -> anyhow::Result<Box<dyn IdSource>>
  {
    let raw = self.require("id.source")?;
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "timestamp" => Ok(Box::new(
        TimestampIds::default()
      )),
      | "uuid" => Ok(Box::new(UuidIds)),
      | other => Err(anyhow!(
        "invalid id.source: {other} \
         (expected timestamp or uuid)"
      ))
    }
  }

  fn require(
    &self,
    key: &str
  ) -> anyhow::Result<String> {
    self.get(key).ok_or_else(|| {
      anyhow!("missing config key {key}")
    })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if self
          .loaded_files
          .contains(&include_path)
        {
          warn!(include = %include_path.display(), "include already loaded; skipping");
        } else if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping docketrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
