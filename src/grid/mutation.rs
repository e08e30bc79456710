//! Reconciling the cache and the rendered rows after a write made elsewhere.
//!
//! These callbacks never talk to the API. The caller performs the write, then
//! reports the written record here so the grid can patch what it already holds.

use serde_json::Value;
use super::options::{CreateMethod, DeleteMethod, ExternalCallback, InsertAt, UpdateMethod};
use super::{Grid, Record, Renderer};

/// What a mutation callback did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
  /// Policy is `none`
  Skipped,
  Inserted(InsertAt),
  Replaced { page: usize, on_screen: bool },
  Removed,
  /// No cached record matched
  NotFound,
}

fn notify(callback: &Option<ExternalCallback>, entity: &Record) {
  if let Some(callback) = callback {
    callback(entity);
  }
}

fn key_of<'a, 'b>(primary_key: Option<&'a str>, entity: &'b Record) -> Option<(&'a str, &'b Value)> {
  let primary_key = primary_key?;
  entity.get(primary_key).map(|key| (primary_key, key))
}

impl<R: Renderer> Grid<R> {
  fn record_write(&mut self) {
    let writes = self.cache.record_write();
    grid_debug!(self.config.log_level, grid = %self.config.element, writes, "Data write recorded");
    if self.config.invalidate_cache_on_data_write {
      self.cache.collapse_to_current();
    }
  }

  /// A record was created. Optionally shows it at the top or bottom of the current page.
  pub fn create_callback(&mut self, entity: Record) -> MutationOutcome {
    grid_debug!(self.config.log_level, grid = %self.config.element, "Creating entity");
    self.record_write();

    let policy = &self.config.callbacks.create;
    let outcome = match policy.method {
      CreateMethod::None => return MutationOutcome::Skipped,
      CreateMethod::Insert => {
        let at = policy.insert_method;
        match self.cache.current_page_mut() {
          Some(page) => {
            self.renderer.insert_row(&entity, at, &policy.styles);
            match at {
              InsertAt::Top => page.data.result.insert(0, entity.clone()),
              InsertAt::Bottom => page.data.result.push(entity.clone()),
            }
            MutationOutcome::Inserted(at)
          }
          None => {
            grid_warn!(self.config.log_level, grid = %self.config.element, "No current page to insert into");
            MutationOutcome::NotFound
          }
        }
      }
    };

    notify(&policy.external_callback, &entity);
    outcome
  }

  /// A record was updated. The current page is searched first, then the rest of
  /// the cache in cache order; only an on-screen match is re-rendered.
  pub fn update_callback(&mut self, entity: Record) -> MutationOutcome {
    grid_debug!(self.config.log_level, grid = %self.config.element, "Updating entity");

    let policy = &self.config.callbacks.update;
    if policy.method == UpdateMethod::None {
      return MutationOutcome::Skipped;
    }

    let outcome = match key_of(self.config.primary_key.as_deref(), &entity) {
      None => MutationOutcome::NotFound,
      Some((primary_key, key)) => {
        let current = self.cache.current_page_index();
        let on_screen = self
          .cache
          .current_page()
          .and_then(|page| page.position_of(primary_key, key));

        if let Some(position) = on_screen {
          self.renderer.replace_row(key, &entity, &policy.styles);
          if let Some(page) = self.cache.current_page_mut() {
            page.data.result[position] = entity.clone();
          }
          MutationOutcome::Replaced {
            page: current,
            on_screen: true,
          }
        } else {
          let found = self.cache.pages_mut().find_map(|page| {
            let position = page.position_of(primary_key, key)?;
            Some((page, position))
          });
          match found {
            Some((page, position)) => {
              page.data.result[position] = entity.clone();
              MutationOutcome::Replaced {
                page: page.index,
                on_screen: false,
              }
            }
            None => MutationOutcome::NotFound,
          }
        }
      }
    };

    if outcome == MutationOutcome::NotFound {
      grid_debug!(self.config.log_level, grid = %self.config.element, "Updated entity is not cached");
    }
    notify(&policy.external_callback, &entity);
    outcome
  }

  /// A record was deleted. Only the current page is touched: copies of the same
  /// record on other cached pages stay until those pages are refetched.
  pub fn delete_callback(&mut self, entity: Record) -> MutationOutcome {
    grid_debug!(self.config.log_level, grid = %self.config.element, "Deleting entity");
    self.record_write();

    let policy = &self.config.callbacks.delete;
    if policy.method == DeleteMethod::None {
      return MutationOutcome::Skipped;
    }

    let outcome = match key_of(self.config.primary_key.as_deref(), &entity) {
      None => MutationOutcome::NotFound,
      Some((primary_key, key)) => {
        let found = self.cache.current_page_mut().and_then(|page| {
          let position = page.position_of(primary_key, key)?;
          Some((page, position))
        });
        match found {
          Some((page, position)) => {
            self.renderer.remove_row(key);
            page.data.result.remove(position);
            MutationOutcome::Removed
          }
          None => MutationOutcome::NotFound,
        }
      }
    };

    notify(&policy.external_callback, &entity);
    outcome
  }
}
