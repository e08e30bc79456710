//! Single-queue access to a grid shared by several callers.
//!
//! The worker task owns the [`Grid`] and runs commands strictly in arrival
//! order, so navigation, refreshes and mutations never interleave and the same
//! page is never fetched twice at once. Commands already queued run to
//! completion; nothing is cancelled.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::mutation::MutationOutcome;
use super::{Grid, Record, Renderer};

enum GridCommand {
  PageTo {
    index: usize,
    reply: oneshot::Sender<bool>,
  },
  Refresh {
    reply: oneshot::Sender<bool>,
  },
  GetRecord {
    key: Value,
    reply: oneshot::Sender<Option<Record>>,
  },
  UpdateColumnWhere {
    filter_key: String,
    filter_value: Value,
    update_key: String,
    update_value: Value,
    re_render: bool,
    reply: oneshot::Sender<usize>,
  },
  Create {
    entity: Record,
    reply: oneshot::Sender<MutationOutcome>,
  },
  Update {
    entity: Record,
    reply: oneshot::Sender<MutationOutcome>,
  },
  Delete {
    entity: Record,
    reply: oneshot::Sender<MutationOutcome>,
  },
}

/// Cloneable handle to a grid running on its own task.
///
/// Every method returns `None` once the worker has stopped.
#[derive(Clone)]
pub struct GridHandle {
  tx: mpsc::UnboundedSender<GridCommand>,
}

impl GridHandle {
  /// Move `grid` onto a worker task. The task ends when the last handle is dropped.
  pub fn spawn<R: Renderer + 'static>(grid: Grid<R>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(grid, rx));
    Self { tx }
  }

  async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> GridCommand) -> Option<T> {
    let (reply, rx) = oneshot::channel();
    self.tx.send(build(reply)).ok()?;
    rx.await.ok()
  }

  pub async fn page_to(&self, index: usize) -> Option<bool> {
    self
      .request(|reply| GridCommand::PageTo { index, reply })
      .await
  }

  pub async fn refresh(&self) -> Option<bool> {
    self.request(|reply| GridCommand::Refresh { reply }).await
  }

  pub async fn get_record(&self, key: Value) -> Option<Option<Record>> {
    self
      .request(|reply| GridCommand::GetRecord { key, reply })
      .await
  }

  pub async fn update_column_where(
    &self,
    filter_key: impl Into<String>,
    filter_value: Value,
    update_key: impl Into<String>,
    update_value: Value,
    re_render: bool,
  ) -> Option<usize> {
    let filter_key = filter_key.into();
    let update_key = update_key.into();
    self
      .request(|reply| GridCommand::UpdateColumnWhere {
        filter_key,
        filter_value,
        update_key,
        update_value,
        re_render,
        reply,
      })
      .await
  }

  pub async fn create_callback(&self, entity: Record) -> Option<MutationOutcome> {
    self
      .request(|reply| GridCommand::Create { entity, reply })
      .await
  }

  pub async fn update_callback(&self, entity: Record) -> Option<MutationOutcome> {
    self
      .request(|reply| GridCommand::Update { entity, reply })
      .await
  }

  pub async fn delete_callback(&self, entity: Record) -> Option<MutationOutcome> {
    self
      .request(|reply| GridCommand::Delete { entity, reply })
      .await
  }
}

async fn run<R: Renderer>(mut grid: Grid<R>, mut rx: mpsc::UnboundedReceiver<GridCommand>) {
  while let Some(command) = rx.recv().await {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
      GridCommand::PageTo { index, reply } => {
        let _ = reply.send(grid.page_to(index).await);
      }
      GridCommand::Refresh { reply } => {
        let _ = reply.send(grid.refresh().await);
      }
      GridCommand::GetRecord { key, reply } => {
        let _ = reply.send(grid.get_record(&key).cloned());
      }
      GridCommand::UpdateColumnWhere {
        filter_key,
        filter_value,
        update_key,
        update_value,
        re_render,
        reply,
      } => {
        let updated = grid
          .update_column_where(
            &filter_key,
            &filter_value,
            &update_key,
            update_value,
            re_render,
          )
          .await;
        let _ = reply.send(updated);
      }
      GridCommand::Create { entity, reply } => {
        let _ = reply.send(grid.create_callback(entity));
      }
      GridCommand::Update { entity, reply } => {
        let _ = reply.send(grid.update_callback(entity));
      }
      GridCommand::Delete { entity, reply } => {
        let _ = reply.send(grid.delete_callback(entity));
      }
    }
  }
  grid_debug!(grid.config().log_level, grid = %grid.config().element, "Grid worker stopped");
}
