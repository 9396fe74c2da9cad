use anyhow::{Context, Result};

use crate::store::Store;
use crate::tracker;

/// プロジェクトのタスクを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct TasksArgs {
    #[clap(help = "Project name")]
    project: String,
}

/// 記録済みのプロジェクトとタスクを取得する。重複は取り除かない。
pub struct ProjectsCommand<'a> {
    store: &'a Store,
}

impl<'a> ProjectsCommand<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `projects`サブコマンドの処理を行う。
    pub fn projects(&self) -> Result<Vec<String>> {
        tracker::get_projects(self.store).context("Failed to retrieve projects")
    }

    /// `tasks`サブコマンドの処理を行う。
    pub fn tasks(&self, args: TasksArgs) -> Result<Vec<String>> {
        tracker::get_tasks(self.store, &args.project)
            .with_context(|| format!("Failed to retrieve tasks of {}", args.project))
    }
}
