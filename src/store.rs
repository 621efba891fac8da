use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database, IndexModel};
use uuid::Uuid;

use crate::models::task::{NewTask, Task, TaskStatus};

/// Persistence layer for the `tasks` collection. All documents use the
/// camelCase field names of the wire format, so filters here must too.
#[derive(Clone)]
pub struct TaskStore {
    tasks: Collection<Task>,
}

impl TaskStore {
    pub fn new(db: &Database) -> Self {
        TaskStore {
            tasks: db.collection::<Task>("tasks"),
        }
    }

    /// Indexes backing the list filters: status+dueDate and assigneeEmail.
    pub async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        self.tasks
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "dueDate": 1 })
                    .build(),
            )
            .await?;
        self.tasks
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "assigneeEmail": 1 })
                    .build(),
            )
            .await?;
        Ok(())
    }

    pub async fn insert(&self, new_task: NewTask) -> mongodb::error::Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: None,
            task_id: Uuid::new_v4().to_string(),
            title: new_task.title,
            description: new_task.description,
            assignee_email: new_task.assignee_email,
            due_date: new_task.due_date,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert_one(&task).await?;
        Ok(task)
    }

    pub async fn find(&self, filter: Document) -> mongodb::error::Result<Vec<Task>> {
        let mut cursor = self.tasks.find(filter).await?;
        let mut tasks = Vec::new();
        while let Some(task) = cursor.next().await {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    /// Atomically set the status and refresh updatedAt, returning the updated
    /// document, or None when no task matches.
    pub async fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> mongodb::error::Result<Option<Task>> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                // chrono's serde writes RFC 3339 strings into BSON, so the
                // manual update has to as well
                "updatedAt": Utc::now().to_rfc3339(),
            }
        };
        self.tasks
            .find_one_and_update(doc! { "taskId": task_id }, update)
            .return_document(ReturnDocument::After)
            .await
    }

    pub async fn delete(&self, task_id: &str) -> mongodb::error::Result<bool> {
        let result = self.tasks.delete_one(doc! { "taskId": task_id }).await?;
        Ok(result.deleted_count > 0)
    }
}
