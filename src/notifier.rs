use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use crate::models::task::Task;

/// Fire-and-forget webhook caller. Delivery is best-effort at-most-once:
/// every failure is logged and swallowed, never returned to the caller.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub task_id: String,
    pub title: String,
    pub assignee_email: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionPayload {
    pub fn from_task(task: &Task) -> Self {
        CompletionPayload {
            task_id: task.task_id.clone(),
            title: task.title.clone(),
            assignee_email: task.assignee_email.clone(),
            completed_at: Utc::now(),
        }
    }
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Notifier {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub async fn notify_completion(&self, payload: &CompletionPayload) {
        let url = match &self.webhook_url {
            Some(url) => url,
            None => {
                warn!("Webhook URL is not configured, skipping completion notification");
                return;
            }
        };

        match self.client.post(url).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Completion notification sent for task {}", payload.task_id);
            }
            Ok(resp) => {
                error!(
                    "Completion webhook returned {} for task {}",
                    resp.status(),
                    payload.task_id
                );
            }
            Err(e) => {
                error!("Completion webhook failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn payload() -> CompletionPayload {
        CompletionPayload {
            task_id: "7b1c7e0a-6f4e-4e0a-9a49-2a8f0f6f3c11".to_string(),
            title: "Ship release".to_string(),
            assignee_email: "x@y.com".to_string(),
            completed_at: Utc::now(),
        }
    }

    async fn read_http_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = socket.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn delivers_exactly_one_request_with_task_fields() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notifier = Notifier::new(Some(format!("http://{addr}/hooks/task-completed")));

        let server = async {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_http_request(&mut socket).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            socket.shutdown().await.ok();
            request
        };

        let payload = payload();
        let (request, ()) = tokio::join!(server, notifier.notify_completion(&payload));

        assert!(request.starts_with("POST /hooks/task-completed"));
        assert!(request.contains("\"taskId\":\"7b1c7e0a-6f4e-4e0a-9a49-2a8f0f6f3c11\""));
        assert!(request.contains("\"title\":\"Ship release\""));
        assert!(request.contains("\"assigneeEmail\":\"x@y.com\""));
        assert!(request.contains("\"completedAt\":"));

        // no retry, no second delivery
        let second = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_a_noop() {
        let notifier = Notifier::new(None);
        notifier.notify_completion(&payload()).await;
    }

    #[tokio::test]
    async fn unreachable_webhook_is_swallowed() {
        // nothing listens on port 1
        let notifier = Notifier::new(Some("http://127.0.0.1:1/hooks".to_string()));
        notifier.notify_completion(&payload()).await;
    }

    #[test]
    fn payload_is_built_from_task_fields() {
        let now = Utc::now();
        let task = Task {
            id: None,
            task_id: "abc".to_string(),
            title: "A".to_string(),
            description: None,
            assignee_email: "x@y.com".to_string(),
            due_date: now,
            status: crate::models::task::TaskStatus::Completed,
            created_at: now,
            updated_at: now,
        };
        let payload = CompletionPayload::from_task(&task);
        assert_eq!(payload.task_id, "abc");
        assert_eq!(payload.title, "A");
        assert_eq!(payload.assignee_email, "x@y.com");
    }
}
