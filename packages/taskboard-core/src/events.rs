/// Change notifications emitted by stores.
///
/// Every event carries a full snapshot of the changed record set for one
/// board; consumers replace, never patch.
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::types::{Column, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum BoardChangeEvent {
    ColumnsChanged {
        board_id: String,
        version: u64,
        columns: Vec<Column>,
    },
    TasksChanged {
        board_id: String,
        version: u64,
        tasks: Vec<Task>,
    },
}

impl BoardChangeEvent {
    pub fn board_id(&self) -> &str {
        match self {
            BoardChangeEvent::ColumnsChanged { board_id, .. }
            | BoardChangeEvent::TasksChanged { board_id, .. } => board_id,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            BoardChangeEvent::ColumnsChanged { version, .. }
            | BoardChangeEvent::TasksChanged { version, .. } => *version,
        }
    }
}

/// Receiver for one board's events.
pub struct BoardSubscription {
    board_id: String,
    rx: broadcast::Receiver<BoardChangeEvent>,
}

impl BoardSubscription {
    pub fn new(board_id: impl Into<String>, rx: broadcast::Receiver<BoardChangeEvent>) -> Self {
        Self {
            board_id: board_id.into(),
            rx,
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// Next event for this board. Returns `None` once the store is gone.
    ///
    /// A lagging receiver skips the lost events; since every event is a
    /// full snapshot the next one still yields a consistent view.
    pub async fn next(&mut self) -> Option<BoardChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.board_id() == self.board_id => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "[taskboard.events] Subscription for {} lagged, skipped {} events",
                        self.board_id,
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = BoardChangeEvent::ColumnsChanged {
            board_id: "b1".into(),
            version: 3,
            columns: vec![Column::new("c1", "Todo")],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ColumnsChanged");
        assert_eq!(json["boardId"], "b1");
        assert_eq!(json["columns"][0]["name"], "Todo");
    }

    #[tokio::test]
    async fn test_subscription_filters_other_boards() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = BoardSubscription::new("b2", rx);
        tx.send(BoardChangeEvent::TasksChanged {
            board_id: "b1".into(),
            version: 1,
            tasks: Vec::new(),
        })
        .unwrap();
        tx.send(BoardChangeEvent::TasksChanged {
            board_id: "b2".into(),
            version: 2,
            tasks: Vec::new(),
        })
        .unwrap();
        let event = sub.next().await.unwrap();
        assert_eq!(event.board_id(), "b2");
        assert_eq!(event.version(), 2);
        drop(tx);
        assert!(sub.next().await.is_none());
    }
}
