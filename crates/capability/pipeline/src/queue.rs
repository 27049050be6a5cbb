//! 固定容量、满时淘汰最旧项的队列。
//!
//! `push` 在一次加锁内完成「淘汰 + 入队」，被淘汰的最旧项原样返回给
//! 调用方计数；`pop` 挂在 [`Notify`] 上等待，不轮询。持续过载下
//! 最新数据胜出，最旧数据被静默丢弃。

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// 丢弃最旧项的有界 FIFO。
#[derive(Debug)]
pub struct DropOldestQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> DropOldestQueue<T> {
    /// 创建容量为 `capacity` 的队列（容量至少为 1）。
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// 入队。满时先移除最旧项并将其返回；生产者永不阻塞。
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
            let evicted = if items.len() >= self.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(item);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    /// 出队；队列为空时挂起等待。
    pub async fn pop(&self) -> T {
        loop {
            // 先登记等待再检查队列，避免错过 push 的通知
            let notified = self.notify.notified();
            if let Some(item) = self.try_pop() {
                return item;
            }
            notified.await;
        }
    }

    /// 非阻塞出队。
    pub fn try_pop(&self) -> Option<T> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn push_below_capacity_evicts_nothing() {
        let queue = DropOldestQueue::new(3);
        assert!(queue.push(1).is_none());
        assert!(queue.push(2).is_none());
        assert!(queue.push(3).is_none());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn overflow_keeps_the_newest_items_in_order() {
        let queue = DropOldestQueue::new(3);
        for i in 0..7 {
            queue.push(i);
        }
        // 容量 + k 次入队后恰好剩容量个、且是最新的几项
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(4));
        assert_eq!(queue.try_pop(), Some(5));
        assert_eq!(queue.try_pop(), Some(6));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn overflow_returns_the_evicted_item() {
        let queue = DropOldestQueue::new(2);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.push("c"), Some("a"));
        assert_eq!(queue.push("d"), Some("b"));
    }

    #[test]
    fn zero_capacity_is_sanitized_to_one() {
        let queue = DropOldestQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(1);
        assert_eq!(queue.push(2), Some(1));
    }

    #[tokio::test]
    async fn pop_waits_for_a_producer() {
        let queue = Arc::new(DropOldestQueue::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(42);

        let value = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("pop should wake after push")
            .expect("consumer task");
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn pop_drains_in_arrival_order() {
        let queue = DropOldestQueue::new(8);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop().await, 1);
        assert_eq!(queue.pop().await, 2);
        assert_eq!(queue.pop().await, 3);
    }
}
