use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};

use crate::proto::{Post, User};

/// Capacity of the post event channel.
const POST_EVENTS_CAPACITY: usize = 64;

/// State shared by every procedure of the demo application.
#[derive(Clone)]
pub struct AppContext {
    users: Arc<Vec<User>>,
    posts: Arc<RwLock<Vec<Post>>>,
    next_post_id: Arc<AtomicU64>,
    post_events: broadcast::Sender<Post>,
}

impl AppContext {
    pub fn new(users: Vec<User>) -> Self {
        let (post_events, _) = broadcast::channel(POST_EVENTS_CAPACITY);
        Self {
            users: Arc::new(users),
            posts: Arc::new(RwLock::new(Vec::new())),
            next_post_id: Arc::new(AtomicU64::new(1)),
            post_events,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub async fn posts(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    pub async fn post(&self, id: u64) -> Option<Post> {
        self.posts.read().await.iter().find(|post| post.id == id).cloned()
    }

    /// Store a post and notify subscribers.
    pub async fn add_post(&self, author_id: u64, title: String) -> Post {
        let post = Post {
            id: self.next_post_id.fetch_add(1, Ordering::Relaxed),
            author_id,
            title,
        };
        self.posts.write().await.push(post.clone());
        // no subscribers is fine
        let _ = self.post_events.send(post.clone());
        post
    }

    pub fn subscribe_posts(&self) -> broadcast::Receiver<Post> {
        self.post_events.subscribe()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(vec![
            User {
                id: 1,
                name: "ada".to_string(),
            },
            User {
                id: 2,
                name: "grace".to_string(),
            },
        ])
    }
}
