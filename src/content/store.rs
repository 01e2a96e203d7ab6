use rusqlite::{params, Row, TransactionBehavior};

use crate::db::models::{Category, Comment, Post};
use crate::db::{is_constraint_violation, StoreError, StoreResult};
use crate::state::DbPool;

const POST_COLUMNS: &str = "p.id, p.user_id, u.username, p.title, p.content, p.created_at";
const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.user_id, u.username, c.content, c.created_at";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        author: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Posts, comments and the post/category association.
#[derive(Clone)]
pub struct ContentStore {
    pool: DbPool,
}

impl ContentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post and link it to `categories`. Either everything is stored or nothing is.
    pub fn create_post(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        categories: &[i64],
    ) -> StoreResult<i64> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(StoreError::InvalidInput(
                "Title and content are required".into(),
            ));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO posts (user_id, title, content) VALUES (?1, ?2, ?3)",
            params![author_id, title, content],
        )?;
        let post_id = tx.last_insert_rowid();

        for category_id in categories {
            tx.execute(
                "INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?1, ?2)",
                params![post_id, category_id],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::InvalidInput(format!("Unknown category: {}", category_id))
                } else {
                    StoreError::Sql(e)
                }
            })?;
        }
        tx.commit()?;

        tracing::info!(post_id, author_id, "Post created");
        Ok(post_id)
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> StoreResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts p
             JOIN users u ON u.id = p.user_id
             ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
        ))?;
        let posts = stmt
            .query_map([], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Posts tagged with a category, newest first. Unknown categories give an empty list.
    pub fn list_posts_by_category(&self, category_id: i64) -> StoreResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts p
             JOIN post_categories pc ON pc.post_id = p.id
             JOIN users u ON u.id = p.user_id
             WHERE pc.category_id = ?1
             ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
        ))?;
        let posts = stmt
            .query_map(params![category_id], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Store a comment and return it as persisted.
    pub fn add_comment(&self, post_id: i64, author_id: i64, content: &str) -> StoreResult<Comment> {
        let content = content.trim();
        if post_id <= 0 || content.is_empty() {
            return Err(StoreError::InvalidInput(
                "Missing post_id or content".into(),
            ));
        }

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (post_id, user_id, content) VALUES (?1, ?2, ?3)",
            params![post_id, author_id, content],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::InvalidInput(format!("Unknown post: {}", post_id))
            } else {
                StoreError::Sql(e)
            }
        })?;
        let comment_id = conn.last_insert_rowid();

        let comment = conn.query_row(
            &format!(
                "SELECT {} FROM comments c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.id = ?1",
                COMMENT_COLUMNS
            ),
            params![comment_id],
            comment_from_row,
        )?;

        tracing::info!(comment_id, post_id, author_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a post in reading order, oldest first.
    pub fn list_comments(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ?1
             ORDER BY c.created_at ASC, c.id ASC",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{insert_user, test_pool};

    fn category_id(store: &ContentStore, name: &str) -> i64 {
        store
            .list_categories()
            .unwrap()
            .into_iter()
            .find(|c| c.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn create_post_requires_title_and_content() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let store = ContentStore::new(pool);

        for (title, content) in [("", "body"), ("title", ""), ("   ", "body")] {
            let err = store.create_post(alice, title, content, &[]).unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
        assert!(store.list_posts().unwrap().is_empty());
    }

    #[test]
    fn list_posts_newest_first_with_author() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let bob = insert_user(&pool, "bob");
        let store = ContentStore::new(pool);

        let first = store.create_post(alice, "first", "one", &[]).unwrap();
        let second = store.create_post(bob, "second", "two", &[]).unwrap();

        let posts = store.list_posts().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second);
        assert_eq!(posts[0].author, "bob");
        assert_eq!(posts[1].id, first);
        assert_eq!(posts[1].author, "alice");
        assert_eq!(posts[1].author_id, alice);
        assert_eq!(posts[1].title, "first");
        assert_eq!(posts[1].content, "one");
    }

    #[test]
    fn posts_filter_by_category() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let store = ContentStore::new(pool);
        let tech = category_id(&store, "Technology");
        let sports = category_id(&store, "Sports");

        let tagged = store
            .create_post(alice, "rust", "is fun", &[tech, tech])
            .unwrap();
        store.create_post(alice, "untagged", "post", &[]).unwrap();

        let posts = store.list_posts_by_category(tech).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, tagged);

        assert!(store.list_posts_by_category(sports).unwrap().is_empty());
        assert!(store.list_posts_by_category(9999).unwrap().is_empty());
    }

    #[test]
    fn unknown_category_rolls_back_post() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let store = ContentStore::new(pool);

        let err = store
            .create_post(alice, "title", "content", &[9999])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert!(store.list_posts().unwrap().is_empty());
    }

    #[test]
    fn comments_come_back_oldest_first() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let bob = insert_user(&pool, "bob");
        let store = ContentStore::new(pool);
        let post_id = store.create_post(alice, "hi", "world", &[]).unwrap();

        let first = store.add_comment(post_id, bob, "first!").unwrap();
        let second = store.add_comment(post_id, alice, "thanks").unwrap();
        assert_eq!(first.post_id, post_id);
        assert_eq!(first.user_id, bob);
        assert_eq!(first.author, "bob");
        assert_eq!(first.content, "first!");
        assert!(!first.created_at.is_empty());

        let comments = store.list_comments(post_id).unwrap();
        assert_eq!(comments, vec![first, second]);
    }

    #[test]
    fn comment_validation() {
        let (pool, _tmp) = test_pool();
        let alice = insert_user(&pool, "alice");
        let store = ContentStore::new(pool);
        let post_id = store.create_post(alice, "hi", "world", &[]).unwrap();

        assert!(matches!(
            store.add_comment(post_id, alice, "  "),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add_comment(0, alice, "hello"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add_comment(4242, alice, "hello"),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(store.list_comments(post_id).unwrap().is_empty());
    }

    #[test]
    fn seeded_categories_are_listed() {
        let (pool, _tmp) = test_pool();
        let store = ContentStore::new(pool);
        let names: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["General", "Technology", "Science", "Sports", "Entertainment"]
        );
    }
}
