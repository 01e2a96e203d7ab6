use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::credentials::UserStore;
use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::content::ContentStore;
use crate::reactions::ReactionLedger;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub users: UserStore,
    pub sessions: SessionStore,
    pub content: ContentStore,
    pub reactions: ReactionLedger,
}

impl AppState {
    /// Wires every store to the same pool.
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            users: UserStore::with_cost(db.clone(), config.auth.password_cost),
            sessions: SessionStore::new(db.clone(), config.auth.session_hours),
            content: ContentStore::new(db.clone()),
            reactions: ReactionLedger::new(db.clone()),
            db,
            config,
        }
    }
}
