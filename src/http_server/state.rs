use std::path::PathBuf;

use crate::services::catalog::DbSongCatalog;
use crate::services::quiz::QuizService;
use crate::services::song::SongService;
use crate::services::user::UserService;

pub struct AppState {
    pub quiz: QuizService<DbSongCatalog>,
    pub songs: SongService,
    pub users: UserService,
    pub leaderboard_size: u64,
    /// Served under `/assets/clips` when clips are extracted locally.
    pub clips_directory: Option<PathBuf>,
}
