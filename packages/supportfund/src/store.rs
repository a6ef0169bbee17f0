//! 공고 레코드 저장소
//!
//! [`Store`]는 프로세스 시작 시 한 번 열고, 요청마다 [`Store::session`]으로
//! 연결 하나를 빌려 씁니다. 세션은 drop될 때 풀로 반환됩니다.
use std::path::Path;
use std::time::Duration;

use sqlx::{Connection, Pool, Sqlite, pool::PoolConnection, sqlite::SqlitePoolOptions};

use crate::core::{Announcement, Category, NewAnnouncement};
use crate::error::Error;

const SELECT_PROGRAMS: &str = "SELECT id, title, category, agency, reg_date, link FROM programs";

#[derive(sqlx::FromRow)]
struct ProgramEntity {
    id: i64,
    title: String,
    category: String,
    agency: String,
    reg_date: String,
    link: String,
}

impl From<ProgramEntity> for Announcement {
    fn from(value: ProgramEntity) -> Self {
        let category = Category::from_label(&value.category).unwrap_or_else(|| {
            tracing::warn!(id = value.id, category = %value.category, "Unknown category label");
            Category::Other
        });
        Self {
            id: value.id,
            title: value.title,
            category,
            agency: value.agency,
            reg_date: value.reg_date,
            link: value.link,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    const MAX_CONNECTIONS: u32 = 5;

    /// `path`의 SQLite 파일을 열고, 없으면 만듭니다.
    pub async fn open(path: &Path) -> Result<Self, Error> {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(Self::MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&url)
            .await?;
        tracing::info!(path = %path.display(), "Connected to database");
        Self::from_pool(pool).await
    }

    /// 메모리 DB는 연결마다 따로 생기므로 연결 하나만 유지합니다.
    pub async fn in_memory() -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self, Error> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn session(&self) -> Result<StoreSession, Error> {
        Ok(StoreSession {
            conn: self.pool.acquire().await?,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn init_schema(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            agency TEXT NOT NULL,
            reg_date TEXT NOT NULL,
            link TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 제목 중복 검사는 삽입 전 조회로만 합니다. UNIQUE 제약은 두지 않습니다.
    sqlx::query("CREATE INDEX IF NOT EXISTS ix_programs_title ON programs (title)")
        .execute(pool)
        .await?;

    Ok(())
}

/// 요청 하나가 쓰는 저장소 연결
pub struct StoreSession {
    conn: PoolConnection<Sqlite>,
}

impl StoreSession {
    pub async fn contains_title(&mut self, title: &str) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM programs WHERE title = ?)")
            .bind(title)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(exists)
    }

    /// 한 트랜잭션으로 모두 삽입합니다. 실패하면 아무것도 기록되지 않습니다.
    pub async fn insert_all(&mut self, announcements: &[NewAnnouncement]) -> Result<usize, Error> {
        if announcements.is_empty() {
            return Ok(0);
        }

        let mut tx = self.conn.begin().await?;
        for announcement in announcements {
            sqlx::query(
                "INSERT INTO programs (title, category, agency, reg_date, link) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&announcement.title)
            .bind(announcement.category.label())
            .bind(&announcement.agency)
            .bind(&announcement.reg_date)
            .bind(&announcement.link)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(announcements.len())
    }

    /// 최근에 삽입된 순서로 모든 공고를 반환합니다.
    pub async fn list_recent(&mut self) -> Result<Vec<Announcement>, Error> {
        let entities = sqlx::query_as::<_, ProgramEntity>(&format!("{SELECT_PROGRAMS} ORDER BY id DESC"))
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(entities.into_iter().map(Announcement::from).collect())
    }

    /// 제목에 `keyword`가 그대로 포함된 공고만 반환합니다. 대소문자를 구분합니다.
    pub async fn search(&mut self, keyword: &str) -> Result<Vec<Announcement>, Error> {
        let entities = sqlx::query_as::<_, ProgramEntity>(&format!(
            "{SELECT_PROGRAMS} WHERE instr(title, ?) > 0 ORDER BY id DESC"
        ))
        .bind(keyword)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(entities.into_iter().map(Announcement::from).collect())
    }
}
