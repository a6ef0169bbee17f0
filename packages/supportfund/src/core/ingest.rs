use std::collections::HashSet;

use crate::core::{NewAnnouncement, NoticeRow, NoticeSource};
use crate::error::Error;
use crate::store::{Store, StoreSession};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// 목록에서 발견한 후보 수
    pub found: usize,
    /// 이미 저장되어 있거나 같은 목록에 중복으로 나온 후보 수
    pub skipped: usize,
    pub inserted: usize,
}

/// 목록을 읽어 저장소에 없는 제목만 분류해 한 트랜잭션으로 저장합니다.
///
/// 저장소 연결은 목록을 다 읽은 뒤에 빌립니다. 느린 수집이 풀을 붙잡지 않습니다.
pub async fn ingest<S: NoticeSource>(source: &S, store: &Store) -> Result<IngestReport, Error> {
    let rows = source.crawl().await?;
    tracing::info!(source = S::IDENTIFIER, found = rows.len(), "Crawled {}", S::TITLE);

    let mut session = store.session().await?;
    store_rows::<S>(rows, &mut session).await
}

/// 수집된 후보 중 새 제목만 저장합니다. 커밋에 실패하면 아무것도 기록되지 않습니다.
pub async fn store_rows<S: NoticeSource>(
    rows: Vec<NoticeRow>,
    session: &mut StoreSession,
) -> Result<IngestReport, Error> {
    let mut report = IngestReport {
        found: rows.len(),
        ..Default::default()
    };
    let mut staged_titles = HashSet::new();
    let mut staged: Vec<NewAnnouncement> = Vec::new();

    for row in rows {
        if staged_titles.contains(&row.title) || session.contains_title(&row.title).await? {
            tracing::debug!(title = %row.title, "Already ingested, skipping");
            report.skipped += 1;
            continue;
        }
        staged_titles.insert(row.title.clone());
        staged.push(row.into_announcement(S::AGENCY));
    }

    report.inserted = session.insert_all(&staged).await?;

    for announcement in &staged {
        tracing::info!(
            target: "ingest_update",
            source = S::IDENTIFIER,
            title = %announcement.title,
            category = %announcement.category,
            reg_date = %announcement.reg_date,
            link = %announcement.link,
            "New announcement stored"
        );
    }
    tracing::info!(
        source = S::IDENTIFIER,
        inserted = report.inserted,
        skipped = report.skipped,
        "Ingest finished"
    );

    Ok(report)
}

/// 페이지 요청마다 호출되는 진입점입니다. 실패는 기록만 하고 빈 결과로 바꿉니다.
pub async fn ingest_or_log<S: NoticeSource>(source: &S, store: &Store) -> IngestReport {
    ingest(source, store).await.unwrap_or_else(|e| {
        tracing::error!(source = S::IDENTIFIER, error = %e, "Ingest cycle failed");
        IngestReport::default()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::core::Category;
    use crate::error::{PluginError, PluginErrorKind};

    struct FixedSource {
        rows: Mutex<Vec<NoticeRow>>,
    }

    impl FixedSource {
        fn new(rows: Vec<NoticeRow>) -> Self {
            Self {
                rows: Mutex::new(rows),
            }
        }

        fn replace(&self, rows: Vec<NoticeRow>) {
            *self.rows.lock().unwrap() = rows;
        }
    }

    impl NoticeSource for FixedSource {
        const IDENTIFIER: &'static str = "fixed.test";
        const TITLE: &'static str = "테스트 목록";
        const AGENCY: &'static str = "테스트기관";

        async fn crawl(&self) -> Result<Vec<NoticeRow>, PluginError> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    struct UnreachableSource;

    impl NoticeSource for UnreachableSource {
        const IDENTIFIER: &'static str = "unreachable.test";
        const TITLE: &'static str = "접속 불가";
        const AGENCY: &'static str = "테스트기관";

        async fn crawl(&self) -> Result<Vec<NoticeRow>, PluginError> {
            Err(PluginError::request::<Self>("connection refused".to_string()))
        }
    }

    fn row(title: &str, seq: u32) -> NoticeRow {
        NoticeRow {
            title: title.to_string(),
            link: format!("https://fixed.test/view?seq={seq}"),
            reg_date: "2024-01-10".to_string(),
        }
    }

    async fn stored(store: &Store) -> Vec<crate::core::Announcement> {
        store.session().await.unwrap().list_recent().await.unwrap()
    }

    #[tokio::test]
    async fn test_ingest_classifies_and_stores() {
        let store = Store::in_memory().await.unwrap();
        let source = FixedSource::new(vec![
            row("마을기업 지원사업 공고", 4521),
            row("사회적 소셜벤처 공고", 4522),
        ]);

        let report = ingest(&source, &store).await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                found: 2,
                skipped: 0,
                inserted: 2
            }
        );
        let stored = stored(&store).await;
        assert_eq!(stored[0].title, "사회적 소셜벤처 공고");
        assert_eq!(stored[0].category, Category::SocialEnterprise);
        assert_eq!(stored[1].category, Category::VillageEnterprise);
        assert!(stored[1].link.ends_with("4521"));
        assert!(stored.iter().all(|a| a.agency == "테스트기관"));
    }

    #[tokio::test]
    async fn test_ingest_twice_keeps_one_record() {
        let store = Store::in_memory().await.unwrap();
        let source = FixedSource::new(vec![row("협동조합 교육 안내", 1)]);

        ingest(&source, &store).await.unwrap();
        let second = ingest(&source, &store).await.unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(stored(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_only_new_titles() {
        let store = Store::in_memory().await.unwrap();
        let source = FixedSource::new(vec![row("기존 공고", 1)]);
        ingest(&source, &store).await.unwrap();

        // 같은 제목이라도 링크가 바뀌면 무시되고, 새 제목만 추가됩니다
        source.replace(vec![row("신규 공고", 2), row("기존 공고", 3)]);
        let report = ingest(&source, &store).await.unwrap();

        assert_eq!(report.inserted, 1);
        let stored = stored(&store).await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title, "신규 공고");
        assert!(stored[1].link.ends_with("seq=1"));
    }

    #[tokio::test]
    async fn test_ingest_duplicate_titles_in_one_listing() {
        let store = Store::in_memory().await.unwrap();
        let source = FixedSource::new(vec![row("중복 공고", 1), row("중복 공고", 2)]);

        let report = ingest(&source, &store).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        let stored = stored(&store).await;
        assert_eq!(stored.len(), 1);
        assert!(stored[0].link.ends_with("seq=1"));
    }

    #[tokio::test]
    async fn test_store_rows_with_session() {
        let store = Store::in_memory().await.unwrap();
        let mut session = store.session().await.unwrap();

        let report = store_rows::<FixedSource>(vec![row("마을 공동체 공고", 1)], &mut session)
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert!(session.contains_title("마을 공동체 공고").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_crawl_is_swallowed() {
        let store = Store::in_memory().await.unwrap();
        store
            .session()
            .await
            .unwrap()
            .insert_all(&[row("먼저 저장된 공고", 1).into_announcement("테스트기관")])
            .await
            .unwrap();

        let Err(Error::Plugin(err)) = ingest(&UnreachableSource, &store).await else {
            panic!("Crawl failure should surface as a plugin error");
        };
        assert_eq!(err.kind(), &PluginErrorKind::Request);
        assert_eq!(err.plugin(), "unreachable.test");

        let report = ingest_or_log(&UnreachableSource, &store).await;

        assert_eq!(report, IngestReport::default());
        assert_eq!(stored(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_writes_nothing() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = Store::from_pool(pool.clone()).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_title BEFORE INSERT ON programs \
             WHEN NEW.title = '거부되는 공고' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();
        let source = FixedSource::new(vec![
            row("마을기업 지원사업 공고", 1),
            row("거부되는 공고", 2),
            row("협동조합 교육 안내", 3),
        ]);

        assert!(matches!(
            ingest(&source, &store).await,
            Err(Error::Database(_))
        ));
        let report = ingest_or_log(&source, &store).await;

        assert_eq!(report, IngestReport::default());
        assert!(stored(&store).await.is_empty());
    }
}
