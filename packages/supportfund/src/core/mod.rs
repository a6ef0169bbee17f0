pub mod category;
pub mod freshness;
pub mod ingest;

use std::time::Duration;

use serde::Serialize;

use crate::error::PluginError;

pub use category::{Category, classify};
pub use freshness::{AnnouncementView, annotate, date_string, is_new, today_kst};
pub use ingest::{IngestReport, ingest, ingest_or_log, store_rows};

/// 저장소에 기록된 공고 한 건입니다. 생성 이후 수정되지 않습니다.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub category: Category,
    pub agency: String,
    /// `YYYY-MM-DD` 형식이 보통이지만 목록에 적힌 문자열을 그대로 보관합니다.
    pub reg_date: String,
    pub link: String,
}

/// 아직 저장되지 않은 공고입니다. `id`는 저장소가 부여합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnnouncement {
    pub title: String,
    pub category: Category,
    pub agency: String,
    pub reg_date: String,
    pub link: String,
}

/// 목록 페이지의 한 행에서 추출한 후보입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeRow {
    pub title: String,
    pub link: String,
    pub reg_date: String,
}

impl NoticeRow {
    pub fn into_announcement(self, agency: &str) -> NewAnnouncement {
        NewAnnouncement {
            category: classify(&self.title),
            title: self.title,
            agency: agency.to_string(),
            reg_date: self.reg_date,
            link: self.link,
        }
    }
}

pub trait NoticeSource {
    const IDENTIFIER: &'static str;
    const TITLE: &'static str;
    /// 이 출처에서 수집한 공고에 기록되는 기관명
    const AGENCY: &'static str;

    /// 목록 페이지 전체를 다시 읽어 후보 행을 목록 순서대로 반환합니다.
    fn crawl(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<NoticeRow>, PluginError>> + Send;
}

/// 목록 요청에 쓰이는 HTTP 클라이언트 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientOptions {
    pub user_agent: String,
    /// 인증서 검증을 끕니다. 대상 사이트의 인증서 체인이 불완전할 때만 켜세요.
    pub accept_invalid_certs: bool,
    pub timeout: Option<Duration>,
}

impl HttpClientOptions {
    pub const USER_AGENT: &'static str = "Mozilla/5.0";

    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        let builder = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.accept_invalid_certs);
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
        .build()
    }
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            user_agent: Self::USER_AGENT.to_string(),
            accept_invalid_certs: false,
            timeout: None,
        }
    }
}
