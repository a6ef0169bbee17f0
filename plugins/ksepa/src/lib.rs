use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use supportfund::{
    NoticeRow, NoticeSource, PluginError,
    core::{HttpClientOptions, date_string, today_kst},
};
use time::Date;

struct Selectors {
    row: Selector,
    title: Selector,
    cell: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            row: Selector::parse(".tbl_list tbody tr").expect("Failed to parse row selector"),
            title: Selector::parse(".subject a").expect("Failed to parse title selector"),
            cell: Selector::parse("td").expect("Failed to parse cell selector"),
        }
    }
}

// onclick="fn_view('1234')" 형태에서 처음 나오는 숫자열
static SEQ_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Failed to compile seq pattern"));

/// 한국사회적기업진흥원 공지사항 목록
pub struct KsepaPlugin {
    selectors: Selectors,
    http_client: reqwest::Client,
}

impl KsepaPlugin {
    pub const LIST_URL: &'static str =
        "https://www.socialenterprise.or.kr/news/notice/noticeList.do";
    pub const DETAIL_URL_BASE: &'static str =
        "https://www.socialenterprise.or.kr/news/notice/noticeDetail.do?seq=";

    // 번호, 제목, 첨부, 등록일 순
    const REG_DATE_CELL: usize = 3;

    pub fn new(options: &HttpClientOptions) -> Result<Self, PluginError> {
        if options.accept_invalid_certs {
            tracing::warn!(
                source = Self::IDENTIFIER,
                "TLS certificate validation is disabled"
            );
        }
        let http_client = options.build_client().map_err(|e| {
            PluginError::custom::<Self>("ClientBuild".to_string(), e.to_string())
        })?;
        Ok(Self {
            selectors: Selectors::new(),
            http_client,
        })
    }

    async fn fetch_listing(&self) -> Result<String, PluginError> {
        tracing::info!("Fetching notice list from URL: {}", Self::LIST_URL);
        self.http_client
            .get(Self::LIST_URL)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PluginError::request::<Self>(e.to_string()))?
            .text()
            .await
            .map_err(|e| PluginError::parse::<Self>(e.to_string()))
    }

    /// 목록 HTML에서 제목 링크가 있는 행만 추출합니다.
    /// 등록일 칸이 없으면 `today`를 등록일로 씁니다.
    pub fn parse_listing(&self, html: &str, today: Date) -> Vec<NoticeRow> {
        let document = Html::parse_document(html);
        let rows = document
            .select(&self.selectors.row)
            .collect::<Vec<ElementRef<'_>>>();

        if rows.is_empty() {
            tracing::warn!(source = Self::IDENTIFIER, "No rows found in notice table");
        }

        rows.into_iter()
            .filter_map(|row| self.parse_row(row, today))
            .collect()
    }

    fn parse_row(&self, row: ElementRef<'_>, today: Date) -> Option<NoticeRow> {
        let Some(anchor) = row.select(&self.selectors.title).next() else {
            tracing::debug!("Row without title anchor skipped");
            return None;
        };

        let title = stripped_text(anchor);

        let link = anchor
            .value()
            .attr("onclick")
            .and_then(extract_seq)
            .map(|seq| format!("{}{}", Self::DETAIL_URL_BASE, seq))
            .unwrap_or_else(|| {
                tracing::warn!(title = %title, "Post seq not found in onclick attribute");
                Self::LIST_URL.to_string()
            });

        let reg_date = row
            .select(&self.selectors.cell)
            .nth(Self::REG_DATE_CELL)
            .map(stripped_text)
            .unwrap_or_else(|| date_string(today));

        Some(NoticeRow {
            title,
            link,
            reg_date,
        })
    }
}

/// 텍스트 노드마다 앞뒤 공백을 지우고 빈 노드는 버린 뒤 이어 붙입니다.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect()
}

fn extract_seq(onclick: &str) -> Option<&str> {
    SEQ_PATTERN.find(onclick).map(|m| m.as_str())
}

impl NoticeSource for KsepaPlugin {
    const IDENTIFIER: &'static str = "socialenterprise.or.kr";
    const TITLE: &'static str = "한국사회적기업진흥원 공지사항";
    const AGENCY: &'static str = "한국사회적기업진흥원";

    async fn crawl(&self) -> Result<Vec<NoticeRow>, PluginError> {
        let html = self.fetch_listing().await?;
        Ok(self.parse_listing(&html, today_kst()))
    }
}
