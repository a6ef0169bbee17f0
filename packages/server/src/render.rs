use serde::Serialize;
use supportfund::{
    Announcement,
    core::{AnnouncementView, annotate},
};
use time::Date;
use tinytemplate::TinyTemplate;

static INDEX_TEMPLATE: &str = include_str!("index.html");

#[derive(Serialize)]
struct IndexContext<'a> {
    programs: Vec<AnnouncementView<'a>>,
    keyword: Option<&'a str>,
    total: usize,
}

/// 공고 목록 페이지를 렌더링합니다. 신규 배지는 `today` 기준으로 계산됩니다.
pub fn render_index(
    announcements: &[Announcement],
    keyword: Option<&str>,
    today: Date,
) -> Result<String, tinytemplate::error::Error> {
    let mut tt = TinyTemplate::new();
    tt.add_template("index", INDEX_TEMPLATE)?;
    let context = IndexContext {
        programs: annotate(announcements, today),
        keyword,
        total: announcements.len(),
    };
    tt.render("index", &context)
}
