use serde::Serialize;
use time::{
    Date, OffsetDateTime,
    format_description::BorrowedFormatItem,
    macros::{format_description, offset},
};

use crate::core::Announcement;

/// 등록일로부터 이 일수 이내인 공고에 신규 배지를 붙입니다.
pub const FRESH_DAYS: i64 = 7;

/// 월과 일은 앞자리 0이 없어도 받아들입니다. (`2024-1-5`)
pub const DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

/// 응답을 만들 때마다 계산되는 읽기 전용 뷰입니다. `is_new`는 저장되지 않습니다.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementView<'a> {
    #[serde(flatten)]
    pub announcement: &'a Announcement,
    pub is_new: bool,
}

pub fn today_kst() -> Date {
    OffsetDateTime::now_utc().to_offset(offset!(+9)).date()
}

/// `YYYY-MM-DD` 형식의 문자열
pub fn date_string(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// 해석할 수 없는 등록일은 신규가 아닌 것으로 봅니다.
/// 미래 날짜는 경과 일수가 음수이므로 신규로 표시됩니다.
pub fn is_new(reg_date: &str, today: Date) -> bool {
    Date::parse(reg_date, DATE_FORMAT)
        .map(|date| (today - date).whole_days() <= FRESH_DAYS)
        .unwrap_or(false)
}

pub fn annotate(announcements: &[Announcement], today: Date) -> Vec<AnnouncementView<'_>> {
    announcements
        .iter()
        .map(|announcement| AnnouncementView {
            announcement,
            is_new: is_new(&announcement.reg_date, today),
        })
        .collect()
}
