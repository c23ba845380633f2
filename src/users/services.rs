use time::{macros::format_description, Duration, OffsetDateTime, Time, UtcOffset};

use crate::users::{
    dto::{ChartPoint, StatsResponse, UserListItem},
    repo::{SortOrder, StoreResult, UserStore},
    repo_types::{DailyCount, User},
};

pub const CSV_HEADER: &str = "id,username,email,created_at";

/// Days covered by `active_week` and by the registration chart.
pub const WEEK_DAYS: i64 = 7;

pub fn format_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
}

pub fn list_item(user: User) -> Result<UserListItem, time::error::Format> {
    Ok(UserListItem {
        created_at: format_timestamp(user.created_at)?,
        id: user.id,
        username: user.username,
        email: user.email,
    })
}

pub async fn list_users(
    store: &dyn UserStore,
    order: SortOrder,
) -> anyhow::Result<Vec<UserListItem>> {
    let rows = store.list(order).await?;
    let items = rows
        .into_iter()
        .map(list_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Header line plus one line per user, joined with `\n`. Fields are written as-is.
pub fn render_csv(items: &[UserListItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for u in items {
        lines.push(format!("{},{},{},{}", u.id, u.username, u.email, u.created_at));
    }
    lines.join("\n")
}

fn start_of_day(now: OffsetDateTime) -> OffsetDateTime {
    now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT)
}

/// Three independent counts; a write between them may skew the result.
pub async fn dashboard_stats(
    store: &dyn UserStore,
    now: OffsetDateTime,
) -> StoreResult<StatsResponse> {
    let today = start_of_day(now);
    let total_users = store.count_all().await?;
    let new_today = store
        .count_created_between(today, today + Duration::days(1))
        .await?;
    let active_week = store
        .count_created_since(now - Duration::days(WEEK_DAYS))
        .await?;
    Ok(StatsResponse {
        total_users,
        new_today,
        active_week,
    })
}

/// One point per UTC day for the last week including today, oldest first, zero-filled.
pub fn fill_days(now: OffsetDateTime, counts: &[DailyCount]) -> Vec<ChartPoint> {
    let today = start_of_day(now).date();
    (0..WEEK_DAYS)
        .rev()
        .map(|back| {
            let day = today - Duration::days(back);
            let count = counts
                .iter()
                .find(|c| c.day == day)
                .map(|c| c.count)
                .unwrap_or(0);
            ChartPoint {
                date: day.to_string(),
                count,
            }
        })
        .collect()
}

pub async fn registration_chart(
    store: &dyn UserStore,
    now: OffsetDateTime,
) -> StoreResult<Vec<ChartPoint>> {
    let since = start_of_day(now) - Duration::days(WEEK_DAYS - 1);
    let counts = store.daily_registrations(since).await?;
    Ok(fill_days(now, &counts))
}
