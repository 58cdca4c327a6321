//! Content calendar: posts laid out by day, and drag-and-drop rescheduling.
//!
//! All dates are UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use socialdesk_types::error::PostError;
use socialdesk_types::id::{BrandId, PostId};
use socialdesk_types::post::{Post, PostStatus};

use crate::repository::brand::BrandRepository;
use crate::repository::post::PostRepository;
use crate::service::Actor;
use crate::service::post::{storage, transition};

/// Time of day used when a post without a schedule is dropped on a date.
pub const DEFAULT_PUBLISH_TIME: (u32, u32) = (9, 0);

/// One calendar cell.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub posts: Vec<Post>,
}

/// The moment a post occupies on the calendar: when it went out, else when
/// it is planned to.
pub fn calendar_time(post: &Post) -> Option<DateTime<Utc>> {
    post.published_at.or(post.scheduled_at)
}

pub struct CalendarService<P: PostRepository, B: BrandRepository> {
    posts: P,
    brands: B,
}

impl<P: PostRepository, B: BrandRepository> CalendarService<P, B> {
    pub fn new(posts: P, brands: B) -> Self {
        Self { posts, brands }
    }

    /// Posts with a calendar time in `[from, to)`, in time order.
    pub async fn range(
        &self,
        brand_id: &BrandId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostError> {
        if to <= from {
            return Err(PostError::Validation("range end must be after its start".to_string()));
        }
        let mut posts = self
            .posts
            .list_in_range(brand_id, from, to)
            .await
            .map_err(storage)?;
        posts.retain(|p| calendar_time(p).is_some_and(|t| t >= from && t < to));
        posts.sort_by_key(calendar_time);
        Ok(posts)
    }

    /// Days of a month that carry at least one post.
    pub async fn month(
        &self,
        brand_id: &BrandId,
        year: i32,
        month: u32,
    ) -> Result<Vec<CalendarDay>, PostError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| PostError::Validation(format!("invalid month {year}-{month}")))?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| PostError::Validation(format!("invalid month {year}-{month}")))?;

        let from = first.and_time(NaiveTime::MIN).and_utc();
        let to = next.and_time(NaiveTime::MIN).and_utc();
        let posts = self.range(brand_id, from, to).await?;

        let mut days: Vec<CalendarDay> = Vec::new();
        for post in posts {
            let Some(date) = calendar_time(&post).map(|t| t.date_naive()) else {
                continue;
            };
            match days.last_mut() {
                Some(day) if day.date == date => day.posts.push(post),
                _ => days.push(CalendarDay {
                    date,
                    posts: vec![post],
                }),
            }
        }
        Ok(days)
    }

    /// Move a post to another day, keeping its time of day.
    ///
    /// Posts that may be scheduled (no approval needed, already approved,
    /// or moved by an approver) become Scheduled. Others keep their status
    /// and only get the new time.
    pub async fn reschedule(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
        date: NaiveDate,
    ) -> Result<Post, PostError> {
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot reschedule posts".to_string()));
        }
        let mut post = self
            .posts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|p| p.brand_id == *brand_id)
            .ok_or(PostError::NotFound)?;
        if post.status.is_locked() {
            return Err(PostError::Locked(post.status));
        }

        let (h, m) = DEFAULT_PUBLISH_TIME;
        let time = post
            .scheduled_at
            .map(|t| t.time())
            .or_else(|| NaiveTime::from_hms_opt(h, m, 0))
            .unwrap_or(NaiveTime::MIN);
        let at = date.and_time(time).and_utc();
        let now = Utc::now();
        if at <= now {
            return Err(PostError::ScheduledInPast);
        }

        let brand = self
            .brands
            .get_by_id(brand_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| PostError::Validation("unknown brand".to_string()))?;
        let may_schedule = match post.status {
            PostStatus::Scheduled | PostStatus::Approved | PostStatus::Failed => true,
            PostStatus::Draft => !brand.requires_approval || actor.role.can_approve(),
            _ => false,
        };
        if may_schedule {
            transition(&mut post, PostStatus::Scheduled)?;
        }

        let previous = post.scheduled_at;
        post.scheduled_at = Some(at);
        post.updated_at = now;
        let post = self.posts.update(&post).await.map_err(storage)?;
        tracing::info!(
            post_id = %post.id,
            from = ?previous,
            to = %at,
            weekday = %date.weekday(),
            status = %post.status,
            "rescheduled post"
        );
        Ok(post)
    }
}
