use crate::model::LibraryItem;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Preview,
    Delete,
}

/// Where one item stands, given how long media is kept and how long before
/// expiry it shows up as leaving soon.
///
/// `[expiration - leaving_soon, expiration)` is the preview window; an item
/// exactly `expiration` old is already due.
pub fn classify(
    item: &LibraryItem,
    expiration: Duration,
    leaving_soon: Duration,
    now: DateTime<Utc>,
) -> Verdict {
    let age = item.age(now);
    let preview_from = (expiration - leaving_soon).max(Duration::zero());

    if age >= expiration {
        Verdict::Delete
    } else if age >= preview_from {
        Verdict::Preview
    } else {
        Verdict::Keep
    }
}

#[derive(Debug, Default)]
pub struct Partition {
    pub keep: Vec<LibraryItem>,
    pub preview: Vec<LibraryItem>,
    pub delete: Vec<LibraryItem>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.keep.len() + self.preview.len() + self.delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn partition(
    items: Vec<LibraryItem>,
    expiration: Duration,
    leaving_soon: Duration,
    now: DateTime<Utc>,
) -> Partition {
    let mut result = Partition::default();
    for item in items {
        match classify(&item, expiration, leaving_soon, now) {
            Verdict::Keep => result.keep.push(item),
            Verdict::Preview => result.preview.push(item),
            Verdict::Delete => result.delete.push(item),
        }
    }
    result
}
